use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::alarm::Alarm;
use crate::cli::Invocation;
use crate::config::Config;
use crate::error::ValidationError;
use crate::filter::FilterMode;
use crate::render::Renderer;
use crate::session;
use crate::store::TaskStore;
use crate::task::Task;
use crate::timer::{DEFAULT_BREAK_MINUTES, DEFAULT_POMODORO_MINUTES, TimerState};

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "add",
        "list",
        "done",
        "delete",
        "edit",
        "info",
        "pomodoro",
        "_commands",
        "_show",
        "help",
        "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(store, cfg, renderer, inv))]
pub fn dispatch(
    store: &mut TaskStore,
    cfg: &Config,
    renderer: &mut Renderer,
    inv: Invocation,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let command = inv.command.as_str();

    debug!(command, args = ?inv.command_args, "dispatching command");

    match command {
        "add" => cmd_add(store, &inv.command_args, now),
        "list" => cmd_list(store, renderer, &inv.command_args),
        "done" => cmd_toggle(store, &inv.command_args, now),
        "delete" => cmd_delete(store, &inv.command_args),
        "edit" => cmd_edit(store, &inv.command_args, now),
        "info" => cmd_info(store, renderer, &inv.command_args),
        "pomodoro" => cmd_pomodoro(store, cfg, renderer, &inv.command_args),
        "_commands" => cmd_commands(),
        "_show" => cmd_show(cfg),
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

#[instrument(skip(store, args, now))]
fn cmd_add(store: &mut TaskStore, args: &[String], now: DateTime<Utc>) -> anyhow::Result<()> {
    info!("command add");

    let (free_terms, mods) = parse_mods(args)?;
    let title = if free_terms.is_empty() {
        mods.title.clone().filter(|t| !t.is_empty())
    } else {
        Some(free_terms.join(" "))
    };
    let Some(title) = title else {
        return Err(anyhow!("add requires a task title"));
    };

    let mut tasks = store.load();
    let id = store.next_id(&tasks);
    let mut task = Task::new(title, now, id);
    mods.apply(&mut task);

    tasks.push(task);
    store.save_all(&tasks).context("failed to save new task")?;

    debug!(count = tasks.len(), "task added");
    println!("Created task {id}.");
    Ok(())
}

#[instrument(skip(store, renderer, args))]
fn cmd_list(store: &mut TaskStore, renderer: &mut Renderer, args: &[String]) -> anyhow::Result<()> {
    info!("command list");

    let mode = match args.first() {
        Some(raw) => raw.parse::<FilterMode>()?,
        None => FilterMode::All,
    };

    let tasks = store.load();
    let filtered = mode.apply(&tasks);
    renderer.print_task_table(&filtered)
}

#[instrument(skip(store, args, now))]
fn cmd_toggle(store: &mut TaskStore, args: &[String], now: DateTime<Utc>) -> anyhow::Result<()> {
    info!("command done");

    let id = parse_id(args)?;
    let mut tasks = store.load();

    let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
        println!("No task with id {id}.");
        return Ok(());
    };

    task.done = !task.done;
    task.modified = now;
    let done = task.done;

    store.save_all(&tasks).context("failed to save toggle")?;
    println!(
        "Task {id} marked {}.",
        if done { "done" } else { "not done" }
    );
    Ok(())
}

#[instrument(skip(store, args))]
fn cmd_delete(store: &mut TaskStore, args: &[String]) -> anyhow::Result<()> {
    info!("command delete");

    let id = parse_id(args)?;
    let mut tasks = store.load();
    let before = tasks.len();
    tasks.retain(|t| t.id != id);

    if tasks.len() == before {
        println!("No task with id {id}.");
        return Ok(());
    }

    store.save_all(&tasks).context("failed to save delete")?;
    println!("Deleted task {id}.");
    Ok(())
}

#[instrument(skip(store, args, now))]
fn cmd_edit(store: &mut TaskStore, args: &[String], now: DateTime<Utc>) -> anyhow::Result<()> {
    info!("command edit");

    let id = parse_id(args)?;
    let (free_terms, mut mods) = parse_mods(&args[1..])?;
    if !free_terms.is_empty() {
        mods.title.get_or_insert_with(|| free_terms.join(" "));
    }
    if mods.is_empty() {
        return Err(anyhow!(
            "edit requires a new title or at least one field:value modifier"
        ));
    }

    let mut tasks = store.load();
    let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
        println!("No task with id {id}.");
        return Ok(());
    };

    mods.apply(task);
    task.modified = now;

    store.save_all(&tasks).context("failed to save edit")?;
    println!("Modified task {id}.");
    Ok(())
}

#[instrument(skip(store, renderer, args))]
fn cmd_info(store: &mut TaskStore, renderer: &mut Renderer, args: &[String]) -> anyhow::Result<()> {
    let id = parse_id(args)?;
    let tasks = store.load();

    match tasks.iter().find(|t| t.id == id) {
        Some(task) => renderer.print_task_info(task),
        None => {
            println!("No task with id {id}.");
            Ok(())
        }
    }
}

#[instrument(skip(store, cfg, renderer, args))]
fn cmd_pomodoro(
    store: &mut TaskStore,
    cfg: &Config,
    renderer: &mut Renderer,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command pomodoro");

    let mut focus = cfg
        .get_minutes("pomodoro.minutes")
        .unwrap_or(DEFAULT_POMODORO_MINUTES);
    let mut brk = cfg
        .get_minutes("break.minutes")
        .unwrap_or(DEFAULT_BREAK_MINUTES);

    for arg in args {
        match arg.split_once(':') {
            Some(("focus", value)) => focus = parse_minutes(value)?,
            Some(("break", value)) => brk = parse_minutes(value)?,
            _ => return Err(anyhow!("unknown pomodoro argument: {arg}")),
        }
    }

    let state = TimerState::new(focus, brk)?;
    let alarm = Alarm::load(cfg.get_bool("sound").unwrap_or(true));
    session::run(store, renderer, state, alarm)
}

fn cmd_commands() -> anyhow::Result<()> {
    for name in known_command_names() {
        println!("{name}");
    }
    Ok(())
}

fn cmd_show(cfg: &Config) -> anyhow::Result<()> {
    let mut entries: Vec<(&String, &String)> = cfg.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in entries {
        println!("{key} = {value}");
    }
    Ok(())
}

fn cmd_help() -> anyhow::Result<()> {
    println!("usage: tarefa [options] <command> [args]");
    println!();
    println!("  add <title> [desc:.. category:.. pomodoros:N]   create a task");
    println!("  list [all|done|todo]                            show tasks");
    println!("  done <id>                                       toggle a task");
    println!("  delete <id>                                     remove a task");
    println!("  edit <id> [title] [field:value..]               change a task");
    println!("  info <id>                                       task details");
    println!("  pomodoro [focus:N] [break:N]                    run the focus timer");
    println!("  version                                         print the version");
    Ok(())
}

fn parse_id(args: &[String]) -> anyhow::Result<u64> {
    let raw = args.first().ok_or_else(|| anyhow!("a task id is required"))?;
    raw.parse::<u64>()
        .with_context(|| format!("invalid task id: {raw}"))
}

fn parse_minutes(value: &str) -> Result<u32, ValidationError> {
    match value.trim().parse::<u32>() {
        Ok(minutes) if minutes >= 1 => Ok(minutes),
        _ => Err(ValidationError::NonPositiveDuration(value.to_string())),
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Mods {
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    pomodoros: Option<u32>,
    done: Option<bool>,
}

impl Mods {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.pomodoros.is_none()
            && self.done.is_none()
    }

    fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title
            && !title.is_empty()
        {
            task.title = title.clone();
        }
        if let Some(desc) = &self.description {
            task.description = (!desc.is_empty()).then(|| desc.clone());
        }
        if let Some(category) = &self.category {
            task.category = (!category.is_empty()).then(|| category.clone());
        }
        if let Some(pomodoros) = self.pomodoros {
            task.pomodoros = pomodoros;
        }
        if let Some(done) = self.done {
            task.done = done;
        }
    }
}

// Splits `key:value` modifiers out of the argument list; everything else is a
// free term for the caller to use as the title.
fn parse_mods(args: &[String]) -> Result<(Vec<String>, Mods), ValidationError> {
    let mut free_terms = Vec::new();
    let mut mods = Mods::default();

    for arg in args {
        if let Some((key, value)) = arg.split_once(':') {
            match key {
                "title" => {
                    mods.title = Some(value.to_string());
                    continue;
                }
                "desc" | "description" => {
                    mods.description = Some(value.to_string());
                    continue;
                }
                "category" => {
                    mods.category = Some(value.to_string());
                    continue;
                }
                "pomodoros" => {
                    mods.pomodoros = Some(parse_pomodoros(value)?);
                    continue;
                }
                "done" => {
                    mods.done = Some(parse_done(value)?);
                    continue;
                }
                _ => {}
            }
        }
        free_terms.push(arg.clone());
    }

    Ok((free_terms, mods))
}

fn parse_pomodoros(value: &str) -> Result<u32, ValidationError> {
    match value.trim().parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(ValidationError::InvalidField {
            field: "pomodoros",
            value: value.to_string(),
        }),
    }
}

fn parse_done(value: &str) -> Result<bool, ValidationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(ValidationError::InvalidField {
            field: "done",
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn mods_split_from_free_terms() {
        let args = strings(&["lavar", "a", "louça", "category:casa", "pomodoros:2"]);
        let (free, mods) = parse_mods(&args).expect("parse");
        assert_eq!(free, strings(&["lavar", "a", "louça"]));
        assert_eq!(mods.category.as_deref(), Some("casa"));
        assert_eq!(mods.pomodoros, Some(2));
        assert_eq!(mods.done, None);
    }

    #[test]
    fn non_positive_pomodoros_modifier_is_rejected() {
        assert!(parse_mods(&strings(&["pomodoros:0"])).is_err());
        assert!(parse_mods(&strings(&["pomodoros:muitos"])).is_err());
        assert!(parse_mods(&strings(&["pomodoros:3"])).is_ok());
    }

    #[test]
    fn unknown_keys_stay_in_the_title() {
        let args = strings(&["ligar", "10:30"]);
        let (free, mods) = parse_mods(&args).expect("parse");
        assert_eq!(free, strings(&["ligar", "10:30"]));
        assert!(mods.is_empty());
    }

    #[test]
    fn empty_modifier_value_clears_the_field() {
        let now = chrono::Utc::now();
        let mut task = Task::new("t".to_string(), now, 1);
        task.description = Some("velho".to_string());

        let (_, mods) = parse_mods(&strings(&["desc:"])).expect("parse");
        mods.apply(&mut task);
        assert!(task.description.is_none());
    }

    #[test]
    fn command_abbreviations_expand_when_unique() {
        let known = known_command_names();
        assert_eq!(expand_command_abbrev("del", &known), Some("delete"));
        assert_eq!(expand_command_abbrev("do", &known), Some("done"));
        assert_eq!(expand_command_abbrev("p", &known), Some("pomodoro"));
        assert_eq!(expand_command_abbrev("d", &known), None);
        assert_eq!(expand_command_abbrev("xyz", &known), None);
    }
}
