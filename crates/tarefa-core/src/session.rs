use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::{DateTime, Utc};
use crossterm::cursor::MoveToColumn;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{self, Clear, ClearType};
use tracing::{debug, info, warn};

use crate::alarm::Alarm;
use crate::error::StorageError;
use crate::render::Renderer;
use crate::store::TaskStore;
use crate::task::Task;
use crate::timer::{Tick, TimerState, format_time};

const IDLE_POLL: Duration = Duration::from_millis(250);
const TICK: Duration = Duration::from_secs(1);

/// Runs the interactive countdown screen. The loop owns the tick schedule:
/// a pending tick cannot outlive a pause or the screen itself, and the alarm
/// handle is dropped on every exit path.
pub fn run(
    store: &TaskStore,
    renderer: &Renderer,
    mut state: TimerState,
    mut alarm: Alarm,
) -> anyhow::Result<()> {
    let completed = {
        let _raw = RawMode::enter()
            .context("the pomodoro screen requires an interactive terminal")?;
        event_loop(store, renderer, &mut state, &mut alarm)?
    };

    println!();
    println!("Completed {completed} focus session(s).");
    Ok(())
}

fn event_loop(
    store: &TaskStore,
    renderer: &Renderer,
    state: &mut TimerState,
    alarm: &mut Alarm,
) -> anyhow::Result<u32> {
    let mut out = io::stdout();
    let mut completed: u32 = 0;
    let mut next_tick = Instant::now() + TICK;

    loop {
        draw_status(&mut out, renderer, state, completed)?;

        let timeout = if state.is_running() {
            next_tick.saturating_duration_since(Instant::now())
        } else {
            IDLE_POLL
        };

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    let was_running = state.is_running();
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            break;
                        }
                        KeyCode::Char(' ') => state.toggle(),
                        KeyCode::Char('r') => state.reset(),
                        KeyCode::Char('+') | KeyCode::Char('=') => {
                            adjust_pomodoro(state, 1);
                        }
                        KeyCode::Char('-') => {
                            adjust_pomodoro(state, -1);
                        }
                        KeyCode::Char(']') => {
                            adjust_break(state, 1);
                        }
                        KeyCode::Char('[') => {
                            adjust_break(state, -1);
                        }
                        _ => {}
                    }
                    if !was_running && state.is_running() {
                        next_tick = Instant::now() + TICK;
                    }
                }
                _ => {}
            }
        }

        while state.is_running() && Instant::now() >= next_tick {
            match state.tick() {
                Tick::PhaseEnded { completed_focus } => {
                    if let Err(err) = alarm.ring() {
                        warn!(error = %err, "alarm cue failed");
                    }
                    if completed_focus {
                        completed += 1;
                        match record_completed_focus(store, Utc::now()) {
                            Ok(id) => info!(id, "recorded completed pomodoro as task"),
                            Err(err) => {
                                warn!(error = %err, "failed to record completed pomodoro")
                            }
                        }
                    }
                }
                Tick::Counted => {}
                Tick::Idle => debug!("tick while idle"),
            }
            next_tick += TICK;
        }
    }

    Ok(completed)
}

/// Appends the synthetic "finished focus session" task, id assigned from the
/// collection as it exists right now.
pub fn record_completed_focus(
    store: &TaskStore,
    now: DateTime<Utc>,
) -> Result<u64, StorageError> {
    let tasks = store.load();
    let id = store.next_id(&tasks);
    store.append_task(Task::completed_focus(now, id))?;
    Ok(id)
}

fn adjust_pomodoro(state: &mut TimerState, delta: i64) {
    let next = i64::from(state.pomodoro_minutes()) + delta;
    if next >= 1
        && let Ok(minutes) = u32::try_from(next)
    {
        let _ = state.set_pomodoro_minutes(minutes);
    }
}

fn adjust_break(state: &mut TimerState, delta: i64) {
    let next = i64::from(state.break_minutes()) + delta;
    if next >= 1
        && let Ok(minutes) = u32::try_from(next)
    {
        let _ = state.set_break_minutes(minutes);
    }
}

fn draw_status(
    out: &mut io::Stdout,
    renderer: &Renderer,
    state: &TimerState,
    completed: u32,
) -> anyhow::Result<()> {
    execute!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;

    let phase = if state.is_break() {
        renderer.paint(state.phase_label(), "36")
    } else {
        renderer.paint(state.phase_label(), "31")
    };
    let clock = renderer.paint(&format_time(state.seconds_remaining()), "1");
    let status = if state.is_running() { "running" } else { "paused" };

    write!(
        out,
        "{phase} {clock}  [{status}]  {}m/{}m  concluded: {completed}  \
         space start/pause · r reset · +/- focus · ]/[ break · q quit",
        state.pomodoro_minutes(),
        state.break_minutes(),
    )?;
    out.flush()?;
    Ok(())
}

struct RawMode;

impl RawMode {
    fn enter() -> anyhow::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(err) = terminal::disable_raw_mode() {
            warn!(error = %err, "failed to restore terminal mode");
        }
    }
}
