use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

pub const FOCUS_TASK_TITLE: &str = "Pomodoro concluído";
pub const FOCUS_TASK_DESCRIPTION: &str = "Sessão de foco finalizada";
pub const FOCUS_TASK_CATEGORY: &str = "foco";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub uuid: Uuid,

    pub id: u64,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default)]
    pub done: bool,

    #[serde(default = "default_pomodoros", deserialize_with = "lenient_pomodoros")]
    pub pomodoros: u32,

    pub entry: DateTime<Utc>,

    pub modified: DateTime<Utc>,
}

impl Task {
    pub fn new(title: String, now: DateTime<Utc>, id: u64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            id,
            title,
            description: None,
            category: None,
            done: false,
            pomodoros: 1,
            entry: now,
            modified: now,
        }
    }

    pub fn completed_focus(now: DateTime<Utc>, id: u64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            id,
            title: FOCUS_TASK_TITLE.to_string(),
            description: Some(FOCUS_TASK_DESCRIPTION.to_string()),
            category: Some(FOCUS_TASK_CATEGORY.to_string()),
            done: true,
            pomodoros: 1,
            entry: now,
            modified: now,
        }
    }
}

fn default_pomodoros() -> u32 {
    1
}

// Stored collections predate the positive-integer rule, so anything that is
// not a positive number comes back as 1.
fn lenient_pomodoros<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_pomodoros(&raw))
}

pub fn coerce_pomodoros(raw: &serde_json::Value) -> u32 {
    if let Some(n) = raw.as_u64() {
        if n >= 1 {
            return u32::try_from(n).unwrap_or(u32::MAX);
        }
        return 1;
    }

    if let Some(f) = raw.as_f64() {
        if f >= 1.0 {
            return f.min(f64::from(u32::MAX)) as u32;
        }
        return 1;
    }

    1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Task {
        serde_json::from_str(json).expect("task json")
    }

    #[test]
    fn pomodoros_normalized_on_load() {
        let base = |pomodoros: &str| {
            format!(
                r#"{{"uuid":"550e8400-e29b-41d4-a716-446655440000","id":1,
                    "title":"t","pomodoros":{pomodoros},
                    "entry":"2024-01-01T00:00:00Z","modified":"2024-01-01T00:00:00Z"}}"#
            )
        };

        assert_eq!(parse(&base("3")).pomodoros, 3);
        assert_eq!(parse(&base("0")).pomodoros, 1);
        assert_eq!(parse(&base("-4")).pomodoros, 1);
        assert_eq!(parse(&base("2.7")).pomodoros, 2);
        assert_eq!(parse(&base("0.2")).pomodoros, 1);
        assert_eq!(parse(&base("\"five\"")).pomodoros, 1);
        assert_eq!(parse(&base("null")).pomodoros, 1);
    }

    #[test]
    fn pomodoros_defaults_when_missing() {
        let task = parse(
            r#"{"uuid":"550e8400-e29b-41d4-a716-446655440000","id":1,
                "title":"t","entry":"2024-01-01T00:00:00Z","modified":"2024-01-01T00:00:00Z"}"#,
        );
        assert_eq!(task.pomodoros, 1);
        assert!(!task.done);
        assert!(task.description.is_none());
    }

    #[test]
    fn normalization_is_idempotent() {
        let now = Utc::now();
        let task = Task::new("ler um livro".to_string(), now, 7);
        let json = serde_json::to_string(&task).expect("serialize");
        let back = parse(&json);
        assert_eq!(back.pomodoros, task.pomodoros);
        assert_eq!(back.id, task.id);
        assert_eq!(back.uuid, task.uuid);
    }

    #[test]
    fn completed_focus_uses_fixed_fields() {
        let task = Task::completed_focus(Utc::now(), 12);
        assert_eq!(task.title, FOCUS_TASK_TITLE);
        assert_eq!(task.description.as_deref(), Some(FOCUS_TASK_DESCRIPTION));
        assert_eq!(task.category.as_deref(), Some(FOCUS_TASK_CATEGORY));
        assert!(task.done);
    }
}
