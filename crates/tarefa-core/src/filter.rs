use std::str::FromStr;

use crate::error::ValidationError;
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    All,
    Done,
    Todo,
}

impl FromStr for FilterMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "done" => Ok(Self::Done),
            "todo" => Ok(Self::Todo),
            other => Err(ValidationError::UnknownFilterMode(other.to_string())),
        }
    }
}

impl FilterMode {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Done => task.done,
            Self::Todo => !task.done,
        }
    }

    pub fn apply<'a>(self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|task| self.matches(task)).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn sample() -> Vec<Task> {
        let now = Utc::now();
        let mut tasks = vec![
            Task::new("estudar".to_string(), now, 1),
            Task::new("compras".to_string(), now, 2),
            Task::new("treinar".to_string(), now, 3),
        ];
        tasks[1].done = true;
        tasks
    }

    #[test]
    fn all_is_identity_in_order() {
        let tasks = sample();
        let filtered = FilterMode::All.apply(&tasks);
        let ids: Vec<u64> = filtered.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn done_and_todo_partition() {
        let tasks = sample();
        let done: Vec<u64> = FilterMode::Done.apply(&tasks).iter().map(|t| t.id).collect();
        let todo: Vec<u64> = FilterMode::Todo.apply(&tasks).iter().map(|t| t.id).collect();
        assert_eq!(done, vec![2]);
        assert_eq!(todo, vec![1, 3]);
    }

    #[test]
    fn unknown_mode_is_an_error() {
        assert!("pending".parse::<FilterMode>().is_err());
        assert!("".parse::<FilterMode>().is_err());
        assert_eq!("DONE".parse::<FilterMode>().expect("mode"), FilterMode::Done);
    }
}
