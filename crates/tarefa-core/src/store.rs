use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::task::Task;

// The whole collection lives under a single key; every reader and writer
// goes through tarefas.json.
const TASKS_FILE: &str = "tarefas.json";

#[derive(Debug)]
pub struct TaskStore {
    pub data_dir: PathBuf,
    pub tasks_path: PathBuf,
}

impl TaskStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> Result<Self, StorageError> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir).map_err(|source| StorageError::Io {
            path: data_dir.clone(),
            source,
        })?;

        let tasks_path = data_dir.join(TASKS_FILE);

        info!(
            data_dir = %data_dir.display(),
            tasks = %tasks_path.display(),
            "opened task store"
        );

        Ok(Self {
            data_dir,
            tasks_path,
        })
    }

    /// Returns the persisted collection in insertion order. A missing file is
    /// an empty collection; an unreadable or unparsable file is recovered as
    /// empty with a warning.
    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> Vec<Task> {
        match self.try_load() {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!(error = %err, "failed to load task collection, treating as empty");
                Vec::new()
            }
        }
    }

    pub fn try_load(&self) -> Result<Vec<Task>, StorageError> {
        if !self.tasks_path.exists() {
            debug!(file = %self.tasks_path.display(), "no task file yet");
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&self.tasks_path).map_err(|source| StorageError::Io {
            path: self.tasks_path.clone(),
            source,
        })?;

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let tasks: Vec<Task> =
            serde_json::from_str(&raw).map_err(|source| StorageError::Parse {
                path: self.tasks_path.clone(),
                source,
            })?;

        debug!(count = tasks.len(), "loaded task collection");
        Ok(tasks)
    }

    /// Replaces the entire persisted collection. The write goes through a
    /// temp file in the same directory so readers never observe a partial
    /// collection.
    #[tracing::instrument(skip(self, tasks))]
    pub fn save_all(&self, tasks: &[Task]) -> Result<(), StorageError> {
        debug!(
            file = %self.tasks_path.display(),
            count = tasks.len(),
            "saving task collection"
        );

        let dir = self
            .tasks_path
            .parent()
            .unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir).map_err(|source| StorageError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let serialized = serde_json::to_string_pretty(tasks).map_err(StorageError::Serialize)?;
        temp.write_all(serialized.as_bytes())
            .and_then(|()| temp.flush())
            .map_err(|source| StorageError::Io {
                path: self.tasks_path.clone(),
                source,
            })?;

        temp.persist(&self.tasks_path)
            .map_err(|err| StorageError::Persist {
                path: self.tasks_path.clone(),
                source: err.error,
            })?;

        Ok(())
    }

    /// Loads the current collection, adds one task and persists. Used by the
    /// timer to record a finished focus session without touching whatever
    /// list a command happens to be displaying.
    #[tracing::instrument(skip(self, task), fields(id = task.id))]
    pub fn append_task(&self, task: Task) -> Result<(), StorageError> {
        let mut tasks = self.load();
        tasks.push(task);
        self.save_all(&tasks)
    }

    pub fn next_id(&self, tasks: &[Task]) -> u64 {
        tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }
}
