use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize task collection: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to spawn audio player {player}: {source}")]
    Spawn {
        player: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to ring terminal bell: {0}")]
    Bell(#[source] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("duration must be a positive number of minutes, got {0}")]
    NonPositiveDuration(String),

    #[error("unrecognized filter mode '{0}' (expected all, done or todo)")]
    UnknownFilterMode(String),

    #[error("invalid value for {field}: '{value}'")]
    InvalidField { field: &'static str, value: String },
}
