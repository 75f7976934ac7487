use std::path::PathBuf;
use thiserror::Error;

/// Persistence failures of the task store
///
/// Every variant aborts the single call that hit it; nothing is retried.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read task store {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Task store {} is corrupted: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write task store {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to lock task store {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode task store: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Task id sequence exhausted")]
    IdsExhausted,

    #[error("Task store operation did not finish: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, StoreError>;
