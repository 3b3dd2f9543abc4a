use std::path::PathBuf;

use thiserror::Error;

/// Failures of the raw key/value backend.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures surfaced by the record store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("payload is not valid record JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("payload doesn't look like an array of records")]
    NotAnArray,

    #[error("record not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to access {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
