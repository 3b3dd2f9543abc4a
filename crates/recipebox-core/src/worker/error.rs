use thiserror::Error;

use super::lifecycle::WorkerState;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("network error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid request url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("network unreachable")]
    Unreachable,
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt cache entry: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("failed to precache {url}: {source}")]
    InstallFetch {
        url: String,
        #[source]
        source: NetworkError,
    },

    #[error("failed to precache {url}: status {status}")]
    InstallStatus { url: String, status: u16 },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("cannot {action} while worker is {state:?}")]
    InvalidState {
        action: &'static str,
        state: WorkerState,
    },
}
