use std::path::PathBuf;

use mockhard_core::ContractError;
use thiserror::Error;

/// Failures of the suite gate and the log tooling.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("flush event log: {0}")]
    Flush(#[source] std::io::Error),

    #[error("write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid event log: {count} violation(s), first: {first}")]
    InvalidLog { count: usize, first: String },

    #[error(transparent)]
    Contract(#[from] ContractError),
}
