//! Runner error type.

use std::io;
use std::path::PathBuf;

use regbus_engine::{BusError, TransactionError};
use thiserror::Error;

/// Errors that end a runner command.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to read config {path}: {source}")]
    ConfigIo { path: PathBuf, source: io::Error },

    #[error("invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to install Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;
