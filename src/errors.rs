// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WakedError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// One of the lock-state helper commands failed or produced output we
    /// could not use.
    #[error("Helper `{program}` failed: {detail}")]
    HelperFailed { program: String, detail: String },

    /// The owning generation was cancelled while the operation was in flight.
    #[error("Cancelled")]
    Cancelled,

    #[error("Received termination signal: {0}")]
    Shutdown(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WakedError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WakedError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, WakedError>;
