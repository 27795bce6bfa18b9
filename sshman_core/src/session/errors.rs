use std::fmt::Display;

use thiserror::Error;

use crate::storage::StoreError;

/// A central error enum for session-related errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Host key verification failed for {host}: {reason}")]
    HostKey { host: String, reason: String },
    #[error("ssh client exited with status {0}")]
    ExitStatus(i32),
    #[error("the {0} transport needs a password but none was supplied")]
    MissingSecret(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// Wraps a lower-level failure with the step that produced it,
    /// e.g. `SessionError::connection("Handshake error", e)`.
    pub(crate) fn connection(step: &str, err: impl Display) -> Self {
        SessionError::Connection(format!("{step}: {err}"))
    }
}
