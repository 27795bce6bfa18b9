use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors produced by [`IdentityStore`](super::store::IdentityStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("identity file {} is corrupt: {reason}", .path.display())]
    ConfigCorrupt { path: PathBuf, reason: String },
    #[error("an identity named '{name}' already exists")]
    DuplicateName { name: String },
    #[error("no identity found matching name '{name}'")]
    NotFound { name: String },
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn corrupt(path: &Path, reason: impl Into<String>) -> Self {
        StoreError::ConfigCorrupt {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}
