//! Advisory locking around the identity file.
//!
//! Two `ssh-manager` processes may run against the same file. Every
//! read takes a shared lock and every read-modify-write an exclusive one on a
//! sidecar `<file>.lock`, using `flock(2)`. On non-unix targets the lock file
//! is still opened but no lock is taken.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use super::errors::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LockMode {
    Shared,
    Exclusive,
}

/// A held lock that releases on drop.
pub(crate) struct StoreLock {
    _file: File,
}

impl StoreLock {
    /// Blocks until the lock for `data_path` is acquired in `mode`.
    pub(crate) fn acquire(data_path: &Path, mode: LockMode) -> Result<Self, StoreError> {
        let lock_path = lock_path_for(data_path);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| StoreError::io(&lock_path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;

            let operation = match mode {
                LockMode::Shared => libc::LOCK_SH,
                LockMode::Exclusive => libc::LOCK_EX,
            };
            loop {
                // SAFETY: flock is safe to call with a valid file descriptor
                let result = unsafe { libc::flock(file.as_raw_fd(), operation) };
                if result == 0 {
                    break;
                }
                let err = std::io::Error::last_os_error();
                if err.kind() != std::io::ErrorKind::Interrupted {
                    return Err(StoreError::io(&lock_path, err));
                }
            }
        }
        #[cfg(not(unix))]
        let _ = mode;

        log::trace!("Acquired {:?} lock on {:?}", mode, lock_path);
        Ok(Self { _file: file })
    }
}

pub(crate) fn lock_path_for(data_path: &Path) -> PathBuf {
    let mut name = data_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    data_path.with_file_name(name)
}
