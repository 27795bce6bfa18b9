#![allow(dead_code)]

pub mod fake_transport;

use std::path::PathBuf;

use log::LevelFilter;
use sshman_core::{Identity, IdentityStore};
use tempfile::TempDir;

/// Logs will appear only when you run with `-- --nocapture`
/// or when the test fails.
pub fn init_test_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// A fresh directory plus the path an identity file would live at inside it.
/// Keep the `TempDir` alive for as long as the path is used.
pub fn temp_config() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("creating temp dir");
    let path = dir.path().join(".ssh-manager.json");
    (dir, path)
}

pub fn open_temp_store() -> (TempDir, IdentityStore) {
    let (dir, path) = temp_config();
    let store = IdentityStore::open(path).expect("opening a fresh store");
    (dir, store)
}

pub fn identity(name: &str) -> Identity {
    Identity::new(name, "root", "192.0.2.10", 0, format!("{name} box"))
}
