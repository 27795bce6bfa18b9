use std::ffi::OsStr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ValueEnum;
use directories::BaseDirs;
use sshman_core::{HostKeyPolicy, ProcessTransport, Transport};

/// Identity file name inside the home directory.
pub const CONFIG_FILE_NAME: &str = ".ssh-manager.json";

/// Which transport strategy `connect` uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// Run the system ssh client
    System,
    /// Speak SSH in-process (password authentication)
    Native,
}

/// Host key checking for the native transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HostKeyMode {
    /// Accept any host key (insecure)
    AcceptAny,
    /// Require a matching known_hosts entry
    KnownHosts,
    /// Record unknown hosts, reject changed keys
    TrustFirstUse,
}

fn home_dir() -> Result<PathBuf> {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .context("Unable to locate home directory")
}

/// `explicit` if given, otherwise `~/.ssh-manager.json`.
pub fn config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => Ok(home_dir()?.join(CONFIG_FILE_NAME)),
    }
}

pub fn host_key_policy(mode: HostKeyMode, known_hosts: Option<PathBuf>) -> Result<HostKeyPolicy> {
    let known_hosts_path = || -> Result<PathBuf> {
        match known_hosts {
            Some(path) => Ok(path),
            None => Ok(home_dir()?.join(".ssh").join("known_hosts")),
        }
    };
    Ok(match mode {
        HostKeyMode::AcceptAny => HostKeyPolicy::AcceptAny,
        HostKeyMode::KnownHosts => HostKeyPolicy::KnownHosts(known_hosts_path()?),
        HostKeyMode::TrustFirstUse => HostKeyPolicy::TrustFirstUse(known_hosts_path()?),
    })
}

pub fn build_transport(
    kind: TransportKind,
    ssh_program: &OsStr,
    host_keys: HostKeyPolicy,
) -> Result<Box<dyn Transport>> {
    match kind {
        TransportKind::System => Ok(Box::new(ProcessTransport::new(ssh_program))),
        #[cfg(feature = "ssh")]
        TransportKind::Native => Ok(Box::new(sshman_core::NativeTransport::new(host_keys))),
        #[cfg(not(feature = "ssh"))]
        TransportKind::Native => {
            let _ = host_keys;
            anyhow::bail!("this build has no native transport; rebuild with the `ssh` feature")
        }
    }
}
