use std::path::PathBuf;

/// How the in-process transport treats the key a server presents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HostKeyPolicy {
    /// Accept any key without checking. Insecure, kept as the default.
    #[default]
    AcceptAny,
    /// Only connect when the key matches an entry in the given known-hosts file.
    KnownHosts(PathBuf),
    /// Record keys of hosts not yet in the file, reject mismatches.
    TrustFirstUse(PathBuf),
}

/// Name of a host in an OpenSSH known-hosts file.
#[cfg_attr(not(feature = "ssh"), allow(dead_code))]
pub(crate) fn known_hosts_entry(host: &str, port: u16) -> String {
    if port == crate::storage::DEFAULT_SSH_PORT {
        host.to_string()
    } else {
        format!("[{host}]:{port}")
    }
}

#[cfg(feature = "ssh")]
pub(crate) use verify::verify_host_key;

#[cfg(feature = "ssh")]
mod verify {
    use log::{debug, warn};
    use ssh2::{CheckResult, KnownHostFileKind, Session};

    use super::{known_hosts_entry, HostKeyPolicy};
    use crate::session::errors::SessionError;

    pub(crate) fn verify_host_key(
        session: &Session,
        host: &str,
        port: u16,
        policy: &HostKeyPolicy,
    ) -> Result<(), SessionError> {
        let (path, record_unknown) = match policy {
            HostKeyPolicy::AcceptAny => {
                debug!("Skipping host key verification for {}", host);
                return Ok(());
            }
            HostKeyPolicy::KnownHosts(path) => (path, false),
            HostKeyPolicy::TrustFirstUse(path) => (path, true),
        };

        let rejected = |reason: String| SessionError::HostKey {
            host: host.to_string(),
            reason,
        };

        let (key, key_type) = session
            .host_key()
            .ok_or_else(|| rejected("server presented no host key".into()))?;
        let mut known_hosts = session
            .known_hosts()
            .map_err(|e| SessionError::connection("Known hosts error", e))?;
        if path.exists() {
            known_hosts
                .read_file(path, KnownHostFileKind::OpenSSH)
                .map_err(|e| rejected(format!("cannot read {}: {}", path.display(), e)))?;
        }

        match known_hosts.check_port(host, port, key) {
            CheckResult::Match => {
                debug!("Host key for {} matches {:?}", host, path);
                Ok(())
            }
            CheckResult::Mismatch => Err(rejected(format!(
                "key does not match the entry in {}",
                path.display()
            ))),
            CheckResult::NotFound if record_unknown => {
                let entry = known_hosts_entry(host, port);
                known_hosts
                    .add(&entry, key, "added by ssh-manager", key_type.into())
                    .and_then(|_| known_hosts.write_file(path, KnownHostFileKind::OpenSSH))
                    .map_err(|e| rejected(format!("cannot record key: {}", e)))?;
                warn!("Permanently added '{}' to {}", entry, path.display());
                Ok(())
            }
            CheckResult::NotFound => Err(rejected(format!(
                "host is not listed in {}",
                path.display()
            ))),
            CheckResult::Failure => Err(rejected("known hosts check failed".into())),
        }
    }
}
