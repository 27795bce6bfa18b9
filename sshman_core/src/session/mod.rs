//! Interactive remote sessions.
//!
//! A [`Transport`] opens a shell for a resolved [`Identity`] and blocks until
//! it ends. Two strategies exist: [`ProcessTransport`] runs the system ssh
//! client, `NativeTransport` (feature `ssh`) drives the protocol in-process
//! with the ssh2 library.

pub mod errors;
pub mod host_keys;
#[cfg(feature = "ssh")]
pub mod native;
pub mod process;
#[cfg(feature = "ssh")]
mod terminal;
pub mod transport;

use std::io;

use log::info;

pub use errors::SessionError;
pub use host_keys::HostKeyPolicy;
#[cfg(feature = "ssh")]
pub use native::NativeTransport;
pub use process::ProcessTransport;
pub use transport::Transport;

use crate::storage::{Identity, IdentityStore};

/// Resolves `name` in `store` and runs an interactive session to it.
///
/// `obtain_secret` is only called when the transport needs a password, and
/// only after the identity has been found.
pub fn open_session<F>(
    store: &mut IdentityStore,
    name: &str,
    transport: &dyn Transport,
    obtain_secret: F,
) -> Result<(), SessionError>
where
    F: FnOnce(&Identity) -> io::Result<String>,
{
    let identity = store.lookup(name)?;
    let secret = if transport.requires_secret() {
        Some(obtain_secret(&identity)?)
    } else {
        None
    };

    info!(
        "Opening {} session to '{}' ({})",
        transport.name(),
        identity.name,
        identity.destination()
    );
    transport.open_interactive(&identity, secret.as_deref())
}
