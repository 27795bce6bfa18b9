use super::errors::SessionError;
use crate::storage::Identity;

/// A way of opening an interactive shell on the host an [`Identity`] points at.
///
/// Implementations attach the caller's terminal streams and block until the
/// remote session ends. The result only says whether the session was
/// established and ran without a connection-level failure.
pub trait Transport {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Whether `open_interactive` needs a password from the caller.
    fn requires_secret(&self) -> bool;

    fn open_interactive(
        &self,
        identity: &Identity,
        secret: Option<&str>,
    ) -> Result<(), SessionError>;
}
