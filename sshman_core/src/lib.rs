pub mod session;
pub mod storage;
pub mod utils;

// re‑export ergonomic entry points
pub use session::{open_session, HostKeyPolicy, ProcessTransport, SessionError, Transport};
#[cfg(feature = "ssh")]
pub use session::NativeTransport;
pub use storage::{Identity, IdentityStore, StoreError};
