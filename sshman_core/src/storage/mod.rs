pub mod errors;
pub mod identity;
mod lock;
pub mod store;

pub use errors::StoreError;
pub use identity::{Endpoint, Identity, DEFAULT_SSH_PORT};
pub use store::IdentityStore;
