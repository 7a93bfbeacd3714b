//! Bearer credential persistence and role handling.
//! Keep the public surface thin and split implementation across sub-modules.

mod backend;
mod role;
mod store;

pub use backend::{CredentialBackend, FileBackend, MemoryBackend, Scope};
pub use role::Role;
pub use store::{CredentialStore, ROLE_KEY, TOKEN_KEY};
