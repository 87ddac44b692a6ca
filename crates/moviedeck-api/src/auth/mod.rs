//! Session authentication.
//!
//! Drives the request token -> browser approval -> session handshake and
//! keeps the resulting credentials in a [`CredentialStore`].

mod machine;
mod state;
mod store;

pub use machine::{Authentication, Authenticator, Authorization, Clock, LocalAuthentication};
pub use state::{AuthPhase, CredentialState};
#[allow(clippy::module_name_repetitions)]
pub use store::{
    CredentialStore, DEFAULT_NAMESPACE, FileCredentialStore, MemoryCredentialStore,
};
