//! Session and credential management.
//!
//! This module provides:
//! - `Session`: in-memory store for the bearer token issued at login
//! - `CredentialStore`: OS keychain storage for remembered logins
//!
//! Session state is deliberately ephemeral: it lives and dies with the
//! owning process, the way a tab-scoped browser session does.

pub mod credentials;
pub mod session;

pub use credentials::CredentialStore;
pub use session::{Session, SessionData, SessionStore};
