//! Core persistence and authentication for recordbook.
//! This crate is the single source of truth for ownership and credential
//! invariants; presentation code only calls `AuthService`.

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use auth::session::{Identity, Session};
pub use config::{AuthConfig, ConfigError, CredentialField, CredentialPolicy, HashingPolicy};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entry::{Entry, EntryContent, EntryDraft, EntryId};
pub use model::user::{PasswordDigest, User};
pub use repo::entry_repo::{EntryRepository, OwnedWrite, SqliteEntryRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{StoreError, StoreResult};
pub use service::auth_service::{AuthError, AuthResult, AuthService};
pub use store::RecordStore;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
