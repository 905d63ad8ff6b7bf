//! User credential record.

use serde::{Deserialize, Serialize};

/// Salted one-way digest of a password, as persisted in `users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordDigest {
    /// Lowercase hex of the derived key (fixed length).
    pub hash: String,
    /// Lowercase hex of the per-user random salt.
    pub salt: String,
    /// Round count the hash was derived with.
    pub iterations: u32,
}

/// Credential record keyed by `username`.
///
/// Usernames are compared byte-for-byte: `Alice` and `alice` are two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: PasswordDigest,
}

impl User {
    pub fn new(username: impl Into<String>, password: PasswordDigest) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}
