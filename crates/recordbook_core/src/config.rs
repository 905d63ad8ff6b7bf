//! Tunables for registration and password hashing.
//!
//! Every struct deserializes with `#[serde(default)]`, so a host application
//! can embed a partial `[auth]` section in its own config file and inherit the
//! defaults for the rest.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_MIN_USERNAME_CHARS: usize = 3;
const DEFAULT_MIN_PASSWORD_CHARS: usize = 4;
const DEFAULT_HASH_ITERATIONS: u32 = 100_000;

/// Which credential failed the registration policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialField {
    Username,
    Password,
}

impl Display for CredentialField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Username => f.write_str("username"),
            Self::Password => f.write_str("password"),
        }
    }
}

/// Minimum credential lengths, counted in Unicode scalar values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialPolicy {
    pub min_username_chars: usize,
    pub min_password_chars: usize,
}

impl Default for CredentialPolicy {
    fn default() -> Self {
        Self {
            min_username_chars: DEFAULT_MIN_USERNAME_CHARS,
            min_password_chars: DEFAULT_MIN_PASSWORD_CHARS,
        }
    }
}

impl CredentialPolicy {
    /// Returns the first field that is too short, with its required minimum.
    ///
    /// The username is checked before the password.
    pub fn check(&self, username: &str, password: &str) -> Option<(CredentialField, usize)> {
        if username.chars().count() < self.min_username_chars {
            return Some((CredentialField::Username, self.min_username_chars));
        }
        if password.chars().count() < self.min_password_chars {
            return Some((CredentialField::Password, self.min_password_chars));
        }
        None
    }
}

/// PBKDF2 parameters for new password digests.
///
/// Existing users keep the round count stored with their digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashingPolicy {
    pub iterations: u32,
}

impl Default for HashingPolicy {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_HASH_ITERATIONS,
        }
    }
}

/// Configuration consumed by `AuthService`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub credentials: CredentialPolicy,
    pub hashing: HashingPolicy,
}

impl AuthConfig {
    /// Rejects settings that would make hashing or registration unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hashing.iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        Ok(())
    }
}

/// Invalid `AuthConfig` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroIterations,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroIterations => write!(f, "hashing.iterations must be greater than zero"),
        }
    }
}

impl Error for ConfigError {}
