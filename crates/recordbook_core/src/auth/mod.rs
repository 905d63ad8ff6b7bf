//! Credential digests and authenticated sessions.
//!
//! # Responsibility
//! - Derive and verify salted password digests.
//! - Define the opaque `Identity` and the `Session` that carries it.
//!
//! # Invariants
//! - Plaintext passwords never leave this module's call stack.
//! - An `Identity` can only be minted by a successful login.

pub mod password;
pub mod session;
