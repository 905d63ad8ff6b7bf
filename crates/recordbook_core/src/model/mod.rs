//! Domain records held by the two store collections.
//!
//! # Responsibility
//! - Define the `Users` and `Entries` record shapes shared by repositories,
//!   the async store and the auth service.
//!
//! # Invariants
//! - A `User` never carries a plaintext password.
//! - An `Entry` keeps the `id` and `user_id` it was created with.

pub mod entry;
pub mod user;
