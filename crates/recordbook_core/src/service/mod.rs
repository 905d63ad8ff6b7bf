//! Use-case services consumed by the presentation layer.
//!
//! # Responsibility
//! - Orchestrate store calls into authenticated, owner-scoped use-cases.
//! - Keep UI code decoupled from storage details and storage errors.

pub mod auth_service;
