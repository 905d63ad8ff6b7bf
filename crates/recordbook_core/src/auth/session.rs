//! Authenticated identity and per-login session state.

use crate::model::entry::EntryId;
use std::fmt::{Display, Formatter};

/// Opaque authenticated identity, equal to the username it logged in as.
///
/// Only `AuthService::login` can create one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    pub(crate) fn new(username: impl Into<String>) -> Self {
        Self(username.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of one authenticated context, from login until logout.
///
/// Not `Clone`: two independently authenticated contexts never share one
/// session value.
#[derive(Debug, PartialEq, Eq)]
pub struct Session {
    identity: Identity,
    editing: Option<EntryId>,
}

impl Session {
    pub(crate) fn start(identity: Identity) -> Self {
        Self {
            identity,
            editing: None,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Marks `id` as the entry currently loaded into the edit form.
    pub fn begin_edit(&mut self, id: EntryId) {
        self.editing = Some(id);
    }

    /// Entry currently being edited, if any.
    pub fn editing(&self) -> Option<EntryId> {
        self.editing
    }

    /// Leaves edit mode and returns the entry that was being edited.
    pub fn finish_edit(&mut self) -> Option<EntryId> {
        self.editing.take()
    }
}
