//! Owned data record (name/address/license triple).
//!
//! # Invariants
//! - `id` is assigned by the store and never reused after deletion.
//! - `user_id` is stamped at creation and never rewritten by an update.

use serde::{Deserialize, Serialize};

/// Store-assigned entry key. The first entry of a fresh store gets `1`.
pub type EntryId = i64;

/// The user-editable fields of an entry.
///
/// Free-form text; no format validation is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryContent {
    pub name: String,
    pub address: String,
    pub license: String,
}

impl EntryContent {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        license: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            license: license.into(),
        }
    }
}

/// Entry that has not been stored yet, so has no id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    pub user_id: String,
    pub content: EntryContent,
}

impl EntryDraft {
    pub fn new(user_id: impl Into<String>, content: EntryContent) -> Self {
        Self {
            user_id: user_id.into(),
            content,
        }
    }

    /// Attaches the id assigned by the store.
    pub fn into_entry(self, id: EntryId) -> Entry {
        Entry {
            id,
            user_id: self.user_id,
            content: self.content,
        }
    }
}

/// Stored entry, serialized flat as `{ id, userId, name, address, license }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(flatten)]
    pub content: EntryContent,
}

impl Entry {
    /// Returns whether `owner` created this entry.
    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.user_id == owner
    }

    /// Replaces the content fields, keeping `id` and `user_id`.
    pub fn replace_content(&mut self, content: EntryContent) {
        self.content = content;
    }
}

#[cfg(test)]
mod tests {
    use super::{Entry, EntryContent, EntryDraft};

    #[test]
    fn replace_content_keeps_identity_fields() {
        let mut entry =
            EntryDraft::new("alice", EntryContent::new("N", "Addr", "Lic")).into_entry(7);
        entry.replace_content(EntryContent::new("N2", "Addr2", "Lic2"));

        assert_eq!(entry.id, 7);
        assert_eq!(entry.user_id, "alice");
        assert_eq!(entry.content.name, "N2");
    }

    #[test]
    fn ownership_is_case_sensitive() {
        let entry = EntryDraft::new("alice", EntryContent::default()).into_entry(1);
        assert!(entry.is_owned_by("alice"));
        assert!(!entry.is_owned_by("Alice"));
    }

    #[test]
    fn serializes_flat_with_user_id_key() {
        let entry = Entry {
            id: 3,
            user_id: "bob".to_string(),
            content: EntryContent::new("Name", "Street 1", "X-99"),
        };
        let value = serde_json::to_value(&entry).expect("entry should serialize");

        assert_eq!(value["id"], 3);
        assert_eq!(value["userId"], "bob");
        assert_eq!(value["license"], "X-99");
    }
}
