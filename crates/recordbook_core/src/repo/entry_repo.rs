//! `Entries` collection repository.
//!
//! # Invariants
//! - Ids come from SQLite `AUTOINCREMENT`: positive, increasing, never reused.
//! - `put_entry` only replaces an existing row; a deleted id stays deleted.
//! - Owner-scoped writes check the owner and write inside one transaction.
//! - `delete_entry` on a missing id is a no-op.

use super::{ensure_connection_ready, row_error, StoreError, StoreResult, ENTRIES};
use crate::model::entry::{Entry, EntryContent, EntryDraft, EntryId};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    name,
    address,
    license
FROM entries";

/// Outcome of a write that is only allowed for the entry's owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnedWrite<T> {
    Applied(T),
    /// No entry has the id.
    Missing,
    /// The entry belongs to another owner; nothing was written.
    OwnedByOther,
}

/// Repository interface for owned data records.
pub trait EntryRepository {
    /// Inserts a draft and returns the id assigned by the store.
    fn insert_entry(&self, draft: &EntryDraft) -> StoreResult<EntryId>;
    /// Replaces the record keyed by `entry.id`.
    fn put_entry(&self, entry: &Entry) -> StoreResult<EntryId>;
    /// Overwrites the content of entry `id` if `owner` owns it.
    fn update_owned_entry(
        &self,
        owner: &str,
        id: EntryId,
        content: &EntryContent,
    ) -> StoreResult<OwnedWrite<Entry>>;
    /// Removes entry `id` if `owner` owns it.
    fn delete_owned_entry(&self, owner: &str, id: EntryId) -> StoreResult<OwnedWrite<()>>;
    /// Point lookup by id.
    fn get_entry(&self, id: EntryId) -> StoreResult<Option<Entry>>;
    /// Full scan of every owner's entries, in id order.
    fn list_entries(&self) -> StoreResult<Vec<Entry>>;
    /// Removes an entry if present.
    fn delete_entry(&self, id: EntryId) -> StoreResult<()>;
}

/// SQLite-backed entries repository.
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntryRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_connection_ready(conn, ENTRIES)?;
        Ok(Self { conn })
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn insert_entry(&self, draft: &EntryDraft) -> StoreResult<EntryId> {
        self.conn.execute(
            "INSERT INTO entries (user_id, name, address, license)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                draft.user_id.as_str(),
                draft.content.name.as_str(),
                draft.content.address.as_str(),
                draft.content.license.as_str(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn put_entry(&self, entry: &Entry) -> StoreResult<EntryId> {
        if entry.id <= 0 {
            return Err(StoreError::InvalidKey {
                collection: ENTRIES,
                key: entry.id.to_string(),
            });
        }

        let changed = self.conn.execute(
            "UPDATE entries
             SET user_id = ?2, name = ?3, address = ?4, license = ?5
             WHERE id = ?1;",
            params![
                entry.id,
                entry.user_id.as_str(),
                entry.content.name.as_str(),
                entry.content.address.as_str(),
                entry.content.license.as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                collection: ENTRIES,
                key: entry.id.to_string(),
            });
        }

        Ok(entry.id)
    }

    fn update_owned_entry(
        &self,
        owner: &str,
        id: EntryId,
        content: &EntryContent,
    ) -> StoreResult<OwnedWrite<Entry>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut entry = match query_entry(&tx, id)? {
            None => return Ok(OwnedWrite::Missing),
            Some(entry) if !entry.is_owned_by(owner) => return Ok(OwnedWrite::OwnedByOther),
            Some(entry) => entry,
        };

        tx.execute(
            "UPDATE entries
             SET name = ?2, address = ?3, license = ?4
             WHERE id = ?1;",
            params![
                id,
                content.name.as_str(),
                content.address.as_str(),
                content.license.as_str(),
            ],
        )?;
        tx.commit()?;

        entry.replace_content(content.clone());
        Ok(OwnedWrite::Applied(entry))
    }

    fn delete_owned_entry(&self, owner: &str, id: EntryId) -> StoreResult<OwnedWrite<()>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        match query_entry(&tx, id)? {
            None => return Ok(OwnedWrite::Missing),
            Some(entry) if !entry.is_owned_by(owner) => return Ok(OwnedWrite::OwnedByOther),
            Some(_) => {}
        }

        tx.execute("DELETE FROM entries WHERE id = ?1;", [id])?;
        tx.commit()?;
        Ok(OwnedWrite::Applied(()))
    }

    fn get_entry(&self, id: EntryId) -> StoreResult<Option<Entry>> {
        query_entry(self.conn, id)
    }

    fn list_entries(&self) -> StoreResult<Vec<Entry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();

        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row).map_err(|err| row_error(ENTRIES, err))?);
        }

        Ok(entries)
    }

    fn delete_entry(&self, id: EntryId) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM entries WHERE id = ?1;", [id])?;
        Ok(())
    }
}

fn query_entry(conn: &Connection, id: EntryId) -> StoreResult<Option<Entry>> {
    conn.query_row(
        &format!("{ENTRY_SELECT_SQL} WHERE id = ?1;"),
        [id],
        parse_entry_row,
    )
    .optional()
    .map_err(|err| row_error(ENTRIES, err))
}

fn parse_entry_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        content: EntryContent {
            name: row.get("name")?,
            address: row.get("address")?,
            license: row.get("license")?,
        },
    })
}
