//! Async record store over the embedded SQLite database.
//!
//! # Responsibility
//! - Own the single connection shared by the `Users` and `Entries`
//!   collections.
//! - Expose each repository call as an `async` unit of work that suspends the
//!   caller until its transaction finishes and resumes it exactly once.
//!
//! # Invariants
//! - Every call runs on tokio's blocking pool while holding the connection
//!   lock, so physical writes are serialized.
//! - A failed call leaves the database as it was before the call.
//! - The store applies no ownership rules; `AuthService` does.

use crate::db::{migrations, open_db, open_db_in_memory};
use crate::model::entry::{Entry, EntryContent, EntryDraft, EntryId};
use crate::model::user::User;
use crate::repo::entry_repo::{EntryRepository, OwnedWrite, SqliteEntryRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::{StoreError, StoreResult, ENTRIES, USERS};
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Handle to the opened record store. Cheap to clone; clones share one
/// connection.
#[derive(Clone)]
pub struct RecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore").finish_non_exhaustive()
    }
}

impl RecordStore {
    /// Opens (creating on first use) the store file at `path`.
    ///
    /// Safe to call repeatedly for the same path: schema upgrades run only
    /// when the file is behind the latest version.
    ///
    /// # Errors
    /// - `StoreError::Unavailable` when the file cannot be opened or was
    ///   written by a newer schema.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let conn = tokio::task::spawn_blocking(move || open_db(path))
            .await
            .map_err(|err| StoreError::Interrupted(format!("store open task failed: {err}")))??;
        Ok(Self::wrap(conn))
    }

    /// Opens a private in-memory store, mainly for tests.
    pub async fn open_in_memory() -> StoreResult<Self> {
        let conn = tokio::task::spawn_blocking(open_db_in_memory)
            .await
            .map_err(|err| StoreError::Interrupted(format!("store open task failed: {err}")))??;
        Ok(Self::wrap(conn))
    }

    /// Wraps a connection that was already bootstrapped elsewhere.
    ///
    /// # Errors
    /// - `StoreError::UninitializedConnection` when the connection is not at
    ///   the latest schema version.
    pub fn from_connection(conn: Connection) -> StoreResult<Self> {
        let expected_version = migrations::latest_version();
        let actual_version = migrations::schema_version(&conn)?;
        if actual_version != expected_version {
            return Err(StoreError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self::wrap(conn))
    }

    fn wrap(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Inserts a new user keyed by username and returns that key.
    ///
    /// # Errors
    /// - `StoreError::DuplicateKey` when the username already exists.
    pub async fn put_user(&self, user: User) -> StoreResult<String> {
        self.run("put", USERS, move |conn| {
            SqliteUserRepository::try_new(conn)?.insert_user(&user)?;
            Ok(user.username)
        })
        .await
    }

    pub async fn get_user(&self, username: impl Into<String>) -> StoreResult<Option<User>> {
        let username = username.into();
        self.run("get", USERS, move |conn| {
            SqliteUserRepository::try_new(conn)?.get_user(username.as_str())
        })
        .await
    }

    pub async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.run("get_all", USERS, |conn| {
            SqliteUserRepository::try_new(conn)?.list_users()
        })
        .await
    }

    /// Removes a user if present. Absent usernames are not an error.
    pub async fn delete_user(&self, username: impl Into<String>) -> StoreResult<()> {
        let username = username.into();
        self.run("delete", USERS, move |conn| {
            SqliteUserRepository::try_new(conn)?.delete_user(username.as_str())
        })
        .await
    }

    /// Inserts a draft, assigning a fresh id, and returns the stored entry.
    pub async fn add_entry(&self, draft: EntryDraft) -> StoreResult<Entry> {
        self.run("put", ENTRIES, move |conn| {
            let id = SqliteEntryRepository::try_new(conn)?.insert_entry(&draft)?;
            Ok(draft.into_entry(id))
        })
        .await
    }

    /// Replaces the entry sharing `entry.id`.
    ///
    /// # Errors
    /// - `StoreError::NotFound` when no entry has that id; nothing is
    ///   inserted.
    pub async fn put_entry(&self, entry: Entry) -> StoreResult<EntryId> {
        self.run("put", ENTRIES, move |conn| {
            SqliteEntryRepository::try_new(conn)?.put_entry(&entry)
        })
        .await
    }

    /// Overwrites the content of entry `id` in the same transaction that
    /// checks it belongs to `owner`.
    pub async fn update_owned_entry(
        &self,
        owner: impl Into<String>,
        id: EntryId,
        content: EntryContent,
    ) -> StoreResult<OwnedWrite<Entry>> {
        let owner = owner.into();
        self.run("put", ENTRIES, move |conn| {
            SqliteEntryRepository::try_new(conn)?.update_owned_entry(owner.as_str(), id, &content)
        })
        .await
    }

    /// Deletes entry `id` in the same transaction that checks it belongs to
    /// `owner`.
    pub async fn delete_owned_entry(
        &self,
        owner: impl Into<String>,
        id: EntryId,
    ) -> StoreResult<OwnedWrite<()>> {
        let owner = owner.into();
        self.run("delete", ENTRIES, move |conn| {
            SqliteEntryRepository::try_new(conn)?.delete_owned_entry(owner.as_str(), id)
        })
        .await
    }

    pub async fn get_entry(&self, id: EntryId) -> StoreResult<Option<Entry>> {
        self.run("get", ENTRIES, move |conn| {
            SqliteEntryRepository::try_new(conn)?.get_entry(id)
        })
        .await
    }

    /// Returns every stored entry regardless of owner.
    ///
    /// Order is not part of the contract.
    pub async fn list_entries(&self) -> StoreResult<Vec<Entry>> {
        self.run("get_all", ENTRIES, |conn| {
            SqliteEntryRepository::try_new(conn)?.list_entries()
        })
        .await
    }

    /// Removes an entry if present. Absent ids are not an error.
    pub async fn delete_entry(&self, id: EntryId) -> StoreResult<()> {
        self.run("delete", ENTRIES, move |conn| {
            SqliteEntryRepository::try_new(conn)?.delete_entry(id)
        })
        .await
    }

    async fn run<T, F>(
        &self,
        op: &'static str,
        collection: &'static str,
        work: F,
    ) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    {
        let started_at = Instant::now();
        let conn = Arc::clone(&self.conn);
        let joined = tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            work(&conn)
        })
        .await;

        let result = match joined {
            Ok(inner) => inner,
            Err(err) => Err(StoreError::Interrupted(format!("join error: {err}"))),
        };

        match &result {
            Ok(_) => debug!(
                "event=store_op module=store status=ok op={} collection={} duration_ms={}",
                op,
                collection,
                started_at.elapsed().as_millis()
            ),
            Err(StoreError::DuplicateKey { .. }) => info!(
                "event=store_op module=store status=rejected op={} collection={} error_code=duplicate_key",
                op, collection
            ),
            Err(err @ StoreError::Interrupted(_)) => error!(
                "event=store_op module=store status=error op={} collection={} error_code=interrupted error={}",
                op, collection, err
            ),
            Err(err) => warn!(
                "event=store_op module=store status=error op={} collection={} duration_ms={} error={}",
                op,
                collection,
                started_at.elapsed().as_millis(),
                err
            ),
        }

        result
    }
}
