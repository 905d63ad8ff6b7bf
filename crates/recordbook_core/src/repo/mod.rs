//! Synchronous per-collection repositories over the SQLite connection.
//!
//! # Responsibility
//! - Define CRUD contracts for the `Users` and `Entries` collections.
//! - Keep SQL inside the persistence boundary; callers see records and
//!   semantic errors (`DuplicateKey`) instead of SQLite codes.
//!
//! # Invariants
//! - Repositories only accept connections migrated to the latest version.
//! - Every write is a single atomic transaction; a failed write leaves the
//!   database exactly as it was.
//! - No ownership filtering happens here. Callers enforce it.

use crate::db::migrations::{latest_version, schema_version};
use crate::db::DbError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod entry_repo;
pub mod user_repo;

/// Collection name of credential records.
pub const USERS: &str = "users";
/// Collection name of owned data records.
pub const ENTRIES: &str = "entries";

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the record store and its repositories.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying storage could not be opened or migrated.
    Unavailable(DbError),
    /// A record with the same primary key already exists.
    DuplicateKey {
        collection: &'static str,
        key: String,
    },
    /// Key cannot address a record (for example a non-positive entry id).
    InvalidKey {
        collection: &'static str,
        key: String,
    },
    /// A replace targeted a key that has no record.
    NotFound {
        collection: &'static str,
        key: String,
    },
    /// SQLite failed while running the transaction; it was rolled back.
    TransactionFailed(rusqlite::Error),
    /// Connection schema is not at the version this build expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted row cannot be mapped to a valid record.
    InvalidData(String),
    /// Blocking worker panicked or the connection lock was poisoned.
    Interrupted(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(err) => write!(f, "record store unavailable: {err}"),
            Self::DuplicateKey { collection, key } => {
                write!(f, "duplicate key `{key}` in {collection}")
            }
            Self::InvalidKey { collection, key } => {
                write!(f, "invalid key `{key}` for {collection}")
            }
            Self::NotFound { collection, key } => {
                write!(f, "no record `{key}` in {collection}")
            }
            Self::TransactionFailed(err) => write!(f, "transaction failed: {err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "record store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted record: {message}"),
            Self::Interrupted(message) => write!(f, "store operation interrupted: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable(err) => Some(err),
            Self::TransactionFailed(err) => Some(err),
            Self::DuplicateKey { .. } => None,
            Self::InvalidKey { .. } => None,
            Self::NotFound { .. } => None,
            Self::UninitializedConnection { .. } => None,
            Self::InvalidData(_) => None,
            Self::Interrupted(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Unavailable(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::TransactionFailed(value)
    }
}

/// Maps a failure raised while decoding a row.
///
/// Column type and range mismatches mean the stored row is corrupt, not that
/// the read failed, so they become `InvalidData`.
pub(crate) fn row_error(collection: &'static str, err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::InvalidColumnType(index, name, kind) => StoreError::InvalidData(format!(
            "{collection} column {index} `{name}` holds {kind}"
        )),
        rusqlite::Error::FromSqlConversionFailure(index, kind, source) => {
            StoreError::InvalidData(format!(
                "{collection} column {index} ({kind}) cannot be decoded: {source}"
            ))
        }
        rusqlite::Error::IntegralValueOutOfRange(index, value) => StoreError::InvalidData(
            format!("{collection} column {index} value {value} is out of range"),
        ),
        other => StoreError::TransactionFailed(other),
    }
}

/// Verifies that `conn` carries the latest schema and the given table.
pub(crate) fn ensure_connection_ready(conn: &Connection, table: &'static str) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(StoreError::InvalidData(format!(
            "table `{table}` is missing at schema version {actual_version}"
        )));
    }

    Ok(())
}
