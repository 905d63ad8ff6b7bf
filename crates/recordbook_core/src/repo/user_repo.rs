//! `Users` collection repository.
//!
//! # Invariants
//! - `username` is the primary key and is compared case-sensitively.
//! - Inserting an existing username fails with `DuplicateKey` and writes
//!   nothing.

use super::{ensure_connection_ready, row_error, StoreError, StoreResult, USERS};
use crate::model::user::{PasswordDigest, User};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const USER_SELECT_SQL: &str = "SELECT
    username,
    password_hash,
    password_salt,
    hash_iterations
FROM users";

/// Repository interface for credential records.
pub trait UserRepository {
    /// Inserts a new user keyed by its username.
    fn insert_user(&self, user: &User) -> StoreResult<()>;
    /// Point lookup by username.
    fn get_user(&self, username: &str) -> StoreResult<Option<User>>;
    /// Full scan in key order.
    fn list_users(&self) -> StoreResult<Vec<User>>;
    /// Removes a user if present; absent keys are a no-op.
    fn delete_user(&self, username: &str) -> StoreResult<()>;
}

/// SQLite-backed users repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_connection_ready(conn, USERS)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn insert_user(&self, user: &User) -> StoreResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if user_exists_in_tx(&tx, user.username.as_str())? {
            return Err(StoreError::DuplicateKey {
                collection: USERS,
                key: user.username.clone(),
            });
        }

        tx.execute(
            "INSERT INTO users (
                username,
                password_hash,
                password_salt,
                hash_iterations
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                user.username.as_str(),
                user.password.hash.as_str(),
                user.password.salt.as_str(),
                user.password.iterations,
            ],
        )?;
        tx.commit()?;

        Ok(())
    }

    fn get_user(&self, username: &str) -> StoreResult<Option<User>> {
        let row = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE username = ?1;"),
                [username],
                read_user_columns,
            )
            .optional()
            .map_err(|err| row_error(USERS, err))?;

        row.map(validate_user).transpose()
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} ORDER BY username ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();

        while let Some(row) = rows.next()? {
            let user = read_user_columns(row).map_err(|err| row_error(USERS, err))?;
            users.push(validate_user(user)?);
        }

        Ok(users)
    }

    fn delete_user(&self, username: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM users WHERE username = ?1;", [username])?;
        Ok(())
    }
}

fn user_exists_in_tx(tx: &Transaction<'_>, username: &str) -> StoreResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1);",
        [username],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn read_user_columns(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        username: row.get("username")?,
        password: PasswordDigest {
            hash: row.get("password_hash")?,
            salt: row.get("password_salt")?,
            iterations: row.get("hash_iterations")?,
        },
    })
}

fn validate_user(user: User) -> StoreResult<User> {
    if user.password.iterations == 0 {
        return Err(StoreError::InvalidData(format!(
            "zero hash_iterations for user `{}`",
            user.username
        )));
    }
    if user.password.hash.is_empty() || hex::decode(&user.password.hash).is_err() {
        return Err(StoreError::InvalidData(format!(
            "password_hash of user `{}` is not hex",
            user.username
        )));
    }
    Ok(user)
}
