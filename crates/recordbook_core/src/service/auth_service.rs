//! Registration, login and owner-scoped entry use-cases.
//!
//! # Responsibility
//! - Register and authenticate users against the `Users` collection.
//! - Mediate every `Entries` read and write through the ownership filter.
//! - Translate store failures into the service's own error vocabulary.
//!
//! # Invariants
//! - Unknown user and wrong password produce the same `InvalidCredentials`.
//! - An identity never sees, changes or deletes another identity's entry,
//!   even when it knows the numeric id.
//! - The filter in `list_owned_entries` is the only read-side authorization
//!   boundary; the store itself returns everything.

use crate::auth::password::{burn_dummy_digest, digest_password, verify_password};
use crate::auth::session::{Identity, Session};
use crate::config::{AuthConfig, ConfigError, CredentialField};
use crate::model::entry::{Entry, EntryContent, EntryDraft, EntryId};
use crate::model::user::{PasswordDigest, User};
use crate::repo::entry_repo::OwnedWrite;
use crate::repo::StoreError;
use crate::store::RecordStore;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AuthResult<T> = Result<T, AuthError>;

/// Outcome vocabulary exposed to the presentation layer.
#[derive(Debug)]
pub enum AuthError {
    /// Username or password is shorter than the configured minimum.
    WeakCredential {
        field: CredentialField,
        min_chars: usize,
    },
    /// Registration attempted for an existing username.
    UsernameTaken(String),
    /// Unknown username or wrong password; the two are not distinguished.
    InvalidCredentials,
    /// No entry exists with this id.
    NotFound(EntryId),
    /// Entry exists but belongs to another identity.
    NotOwned(EntryId),
    /// Storage cannot be opened or is at the wrong schema; not retried.
    StoreUnavailable(StoreError),
    /// A storage transaction failed and was rolled back; safe to retry.
    TransactionFailed(StoreError),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WeakCredential { field, min_chars } => {
                write!(f, "{field} must be at least {min_chars} characters")
            }
            Self::UsernameTaken(username) => write!(f, "username `{username}` is already taken"),
            Self::InvalidCredentials => write!(f, "invalid username or password"),
            Self::NotFound(id) => write!(f, "entry not found: {id}"),
            Self::NotOwned(id) => write!(f, "entry {id} belongs to another user"),
            Self::StoreUnavailable(_) => write!(f, "record storage is unavailable"),
            Self::TransactionFailed(_) => write!(f, "record storage operation failed"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreUnavailable(err) => Some(err),
            Self::TransactionFailed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::DuplicateKey { key, .. } => Self::UsernameTaken(key),
            err @ (StoreError::Unavailable(_) | StoreError::UninitializedConnection { .. }) => {
                Self::StoreUnavailable(err)
            }
            other => Self::TransactionFailed(other),
        }
    }
}

/// Sole entry point of the presentation layer into the record store.
#[derive(Debug, Clone)]
pub struct AuthService {
    store: RecordStore,
    config: AuthConfig,
}

impl AuthService {
    /// Creates a service with the default credential and hashing policy.
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            config: AuthConfig::default(),
        }
    }

    /// Creates a service with a caller-provided policy.
    pub fn with_config(store: RecordStore, config: AuthConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Registers a new user.
    ///
    /// # Errors
    /// - `WeakCredential` when a credential is below the policy minimum.
    /// - `UsernameTaken` when the username already exists; nothing is written.
    pub async fn register(&self, username: &str, password: &str) -> AuthResult<()> {
        if let Some((field, min_chars)) = self.config.credentials.check(username, password) {
            info!(
                "event=auth_register module=auth status=rejected error_code=weak_{}",
                field
            );
            return Err(AuthError::WeakCredential { field, min_chars });
        }

        let digest = self.digest(password.to_string()).await?;
        match self.store.put_user(User::new(username, digest)).await {
            Ok(_) => {
                info!(
                    "event=auth_register module=auth status=ok username={}",
                    username
                );
                Ok(())
            }
            Err(err) => {
                let mapped = AuthError::from(err);
                if matches!(mapped, AuthError::UsernameTaken(_)) {
                    info!("event=auth_register module=auth status=rejected error_code=username_taken");
                } else {
                    warn!(
                        "event=auth_register module=auth status=error error={}",
                        mapped
                    );
                }
                Err(mapped)
            }
        }
    }

    /// Authenticates a user and starts a session for it.
    ///
    /// An unknown username costs one digest at the configured iteration
    /// count, while a known one is verified at its stored count; the timings
    /// match only while those two counts agree.
    ///
    /// # Errors
    /// - `InvalidCredentials` for an unknown username or a wrong password.
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<Session> {
        let stored = self.store.get_user(username).await?;
        let password = password.to_string();
        let iterations = self.config.hashing.iterations;

        let verified = tokio::task::spawn_blocking(move || match stored {
            Some(user) => verify_password(password.as_str(), &user.password).then_some(user),
            None => {
                burn_dummy_digest(password.as_str(), iterations);
                None
            }
        })
        .await
        .map_err(|err| {
            AuthError::TransactionFailed(StoreError::Interrupted(format!(
                "password verification task failed: {err}"
            )))
        })?;

        match verified {
            Some(user) => {
                info!(
                    "event=auth_login module=auth status=ok username={}",
                    user.username
                );
                Ok(Session::start(Identity::new(user.username)))
            }
            None => {
                info!("event=auth_login module=auth status=rejected error_code=invalid_credentials");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Ends a session. The session value is consumed and cannot be reused.
    pub fn logout(&self, session: Session) {
        info!(
            "event=auth_logout module=auth status=ok username={}",
            session.identity()
        );
    }

    /// Lists the entries created by `identity`.
    pub async fn list_owned_entries(&self, identity: &Identity) -> AuthResult<Vec<Entry>> {
        let entries = self.store.list_entries().await?;
        Ok(entries
            .into_iter()
            .filter(|entry| entry.is_owned_by(identity.as_str()))
            .collect())
    }

    /// Loads one entry owned by `identity`, typically to fill the edit form.
    ///
    /// # Errors
    /// - `NotFound` when no entry has this id.
    /// - `NotOwned` when the entry belongs to another identity.
    pub async fn get_owned_entry(&self, identity: &Identity, id: EntryId) -> AuthResult<Entry> {
        let entry = self
            .store
            .get_entry(id)
            .await?
            .ok_or(AuthError::NotFound(id))?;
        ensure_owned(identity, &entry)?;
        Ok(entry)
    }

    /// Creates an entry stamped with `identity` as its owner.
    pub async fn add_entry(
        &self,
        identity: &Identity,
        content: EntryContent,
    ) -> AuthResult<Entry> {
        let entry = self
            .store
            .add_entry(EntryDraft::new(identity.as_str(), content))
            .await?;
        info!(
            "event=entry_add module=auth status=ok entry_id={} username={}",
            entry.id, identity
        );
        Ok(entry)
    }

    /// Overwrites the content fields of an owned entry.
    ///
    /// `id` and owner are preserved. The ownership check and the write run in
    /// one store transaction.
    ///
    /// # Errors
    /// - `NotFound` when no entry has this id.
    /// - `NotOwned` when the entry belongs to another identity; nothing changes.
    pub async fn update_entry(
        &self,
        identity: &Identity,
        id: EntryId,
        content: EntryContent,
    ) -> AuthResult<Entry> {
        match self
            .store
            .update_owned_entry(identity.as_str(), id, content)
            .await?
        {
            OwnedWrite::Applied(entry) => {
                info!(
                    "event=entry_update module=auth status=ok entry_id={} username={}",
                    id, identity
                );
                Ok(entry)
            }
            OwnedWrite::Missing => Err(AuthError::NotFound(id)),
            OwnedWrite::OwnedByOther => Err(not_owned(identity, id)),
        }
    }

    /// Deletes an owned entry.
    ///
    /// Deleting an id that no longer exists succeeds.
    ///
    /// # Errors
    /// - `NotOwned` when the entry belongs to another identity; it is kept.
    pub async fn delete_entry(&self, identity: &Identity, id: EntryId) -> AuthResult<()> {
        match self.store.delete_owned_entry(identity.as_str(), id).await? {
            OwnedWrite::Applied(()) => {
                info!(
                    "event=entry_delete module=auth status=ok entry_id={} username={}",
                    id, identity
                );
                Ok(())
            }
            OwnedWrite::Missing => Ok(()),
            OwnedWrite::OwnedByOther => Err(not_owned(identity, id)),
        }
    }

    async fn digest(&self, password: String) -> AuthResult<PasswordDigest> {
        let iterations = self.config.hashing.iterations;
        tokio::task::spawn_blocking(move || digest_password(password.as_str(), iterations))
            .await
            .map_err(|err| {
                AuthError::TransactionFailed(StoreError::Interrupted(format!(
                    "password digest task failed: {err}"
                )))
            })
    }
}

fn ensure_owned(identity: &Identity, entry: &Entry) -> AuthResult<()> {
    if entry.is_owned_by(identity.as_str()) {
        return Ok(());
    }
    Err(not_owned(identity, entry.id))
}

fn not_owned(identity: &Identity, id: EntryId) -> AuthError {
    warn!(
        "event=entry_access module=auth status=rejected error_code=not_owned entry_id={} username={}",
        id, identity
    );
    AuthError::NotOwned(id)
}
