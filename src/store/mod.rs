//! Account record storage.
//!
//! The [`AccountStore`] trait is the only way handlers touch persisted
//! accounts. Two backends implement it:
//! - [`MemoryStore`]: in-process map, for tests and demos
//! - [`SqliteStore`]: SQLite via `sqlx`

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::account::{Account, AccountId, AccountPayload};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Update targeted an id that is not stored.
    #[error("account {0} not found")]
    NotFound(AccountId),

    /// Database driver error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence operations on accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persist a new account under a freshly assigned id.
    async fn create(&self, payload: AccountPayload) -> Result<Account, StoreError>;

    /// Look up one account.
    async fn find(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Every stored account, ordered by id.
    async fn all(&self) -> Result<Vec<Account>, StoreError>;

    /// Overwrite an existing account. Fails with [`StoreError::NotFound`]
    /// if `account.id` is not stored.
    async fn update(&self, account: &Account) -> Result<Account, StoreError>;

    /// Remove an account. Returns whether anything was removed; absence is
    /// not an error.
    async fn delete(&self, id: AccountId) -> Result<bool, StoreError>;

    /// Remove every account. Issued ids are not reused afterwards.
    async fn delete_all(&self) -> Result<(), StoreError>;
}

/// Shared handle to a store backend.
pub type SharedStore = Arc<dyn AccountStore>;

/// Open the backend selected by `database_url`: SQLite when set, memory
/// otherwise.
pub async fn open(database_url: Option<&str>) -> Result<SharedStore, StoreError> {
    match database_url {
        Some(url) => Ok(Arc::new(SqliteStore::connect(url).await?)),
        None => Ok(Arc::new(MemoryStore::new())),
    }
}
