//! In-memory account store.
//!
//! Lives only as long as the process and is meant for tests and demos.
//! Each operation is atomic per record; there are no multi-record
//! transactions.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, instrument};

use super::{AccountStore, StoreError};
use crate::account::{Account, AccountId, AccountPayload};
use crate::metrics;

/// Account store backed by a concurrent map.
#[derive(Debug)]
pub struct MemoryStore {
    accounts: DashMap<AccountId, Account>,
    /// Last id handed out; never decreases.
    last_id: AtomicI64,
}

impl MemoryStore {
    /// Create an empty store. The first id issued is 1.
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            last_id: AtomicI64::new(0),
        }
    }

    /// Number of stored accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the store holds no accounts.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    #[instrument(skip(self, payload))]
    async fn create(&self, payload: AccountPayload) -> Result<Account, StoreError> {
        let _timer = metrics::timer_store("create");
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let account = Account::from_payload(id, payload);
        self.accounts.insert(id, account.clone());
        debug!(id, "Account stored");
        Ok(account)
    }

    async fn find(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let _timer = metrics::timer_store("find");
        Ok(self.accounts.get(&id).map(|entry| entry.value().clone()))
    }

    async fn all(&self) -> Result<Vec<Account>, StoreError> {
        let _timer = metrics::timer_store("all");
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }

    #[instrument(skip(self, account), fields(id = account.id))]
    async fn update(&self, account: &Account) -> Result<Account, StoreError> {
        let _timer = metrics::timer_store("update");
        match self.accounts.get_mut(&account.id) {
            Some(mut entry) => {
                *entry = account.clone();
                Ok(account.clone())
            }
            None => Err(StoreError::NotFound(account.id)),
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: AccountId) -> Result<bool, StoreError> {
        let _timer = metrics::timer_store("delete");
        Ok(self.accounts.remove(&id).is_some())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        self.accounts.clear();
        Ok(())
    }
}
