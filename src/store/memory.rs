//! In-memory store
//!
//! Same isolation contract as the PostgreSQL store without a database.
//! Each scope stages its writes privately and remembers the version of every
//! account it read. Commit re-checks those versions under the write lock and
//! applies all staged writes at once, or nothing on conflict.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::domain::{Account, Balance, Client, Transaction};
use crate::gateway::{AccountGateway, ClientGateway, TransactionGateway};
use crate::uow::UnitOfWork;

use super::{StoreError, TransactionalStore};

#[derive(Debug, Clone)]
struct AccountRow {
    client_id: Uuid,
    balance: Balance,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl AccountRow {
    fn from_account(account: &Account, version: u64) -> Self {
        Self {
            client_id: account.client().id,
            balance: account.balance(),
            created_at: account.created_at(),
            updated_at: account.updated_at(),
            version,
        }
    }
}

#[derive(Debug, Default)]
struct Committed {
    clients: HashMap<Uuid, Arc<Client>>,
    accounts: HashMap<Uuid, AccountRow>,
    transactions: Vec<Transaction>,
}

#[derive(Debug, Default)]
struct Staged {
    clients: HashMap<Uuid, Arc<Client>>,
    accounts: HashMap<Uuid, AccountRow>,
    transactions: Vec<Transaction>,
    /// Committed version observed for each account this scope touched.
    /// `None` marks an account created by this scope.
    read_versions: HashMap<Uuid, Option<u64>>,
}

/// Handle to one in-memory scope
#[derive(Clone)]
pub struct MemoryTx {
    committed: Arc<RwLock<Committed>>,
    staged: Arc<Mutex<Option<Staged>>>,
}

/// Transactional in-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    committed: Arc<RwLock<Committed>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coordinator with every in-memory repository registered
    pub fn unit_of_work(self) -> UnitOfWork<MemoryStore> {
        let mut uow = UnitOfWork::new(self);
        uow.register_accounts(|tx| Arc::new(MemoryAccountRepository::new(tx)))
            .register_clients(|tx| Arc::new(MemoryClientRepository::new(tx)))
            .register_transactions(|tx| Arc::new(MemoryTransactionRepository::new(tx)));
        uow
    }

    /// Committed balance of an account, if it exists
    pub async fn balance_of(&self, account_id: Uuid) -> Option<Decimal> {
        let committed = self.committed.read().await;
        committed
            .accounts
            .get(&account_id)
            .map(|row| row.balance.value())
    }

    /// Committed transactions in commit order
    pub async fn transactions(&self) -> Vec<Transaction> {
        self.committed.read().await.transactions.clone()
    }

    pub async fn client_count(&self) -> usize {
        self.committed.read().await.clients.len()
    }

    pub async fn account_count(&self) -> usize {
        self.committed.read().await.accounts.len()
    }
}

#[async_trait]
impl TransactionalStore for MemoryStore {
    type Handle = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StoreError> {
        Ok(MemoryTx {
            committed: Arc::clone(&self.committed),
            staged: Arc::new(Mutex::new(Some(Staged::default()))),
        })
    }

    async fn commit(&self, handle: MemoryTx) -> Result<(), StoreError> {
        let staged = handle
            .staged
            .lock()
            .await
            .take()
            .ok_or(StoreError::ScopeClosed)?;

        let mut committed = self.committed.write().await;

        for (id, observed) in &staged.read_versions {
            let current = committed.accounts.get(id).map(|row| row.version);
            if current != *observed {
                tracing::warn!(account_id = %id, ?observed, ?current, "Stale account read, rejecting commit");
                return Err(StoreError::Conflict {
                    entity: "account",
                    id: *id,
                });
            }
        }

        for id in staged.clients.keys() {
            if committed.clients.contains_key(id) {
                return Err(StoreError::Conflict {
                    entity: "client",
                    id: *id,
                });
            }
        }

        committed.clients.extend(staged.clients);
        for (id, mut row) in staged.accounts {
            row.version = staged.read_versions.get(&id).copied().flatten().map_or(1, |v| v + 1);
            committed.accounts.insert(id, row);
        }
        committed.transactions.extend(staged.transactions);

        Ok(())
    }

    async fn rollback(&self, handle: MemoryTx) -> Result<(), StoreError> {
        handle.staged.lock().await.take();
        Ok(())
    }
}

impl MemoryTx {
    async fn find_client(&self, staged: &Staged, id: Uuid) -> Option<Arc<Client>> {
        if let Some(client) = staged.clients.get(&id) {
            return Some(Arc::clone(client));
        }
        self.committed.read().await.clients.get(&id).cloned()
    }
}

// =========================================================================
// Repositories
// =========================================================================

pub struct MemoryClientRepository {
    tx: MemoryTx,
}

impl MemoryClientRepository {
    pub fn new(tx: MemoryTx) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl ClientGateway for MemoryClientRepository {
    async fn get(&self, id: Uuid) -> Result<Client, StoreError> {
        let guard = self.tx.staged.lock().await;
        let staged = guard.as_ref().ok_or(StoreError::ScopeClosed)?;

        self.tx
            .find_client(staged, id)
            .await
            .map(|client| (*client).clone())
            .ok_or_else(|| StoreError::not_found("client", id))
    }

    async fn save(&self, client: &Client) -> Result<(), StoreError> {
        let mut guard = self.tx.staged.lock().await;
        let staged = guard.as_mut().ok_or(StoreError::ScopeClosed)?;

        if self.tx.find_client(staged, client.id).await.is_some() {
            return Err(StoreError::Conflict {
                entity: "client",
                id: client.id,
            });
        }
        staged.clients.insert(client.id, Arc::new(client.clone()));
        Ok(())
    }
}

pub struct MemoryAccountRepository {
    tx: MemoryTx,
}

impl MemoryAccountRepository {
    pub fn new(tx: MemoryTx) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl AccountGateway for MemoryAccountRepository {
    async fn save(&self, account: &Account) -> Result<(), StoreError> {
        let mut guard = self.tx.staged.lock().await;
        let staged = guard.as_mut().ok_or(StoreError::ScopeClosed)?;

        let client_id = account.client().id;
        if self.tx.find_client(staged, client_id).await.is_none() {
            return Err(StoreError::not_found("client", client_id));
        }

        let exists = staged.accounts.contains_key(&account.id())
            || self
                .tx
                .committed
                .read()
                .await
                .accounts
                .contains_key(&account.id());
        if exists {
            return Err(StoreError::Conflict {
                entity: "account",
                id: account.id(),
            });
        }

        staged.read_versions.insert(account.id(), None);
        staged
            .accounts
            .insert(account.id(), AccountRow::from_account(account, 0));
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Account, StoreError> {
        let mut guard = self.tx.staged.lock().await;
        let staged = guard.as_mut().ok_or(StoreError::ScopeClosed)?;

        let row = match staged.accounts.get(&id) {
            Some(row) => row.clone(),
            None => {
                let row = self
                    .tx
                    .committed
                    .read()
                    .await
                    .accounts
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| StoreError::not_found("account", id))?;
                staged.read_versions.entry(id).or_insert(Some(row.version));
                row
            }
        };

        let client = self
            .tx
            .find_client(staged, row.client_id)
            .await
            .ok_or_else(|| StoreError::Corrupt(format!("account {} has no client", id)))?;

        Ok(Account::from_db_state(
            id,
            client,
            row.balance,
            row.created_at,
            row.updated_at,
        ))
    }

    async fn update_balance(&self, account: &Account) -> Result<(), StoreError> {
        let mut guard = self.tx.staged.lock().await;
        let staged = guard.as_mut().ok_or(StoreError::ScopeClosed)?;

        let id = account.id();
        if !staged.accounts.contains_key(&id) {
            let version = self
                .tx
                .committed
                .read()
                .await
                .accounts
                .get(&id)
                .map(|row| row.version)
                .ok_or_else(|| StoreError::not_found("account", id))?;
            staged.read_versions.entry(id).or_insert(Some(version));
        }

        staged
            .accounts
            .insert(id, AccountRow::from_account(account, 0));
        Ok(())
    }
}

pub struct MemoryTransactionRepository {
    tx: MemoryTx,
}

impl MemoryTransactionRepository {
    pub fn new(tx: MemoryTx) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl TransactionGateway for MemoryTransactionRepository {
    async fn create(&self, transaction: &Transaction) -> Result<(), StoreError> {
        let mut guard = self.tx.staged.lock().await;
        let staged = guard.as_mut().ok_or(StoreError::ScopeClosed)?;
        staged.transactions.push(transaction.clone());
        Ok(())
    }
}
