//! Repository gateways
//!
//! Typed read/write contracts for each entity kind. The use cases only see
//! these traits; `crate::store` provides the PostgreSQL and in-memory
//! implementations.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Account, Client, Transaction};
use crate::store::StoreError;

#[async_trait]
pub trait ClientGateway: Send + Sync {
    /// Fails with `StoreError::NotFound` for an unknown id
    async fn get(&self, id: Uuid) -> Result<Client, StoreError>;

    async fn save(&self, client: &Client) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AccountGateway: Send + Sync {
    async fn save(&self, account: &Account) -> Result<(), StoreError>;

    /// Fails with `StoreError::NotFound` for an unknown id
    async fn find_by_id(&self, id: Uuid) -> Result<Account, StoreError>;

    /// Persist the account's current balance
    async fn update_balance(&self, account: &Account) -> Result<(), StoreError>;
}

#[async_trait]
pub trait TransactionGateway: Send + Sync {
    async fn create(&self, transaction: &Transaction) -> Result<(), StoreError>;
}
