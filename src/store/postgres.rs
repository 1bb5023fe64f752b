//! PostgreSQL store
//!
//! One `sqlx::Transaction` per unit of work. Account rows are read with
//! `FOR UPDATE`, so two scopes touching the same account serialize inside
//! the database.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction as SqlxTransaction};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{Account, Balance, Client, Transaction};
use crate::gateway::{AccountGateway, ClientGateway, TransactionGateway};
use crate::uow::UnitOfWork;

use super::{StoreError, TransactionalStore};

/// Shared handle to the open database transaction of one scope.
///
/// Taken (set to `None`) on commit or rollback; repositories that outlive
/// the scope get `StoreError::ScopeClosed`.
#[derive(Clone)]
pub struct PgTx(Arc<Mutex<Option<SqlxTransaction<'static, Postgres>>>>);

/// Transactional store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Coordinator with every PostgreSQL repository registered
    pub fn unit_of_work(self) -> UnitOfWork<PgStore> {
        let mut uow = UnitOfWork::new(self);
        uow.register_accounts(|tx| Arc::new(PgAccountRepository::new(tx)))
            .register_clients(|tx| Arc::new(PgClientRepository::new(tx)))
            .register_transactions(|tx| Arc::new(PgTransactionRepository::new(tx)));
        uow
    }
}

#[async_trait]
impl TransactionalStore for PgStore {
    type Handle = PgTx;

    async fn begin(&self) -> Result<PgTx, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(PgTx(Arc::new(Mutex::new(Some(tx)))))
    }

    async fn commit(&self, handle: PgTx) -> Result<(), StoreError> {
        let tx = handle.0.lock().await.take().ok_or(StoreError::ScopeClosed)?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&self, handle: PgTx) -> Result<(), StoreError> {
        // Already closed means already rolled back or committed
        if let Some(tx) = handle.0.lock().await.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}

type ClientRow = (Uuid, String, String, DateTime<Utc>, DateTime<Utc>);

type AccountRow = (
    Uuid,
    Decimal,
    DateTime<Utc>,
    DateTime<Utc>,
    Uuid,
    String,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

// =========================================================================
// Clients
// =========================================================================

pub struct PgClientRepository {
    tx: PgTx,
}

impl PgClientRepository {
    pub fn new(tx: PgTx) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl ClientGateway for PgClientRepository {
    async fn get(&self, id: Uuid) -> Result<Client, StoreError> {
        let mut guard = self.tx.0.lock().await;
        let tx = guard.as_mut().ok_or(StoreError::ScopeClosed)?;

        let row: Option<ClientRow> = sqlx::query_as(
            r#"
            SELECT id, name, email, created_at, updated_at
            FROM clients
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        let (id, name, email, created_at, updated_at) =
            row.ok_or_else(|| StoreError::not_found("client", id))?;

        Ok(Client {
            id,
            name,
            email,
            created_at,
            updated_at,
        })
    }

    async fn save(&self, client: &Client) -> Result<(), StoreError> {
        let mut guard = self.tx.0.lock().await;
        let tx = guard.as_mut().ok_or(StoreError::ScopeClosed)?;

        sqlx::query(
            r#"
            INSERT INTO clients (id, name, email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(client.id)
        .bind(&client.name)
        .bind(&client.email)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

// =========================================================================
// Accounts
// =========================================================================

pub struct PgAccountRepository {
    tx: PgTx,
}

impl PgAccountRepository {
    pub fn new(tx: PgTx) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl AccountGateway for PgAccountRepository {
    async fn save(&self, account: &Account) -> Result<(), StoreError> {
        let mut guard = self.tx.0.lock().await;
        let tx = guard.as_mut().ok_or(StoreError::ScopeClosed)?;

        sqlx::query(
            r#"
            INSERT INTO accounts (id, client_id, balance, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(account.id())
        .bind(account.client().id)
        .bind(account.balance().value())
        .bind(account.created_at())
        .bind(account.updated_at())
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Account, StoreError> {
        let mut guard = self.tx.0.lock().await;
        let tx = guard.as_mut().ok_or(StoreError::ScopeClosed)?;

        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT a.id, a.balance, a.created_at, a.updated_at,
                   c.id, c.name, c.email, c.created_at, c.updated_at
            FROM accounts a
            JOIN clients c ON c.id = a.client_id
            WHERE a.id = $1
            FOR UPDATE OF a
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        let (
            id,
            balance,
            created_at,
            updated_at,
            client_id,
            name,
            email,
            client_created_at,
            client_updated_at,
        ) = row.ok_or_else(|| StoreError::not_found("account", id))?;

        let balance = Balance::new(balance)
            .map_err(|e| StoreError::Corrupt(format!("account {}: {}", id, e)))?;
        let client = Client {
            id: client_id,
            name,
            email,
            created_at: client_created_at,
            updated_at: client_updated_at,
        };

        Ok(Account::from_db_state(
            id,
            Arc::new(client),
            balance,
            created_at,
            updated_at,
        ))
    }

    async fn update_balance(&self, account: &Account) -> Result<(), StoreError> {
        let mut guard = self.tx.0.lock().await;
        let tx = guard.as_mut().ok_or(StoreError::ScopeClosed)?;

        let rows_affected = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(account.id())
        .bind(account.balance().value())
        .bind(account.updated_at())
        .execute(&mut **tx)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::not_found("account", account.id()));
        }

        Ok(())
    }
}

// =========================================================================
// Transactions
// =========================================================================

pub struct PgTransactionRepository {
    tx: PgTx,
}

impl PgTransactionRepository {
    pub fn new(tx: PgTx) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl TransactionGateway for PgTransactionRepository {
    async fn create(&self, transaction: &Transaction) -> Result<(), StoreError> {
        let mut guard = self.tx.0.lock().await;
        let tx = guard.as_mut().ok_or(StoreError::ScopeClosed)?;

        sqlx::query(
            r#"
            INSERT INTO transactions (id, account_id_from, account_id_to, amount, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(transaction.id())
        .bind(transaction.account_id_from())
        .bind(transaction.account_id_to())
        .bind(transaction.amount().value())
        .bind(transaction.created_at())
        .execute(&mut **tx)
        .await?;

        tracing::debug!(
            transaction_id = %transaction.id(),
            "Transaction row staged"
        );

        Ok(())
    }
}
