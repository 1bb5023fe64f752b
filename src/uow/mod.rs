//! Unit of Work
//!
//! Opens one transactional scope per logical operation, binds repositories
//! to it, and commits or rolls back the scope as a whole.
//!
//! Repository factories are registered once, one typed slot per repository
//! kind, before the coordinator is shared. A scope only hands out the gateway
//! trait object registered for that kind, so asking for the wrong capability
//! is a compile error rather than a runtime check.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::domain::OperationContext;
use crate::gateway::{AccountGateway, ClientGateway, TransactionGateway};
use crate::store::{StoreError, TransactionalStore};

type Factory<H, R> = Box<dyn Fn(H) -> Arc<R> + Send + Sync>;

/// Repository slots known to the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryKind {
    Accounts,
    Clients,
    Transactions,
}

impl fmt::Display for RepositoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RepositoryKind::Accounts => "accounts",
            RepositoryKind::Clients => "clients",
            RepositoryKind::Transactions => "transactions",
        };
        f.write_str(name)
    }
}

/// Errors raised by the coordinator itself
#[derive(Debug, thiserror::Error)]
pub enum UowError {
    /// No factory registered for this kind; a wiring bug, never retried
    #[error("Unknown repository: {0}")]
    UnknownRepository(RepositoryKind),

    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Store(#[from] StoreError),
}

struct Registry<H> {
    accounts: Option<Factory<H, dyn AccountGateway>>,
    clients: Option<Factory<H, dyn ClientGateway>>,
    transactions: Option<Factory<H, dyn TransactionGateway>>,
}

impl<H> Default for Registry<H> {
    fn default() -> Self {
        Self {
            accounts: None,
            clients: None,
            transactions: None,
        }
    }
}

/// Unit-of-work coordinator over a transactional store
pub struct UnitOfWork<S: TransactionalStore> {
    store: S,
    registry: Registry<S::Handle>,
}

impl<S: TransactionalStore> UnitOfWork<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            registry: Registry::default(),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    pub fn register_accounts<F>(&mut self, factory: F) -> &mut Self
    where
        F: Fn(S::Handle) -> Arc<dyn AccountGateway> + Send + Sync + 'static,
    {
        self.registry.accounts = Some(Box::new(factory));
        self
    }

    pub fn register_clients<F>(&mut self, factory: F) -> &mut Self
    where
        F: Fn(S::Handle) -> Arc<dyn ClientGateway> + Send + Sync + 'static,
    {
        self.registry.clients = Some(Box::new(factory));
        self
    }

    pub fn register_transactions<F>(&mut self, factory: F) -> &mut Self
    where
        F: Fn(S::Handle) -> Arc<dyn TransactionGateway> + Send + Sync + 'static,
    {
        self.registry.transactions = Some(Box::new(factory));
        self
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Run `body` inside a fresh transactional scope.
    ///
    /// Commits when `body` returns `Ok`, rolls back when it returns `Err`.
    /// A failed commit discards the scope and returns the store error.
    /// Cancelling `context` before commit drops `body`, rolls back and
    /// returns `UowError::Cancelled`; after commit it has no effect.
    pub async fn run<'a, T, E, F, Fut>(
        &'a self,
        context: &OperationContext,
        body: F,
    ) -> Result<T, E>
    where
        F: FnOnce(UowScope<'a, S>) -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: From<UowError> + Send,
    {
        if context.is_cancelled() {
            return Err(UowError::Cancelled.into());
        }

        let handle = self.store.begin().await.map_err(UowError::from)?;
        let scope = UowScope {
            handle: handle.clone(),
            registry: &self.registry,
        };

        let outcome = tokio::select! {
            biased;
            _ = context.cancelled() => Err(E::from(UowError::Cancelled)),
            result = body(scope) => result,
        };

        let value = match outcome {
            Ok(value) if !context.is_cancelled() => value,
            Ok(_) => {
                self.discard(handle, context).await;
                return Err(UowError::Cancelled.into());
            }
            Err(err) => {
                self.discard(handle, context).await;
                return Err(err);
            }
        };

        if let Err(err) = self.store.commit(handle.clone()).await {
            tracing::warn!(
                correlation_id = ?context.correlation_id,
                error = %err,
                "Unit of work commit failed"
            );
            self.discard(handle, context).await;
            return Err(UowError::from(err).into());
        }

        tracing::debug!(correlation_id = ?context.correlation_id, "Unit of work committed");
        Ok(value)
    }

    async fn discard(&self, handle: S::Handle, context: &OperationContext) {
        match self.store.rollback(handle).await {
            Ok(()) => {
                tracing::debug!(correlation_id = ?context.correlation_id, "Unit of work rolled back");
            }
            Err(err) => {
                tracing::error!(
                    correlation_id = ?context.correlation_id,
                    error = %err,
                    "Rollback failed"
                );
            }
        }
    }
}

/// Repositories bound to one open transaction
pub struct UowScope<'a, S: TransactionalStore> {
    handle: S::Handle,
    registry: &'a Registry<S::Handle>,
}

impl<'a, S: TransactionalStore> UowScope<'a, S> {
    pub fn accounts(&self) -> Result<Arc<dyn AccountGateway>, UowError> {
        let factory = self
            .registry
            .accounts
            .as_ref()
            .ok_or(UowError::UnknownRepository(RepositoryKind::Accounts))?;
        Ok(factory(self.handle.clone()))
    }

    pub fn clients(&self) -> Result<Arc<dyn ClientGateway>, UowError> {
        let factory = self
            .registry
            .clients
            .as_ref()
            .ok_or(UowError::UnknownRepository(RepositoryKind::Clients))?;
        Ok(factory(self.handle.clone()))
    }

    pub fn transactions(&self) -> Result<Arc<dyn TransactionGateway>, UowError> {
        let factory = self
            .registry
            .transactions
            .as_ref()
            .ok_or(UowError::UnknownRepository(RepositoryKind::Transactions))?;
        Ok(factory(self.handle.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Account, Amount, Client, Transaction};
    use crate::store::memory::{MemoryAccountRepository, MemoryStore};
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn memory_uow(store: MemoryStore) -> UnitOfWork<MemoryStore> {
        store.unit_of_work()
    }

    async fn seed(uow: &UnitOfWork<MemoryStore>, balance: i64) -> Account {
        let client = Client::new("John", "j@j.com").unwrap();
        let mut account = Account::new(Arc::new(client.clone()));
        account.credit(&Amount::from_integer(balance).unwrap()).unwrap();

        let saved = account.clone();
        uow.run(&OperationContext::new(), |scope| async move {
            scope.clients()?.save(&client).await?;
            scope.accounts()?.save(&saved).await?;
            Ok::<_, UowError>(())
        })
        .await
        .unwrap();
        account
    }

    #[tokio::test]
    async fn test_commit_on_success() {
        let store = MemoryStore::new();
        let uow = memory_uow(store.clone());
        let account = seed(&uow, 100).await;

        assert_eq!(store.balance_of(account.id()).await, Some(dec!(100)));
        assert_eq!(store.client_count().await, 1);
    }

    #[tokio::test]
    async fn test_rollback_on_body_error() {
        let store = MemoryStore::new();
        let uow = memory_uow(store.clone());
        let from = seed(&uow, 100).await.id();
        let to = seed(&uow, 100).await.id();

        let result: Result<(), UowError> = uow
            .run(&OperationContext::new(), |scope| async move {
                let accounts = scope.accounts()?;
                let mut a = accounts.find_by_id(from).await?;
                let mut b = accounts.find_by_id(to).await?;
                let transaction = Transaction::new(&mut a, &mut b, dec!(40)).unwrap();
                accounts.update_balance(&a).await?;
                accounts.update_balance(&b).await?;
                scope.transactions()?.create(&transaction).await?;
                // Fails after every write was staged
                accounts.find_by_id(uuid::Uuid::new_v4()).await?;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(UowError::Store(StoreError::NotFound { .. }))));
        assert_eq!(store.balance_of(from).await, Some(dec!(100)));
        assert_eq!(store.balance_of(to).await, Some(dec!(100)));
        assert!(store.transactions().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_repository() {
        let store = MemoryStore::new();
        let mut uow = UnitOfWork::new(store);
        uow.register_accounts(|tx| Arc::new(MemoryAccountRepository::new(tx)));

        let result: Result<(), UowError> = uow
            .run(&OperationContext::new(), |scope| async move {
                scope.accounts()?;
                scope.transactions()?;
                Ok(())
            })
            .await;

        assert!(matches!(
            result,
            Err(UowError::UnknownRepository(RepositoryKind::Transactions))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let uow = memory_uow(MemoryStore::new());
        let context = OperationContext::new();
        context.cancellation().cancel();

        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);

        let result: Result<(), UowError> = uow
            .run(&context, |_scope| async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(UowError::Cancelled)));
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancel_during_body_rolls_back() {
        let store = MemoryStore::new();
        let uow = memory_uow(store.clone());
        let account = seed(&uow, 100).await.id();
        let context = OperationContext::new();
        let cancel = context.cancellation();

        let result: Result<(), UowError> = uow
            .run(&context, |scope| async move {
                let accounts = scope.accounts()?;
                let mut loaded = accounts.find_by_id(account).await?;
                loaded.debit(&Amount::from_integer(100).unwrap()).unwrap();
                accounts.update_balance(&loaded).await?;
                cancel.cancel();
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(UowError::Cancelled)));
        assert_eq!(store.balance_of(account).await, Some(dec!(100)));
    }

    #[tokio::test]
    async fn test_commit_conflict_is_reported() {
        let store = MemoryStore::new();
        let uow = Arc::new(memory_uow(store.clone()));
        let account = seed(&uow, 100).await.id();
        let (read_tx, read_rx) = tokio::sync::oneshot::channel::<()>();
        let (go_tx, go_rx) = tokio::sync::oneshot::channel::<()>();

        // Slow scope reads first, then waits for a competing commit
        let slow = {
            let uow = Arc::clone(&uow);
            tokio::spawn(async move {
                uow.run(&OperationContext::new(), |scope| async move {
                    let accounts = scope.accounts()?;
                    let mut loaded = accounts.find_by_id(account).await?;
                    let _ = read_tx.send(());
                    let _ = go_rx.await;
                    loaded.debit(&Amount::from_integer(70).unwrap()).unwrap();
                    accounts.update_balance(&loaded).await?;
                    Ok::<_, UowError>(())
                })
                .await
            })
        };

        read_rx.await.unwrap();
        uow.run(&OperationContext::new(), |scope| async move {
            let accounts = scope.accounts()?;
            let mut loaded = accounts.find_by_id(account).await?;
            loaded.debit(&Amount::from_integer(70).unwrap()).unwrap();
            accounts.update_balance(&loaded).await?;
            Ok::<_, UowError>(())
        })
        .await
        .unwrap();
        go_tx.send(()).unwrap();

        let result = slow.await.unwrap();
        assert!(matches!(
            result,
            Err(UowError::Store(StoreError::Conflict { .. }))
        ));
        assert_eq!(store.balance_of(account).await, Some(dec!(30)));
    }
}
