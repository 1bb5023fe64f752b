//! Storage adapters
//!
//! A `TransactionalStore` hands out transaction handles; repositories built
//! from the same handle share one commit/rollback boundary.

mod error;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage engine able to open, commit and roll back transactions.
///
/// `Handle` is cloned into every repository of one scope, so it must be a
/// cheap shared reference to the underlying transaction.
#[async_trait]
pub trait TransactionalStore: Send + Sync + 'static {
    type Handle: Clone + Send + Sync + 'static;

    async fn begin(&self) -> Result<Self::Handle, StoreError>;

    async fn commit(&self, handle: Self::Handle) -> Result<(), StoreError>;

    async fn rollback(&self, handle: Self::Handle) -> Result<(), StoreError>;
}
