//! wallet_core Library
//!
//! Atomic transfers between wallet accounts with post-commit event
//! publishing. Re-exports modules for integration testing and the binary.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod gateway;
pub mod handlers;
pub mod store;
pub mod uow;

pub use config::Config;
pub use domain::{Account, Amount, AmountError, Balance, Client, DomainError, OperationContext};
pub use domain::{Event, EventName, Transaction};
pub use error::AppError;
pub use events::{DispatchReport, EventDispatcher, EventHandler};
pub use store::{MemoryStore, PgStore, StoreError, TransactionalStore};
pub use uow::{UnitOfWork, UowError, UowScope};
