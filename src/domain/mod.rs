//! Domain module
//!
//! Core domain types and business logic.

pub mod account;
pub mod amount;
pub mod client;
pub mod context;
pub mod error;
pub mod events;
pub mod transaction;

pub use account::Account;
pub use amount::{Amount, AmountError, Balance};
pub use client::Client;
pub use context::{Cancellation, OperationContext};
pub use error::DomainError;
pub use events::{BalanceUpdated, Event, EventName, EventPayload, TransactionCreated};
pub use transaction::Transaction;
