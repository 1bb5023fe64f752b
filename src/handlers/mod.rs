//! Use-case handlers
//!
//! Each handler runs its writes through the unit of work; events are
//! dispatched only after a successful commit.

mod account_handler;
mod client_handler;
mod commands;
mod transaction_handler;


pub use account_handler::CreateAccountHandler;
pub use client_handler::CreateClientHandler;
pub use commands::*;
pub use transaction_handler::CreateTransactionHandler;
