//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

use super::AmountError;

/// Business rule violations detected before any state is mutated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Invalid amount (zero, negative, too precise, or exceeds limit)
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Source balance does not cover the transfer
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Decimal, available: Decimal },

    /// Crediting would push the balance past the maximum
    #[error("balance overflow")]
    BalanceOverflow,

    /// Transfer to same account
    #[error("cannot transfer to the same account")]
    SameAccountTransfer,

    #[error("invalid name")]
    InvalidName,

    #[error("invalid email")]
    InvalidEmail,
}

impl DomainError {
    pub fn insufficient_funds(required: Decimal, available: Decimal) -> Self {
        Self::InsufficientFunds {
            required,
            available,
        }
    }
}

impl From<AmountError> for DomainError {
    fn from(err: AmountError) -> Self {
        match err {
            AmountError::Overflow => Self::BalanceOverflow,
            other => Self::InvalidAmount(other.to_string()),
        }
    }
}
