//! Transaction entity
//!
//! Constructing a `Transaction` is the only way a transfer changes balances.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::{Account, Amount, DomainError};

/// A committed movement of money between two accounts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    id: Uuid,
    account_id_from: Uuid,
    account_id_to: Uuid,
    amount: Amount,
    created_at: DateTime<Utc>,
}

impl Transaction {
    /// Validate a transfer and apply it to both accounts.
    ///
    /// Checks run in order: amount, distinct accounts, available funds.
    /// Both new balances are computed before either account is touched, so
    /// an error leaves `from` and `to` exactly as they were.
    pub fn new(from: &mut Account, to: &mut Account, amount: Decimal) -> Result<Self, DomainError> {
        let amount = Amount::new(amount)?;

        if from.id() == to.id() {
            return Err(DomainError::SameAccountTransfer);
        }

        if !from.balance().is_sufficient_for(&amount) {
            return Err(DomainError::insufficient_funds(
                amount.value(),
                from.balance().value(),
            ));
        }

        let from_balance = from.balance().debit(&amount)?;
        let to_balance = to.balance().credit(&amount)?;
        from.set_balance(from_balance);
        to.set_balance(to_balance);

        Ok(Self {
            id: Uuid::new_v4(),
            account_id_from: from.id(),
            account_id_to: to.id(),
            amount,
            created_at: Utc::now(),
        })
    }

    /// Rebuild a transaction from stored state.
    pub fn from_db_state(
        id: Uuid,
        account_id_from: Uuid,
        account_id_to: Uuid,
        amount: Amount,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            account_id_from,
            account_id_to,
            amount,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn account_id_from(&self) -> Uuid {
        self.account_id_from
    }

    pub fn account_id_to(&self) -> Uuid {
        self.account_id_to
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
