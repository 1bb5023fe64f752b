//! Use-case inputs and outputs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Client, Transaction};

// =========================================================================
// Create client
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClientInput {
    pub name: String,
    pub email: String,
}

impl CreateClientInput {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClientOutput {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Client> for CreateClientOutput {
    fn from(client: Client) -> Self {
        Self {
            id: client.id,
            name: client.name,
            email: client.email,
            created_at: client.created_at,
            updated_at: client.updated_at,
        }
    }
}

// =========================================================================
// Create account
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountInput {
    pub client_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountOutput {
    pub account_id: Uuid,
}

// =========================================================================
// Create transaction
// =========================================================================

/// Transfer request. `amount` accepts a JSON string or number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionInput {
    pub account_id_from: Uuid,
    pub account_id_to: Uuid,
    pub amount: Decimal,
}

impl CreateTransactionInput {
    pub fn new(account_id_from: Uuid, account_id_to: Uuid, amount: Decimal) -> Self {
        Self {
            account_id_from,
            account_id_to,
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTransactionOutput {
    pub id: Uuid,
    pub account_id_from: Uuid,
    pub account_id_to: Uuid,
    pub amount: Decimal,
}

impl From<&Transaction> for CreateTransactionOutput {
    fn from(transaction: &Transaction) -> Self {
        Self {
            id: transaction.id(),
            account_id_from: transaction.account_id_from(),
            account_id_to: transaction.account_id_to(),
            amount: transaction.amount().value(),
        }
    }
}
