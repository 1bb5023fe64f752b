//! Domain Events
//!
//! Notifications emitted after a transfer commits. The set of events is
//! closed: each name carries exactly one payload shape.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Event name, used as the dispatcher registry key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventName {
    TransactionCreated,
    BalanceUpdated,
}

impl EventName {
    pub const ALL: [EventName; 2] = [EventName::TransactionCreated, EventName::BalanceUpdated];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::TransactionCreated => "TransactionCreated",
            EventName::BalanceUpdated => "BalanceUpdated",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transaction was recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCreated {
    pub id: Uuid,
    pub account_id_from: Uuid,
    pub account_id_to: Uuid,
    pub amount: Decimal,
}

/// Both sides of a transfer have new balances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceUpdated {
    pub account_id_from: Uuid,
    pub account_id_to: Uuid,
    pub balance_account_id_from: Decimal,
    pub balance_account_id_to: Decimal,
}

/// Payload, tagged by event name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventPayload {
    TransactionCreated(TransactionCreated),
    BalanceUpdated(BalanceUpdated),
}

impl EventPayload {
    pub fn name(&self) -> EventName {
        match self {
            EventPayload::TransactionCreated(_) => EventName::TransactionCreated,
            EventPayload::BalanceUpdated(_) => EventName::BalanceUpdated,
        }
    }
}

/// An event instance. Lives for one dispatch and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    payload: EventPayload,
    occurred_at: DateTime<Utc>,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            payload,
            occurred_at: Utc::now(),
        }
    }

    pub fn transaction_created(payload: TransactionCreated) -> Self {
        Self::new(EventPayload::TransactionCreated(payload))
    }

    pub fn balance_updated(payload: BalanceUpdated) -> Self {
        Self::new(EventPayload::BalanceUpdated(payload))
    }

    pub fn name(&self) -> EventName {
        self.payload.name()
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// Partition key for outbound messages
    pub fn routing_key(&self) -> Uuid {
        match &self.payload {
            EventPayload::TransactionCreated(p) => p.id,
            EventPayload::BalanceUpdated(p) => p.account_id_from,
        }
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Event", 3)?;
        state.serialize_field("name", &self.name())?;
        state.serialize_field("occurred_at", &self.occurred_at)?;
        state.serialize_field("payload", &self.payload)?;
        state.end()
    }
}
