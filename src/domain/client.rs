//! Client entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::DomainError;

/// Owner of one or more accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Create a new client with a fresh id.
    ///
    /// # Errors
    /// - `DomainError::InvalidName` if the name is blank
    /// - `DomainError::InvalidEmail` if the email is blank or has no `@`
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Result<Self, DomainError> {
        let now = Utc::now();
        let client = Self {
            id: Uuid::new_v4(),
            name: name.into().trim().to_string(),
            email: email.into().trim().to_string(),
            created_at: now,
            updated_at: now,
        };
        client.validate()?;
        Ok(client)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidName);
        }
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err(DomainError::InvalidEmail);
        }
        Ok(())
    }
}
