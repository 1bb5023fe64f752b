//! Store Errors
//!
//! Error types for storage adapters.

use uuid::Uuid;

/// Errors that can occur while reading or writing through a gateway
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// Write conflicts with a concurrent committed scope
    #[error("Concurrency conflict on {entity} {id}")]
    Conflict { entity: &'static str, id: Uuid },

    /// The transactional scope was already committed or rolled back
    #[error("Transactional scope is closed")]
    ScopeClosed,

    /// Stored data violates a domain invariant
    #[error("Corrupt stored data: {0}")]
    Corrupt(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}
