//! Persistence error types

use thiserror::Error;

/// Result type for persistence operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistence layer errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}
