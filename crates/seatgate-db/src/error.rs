//! Database-specific error types and conversions.

use seatgate_core::error::SeatgateError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Unexpected stored value: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for SeatgateError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => SeatgateError::NotFound { entity, id },
            other => SeatgateError::Storage(other.to_string()),
        }
    }
}
