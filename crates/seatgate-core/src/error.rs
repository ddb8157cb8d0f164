//! Error types for the Seatgate system.
//!
//! Quota denials and audit self-check failures are deliberately *not*
//! errors — both are expected operator-facing outcomes and are
//! returned as structured decision values by the service crates.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeatgateError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Identity provider call failed (network, configuration).
    #[error("Identity provider error: {0}")]
    Identity(String),

    /// Persistence failure, surfaced verbatim. The caller is
    /// responsible for retry or user notification.
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type SeatgateResult<T> = Result<T, SeatgateError>;
