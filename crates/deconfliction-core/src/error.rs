//! Typed errors signaled at the API boundary (§7).
//!
//! No error originates from inside the three-stage pipeline itself —
//! degenerate geometry produces an empty result, never an exception.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeconflictError {
    #[error("invalid mission: {reason}")]
    InvalidMission { reason: String },

    #[error("duplicate drone id: {0}")]
    DuplicateDroneId(String),

    #[error("configuration error: {reason}")]
    ConfigurationError { reason: String },
}
