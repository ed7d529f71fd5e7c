//! Error types for trip safety scoring
//!
//! An invalid trip is not an error: it is reported through
//! [`ValidationResult`](crate::types::ValidationResult). These variants cover
//! input that cannot be turned into a trip at all.

use thiserror::Error;

/// Errors that can occur while preparing or scoring a trip
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("Failed to parse telemetry payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid scoring configuration: {0}")]
    InvalidConfig(String),

    #[error("Out-of-order {stream} sample at index {index}: {timestamp_ms} ms follows {previous_ms} ms")]
    UnorderedSamples {
        stream: &'static str,
        index: usize,
        timestamp_ms: i64,
        previous_ms: i64,
    },

    #[error("Inertial streams cannot be joined: {0}")]
    StreamMismatch(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
