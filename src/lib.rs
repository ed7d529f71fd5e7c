//! Trip Safety - deterministic driver-safety scoring for phone telemetry
//!
//! Turns the location and inertial samples of one driving trip into a validity
//! verdict and, for valid trips, a 0-10 safety score with a per-category
//! breakdown:
//!
//! chunks → trip metrics → validity gate → event detectors → penalties → score → summary
//!
//! An invalid trip is never scored: it comes back with score 0 and every
//! reason it failed. The engine keeps no state between calls.

pub mod adapter;
pub mod config;
pub mod detectors;
pub mod encoder;
pub mod error;
pub mod geo;
pub mod metrics;
pub mod normalizer;
pub mod pipeline;
pub mod summary;
pub mod types;
pub mod validation;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::ScoringConfig;
pub use error::ScoreError;
pub use pipeline::{score_chunks_json, score_trip, validate_chunks_json, SafetyScorer};
pub use summary::summarize;
pub use types::{
    SafetyScoreResult, ScoreReport, TelemetryChunk, Trip, TripSummary, ValidationCode,
    ValidationResult,
};

/// Engine version embedded in every report
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for score reports
pub const PRODUCER_NAME: &str = "trip-safety";
