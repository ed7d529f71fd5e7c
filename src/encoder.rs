//! Score report encoding
//!
//! Wraps a score result and its summary in a versioned report carrying
//! producer and provenance metadata, ready to hand to the rewards service.

use crate::error::ScoreError;
use crate::summary::summarize;
use crate::types::{ReportProducer, ReportProvenance, SafetyScoreResult, ScoreReport, Trip};
use crate::{ENGINE_VERSION, PRODUCER_NAME};
use chrono::Utc;
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Encoder for score reports
#[derive(Debug, Clone)]
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Build the report for a scored trip
    pub fn encode(&self, trip: &Trip, result: SafetyScoreResult) -> ScoreReport {
        let producer = ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: ENGINE_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let provenance = ReportProvenance {
            session_id: trip.session_id().map(str::to_string),
            chunk_count: trip.chunks.len(),
            location_samples: trip.chunks.iter().map(|c| c.locations.len()).sum(),
            inertial_samples: trip.chunks.iter().map(|c| c.inertial.len()).sum(),
            computed_at_utc: Utc::now().to_rfc3339(),
        };

        let summary = summarize(&result);

        ScoreReport {
            report_version: REPORT_VERSION.to_string(),
            producer,
            provenance,
            result,
            summary,
        }
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(
        &self,
        trip: &Trip,
        result: SafetyScoreResult,
    ) -> Result<String, ScoreError> {
        let report = self.encode(trip, result);
        serde_json::to_string_pretty(&report).map_err(|e| ScoreError::EncodingError(e.to_string()))
    }
}
