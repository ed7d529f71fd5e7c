//! Pipeline orchestration
//!
//! This module provides the public API for trip scoring. It runs the stages in
//! one direction:
//!
//! chunks → metrics → validity gate → (valid only) detectors → penalties → score
//!
//! Scoring is a pure function of the trip and the configuration. A
//! [`SafetyScorer`] holds nothing but immutable configuration and can be shared
//! freely between threads.

use crate::adapter::{check_chronological_order, parse_trip};
use crate::config::ScoringConfig;
use crate::detectors::EventDetector;
use crate::encoder::ReportEncoder;
use crate::error::ScoreError;
use crate::metrics::MetricsAggregator;
use crate::normalizer::PenaltyNormalizer;
use crate::types::{
    EventSummary, PenaltyBreakdown, SafetyScoreResult, ScoreReport, Trip, ValidityReport,
};
use crate::validation::TripValidator;
use tracing::{debug, info, warn};

/// Score a trip with the default configuration.
///
/// Chunks and the samples inside them must already be in chronological order.
///
/// # Example
/// ```ignore
/// let result = score_trip(&trip);
/// if result.is_valid() {
///     println!("score {}", result.total_score);
/// }
/// ```
pub fn score_trip(trip: &Trip) -> SafetyScoreResult {
    SafetyScorer::new().evaluate(trip)
}

/// Parse chunk JSON, score it with the default configuration, and return the
/// report JSON.
///
/// # Arguments
/// * `chunks_json` - JSON array of telemetry chunks (or `{"chunks": [...]}`)
///
/// # Returns
/// Pretty-printed [`ScoreReport`] JSON
pub fn score_chunks_json(chunks_json: String) -> Result<String, ScoreError> {
    SafetyScorer::new().process_json(&chunks_json)
}

/// Parse chunk JSON and return only the validity verdict as JSON.
pub fn validate_chunks_json(chunks_json: String) -> Result<String, ScoreError> {
    let scorer = SafetyScorer::new();
    let trip = parse_trip(&chunks_json)?;
    let report = scorer.validate(&trip)?;
    serde_json::to_string_pretty(&report).map_err(|e| ScoreError::EncodingError(e.to_string()))
}

/// Stateless scorer bound to one configuration.
#[derive(Debug, Clone)]
pub struct SafetyScorer {
    config: ScoringConfig,
    encoder: ReportEncoder,
}

impl Default for SafetyScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyScorer {
    /// Create a scorer with the default thresholds
    pub fn new() -> Self {
        Self {
            config: ScoringConfig::default(),
            encoder: ReportEncoder::new(),
        }
    }

    /// Create a scorer with custom thresholds
    pub fn with_config(config: ScoringConfig) -> Result<Self, ScoreError> {
        config.validate()?;
        Ok(Self {
            config,
            encoder: ReportEncoder::new(),
        })
    }

    /// Replace the report encoder (e.g. to pin the instance id)
    pub fn with_encoder(mut self, encoder: ReportEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a trip.
    ///
    /// Only fails when chronological order is required and violated; an
    /// ineligible trip is a normal result with `is_valid == false`.
    pub fn score(&self, trip: &Trip) -> Result<SafetyScoreResult, ScoreError> {
        self.check_order(trip)?;
        Ok(self.evaluate(trip))
    }

    /// Run the metrics and validity stages only
    pub fn validate(&self, trip: &Trip) -> Result<ValidityReport, ScoreError> {
        self.check_order(trip)?;
        let locations = trip.locations();
        let inertial = trip.inertial();
        let trip_metrics = MetricsAggregator::aggregate(&locations, &self.config);
        let validation = TripValidator::validate(&trip_metrics, &locations, &inertial, &self.config);
        Ok(ValidityReport {
            trip_metrics,
            validation,
        })
    }

    /// Score a trip and wrap the result in a report
    pub fn report(&self, trip: &Trip) -> Result<ScoreReport, ScoreError> {
        let result = self.score(trip)?;
        Ok(self.encoder.encode(trip, result))
    }

    /// Parse chunk JSON, score it, and return the report JSON
    pub fn process_json(&self, chunks_json: &str) -> Result<String, ScoreError> {
        let trip = parse_trip(chunks_json)?;
        let result = self.score(&trip)?;
        self.encoder.encode_to_json(&trip, result)
    }

    fn check_order(&self, trip: &Trip) -> Result<(), ScoreError> {
        if self.config.require_chronological_order {
            check_chronological_order(trip)?;
        }
        Ok(())
    }

    fn evaluate(&self, trip: &Trip) -> SafetyScoreResult {
        let locations = trip.locations();
        let inertial = trip.inertial();

        info!(
            chunks = trip.chunks.len(),
            location_samples = locations.len(),
            inertial_samples = inertial.len(),
            "Calculating safety score"
        );

        // Stage 1: Aggregate trip metrics
        let trip_metrics = MetricsAggregator::aggregate(&locations, &self.config);
        debug!(?trip_metrics, "Trip metrics computed");

        // Stage 2: Validity gate
        let validation = TripValidator::validate(&trip_metrics, &locations, &inertial, &self.config);
        if !validation.is_valid {
            warn!(codes = ?validation.codes(), "Trip rejected by validity gate");
            return SafetyScoreResult {
                total_score: 0.0,
                score_breakdown: PenaltyBreakdown::default(),
                events: EventSummary::default(),
                trip_metrics,
                validation,
            };
        }

        // Stage 3: Detect events
        let detection = EventDetector::detect(&trip.chunks, &locations, &inertial, &self.config);
        debug!(
            hard_brakes = detection.hard_brakes.len(),
            hard_accelerations = detection.hard_accelerations.len(),
            harsh_corners = detection.harsh_corners.len(),
            speeding_fraction = detection.speeding.fraction,
            phone_use_minutes = detection.phone_use_minutes,
            "Driving events detected"
        );

        // Stage 4: Normalize penalties and compose the score
        let score_breakdown = PenaltyNormalizer::normalize(&trip_metrics, &detection, &self.config);
        let total_score = PenaltyNormalizer::compose_score(&score_breakdown);
        let events = PenaltyNormalizer::summarize_events(&detection);

        info!(score = total_score, "Safety score calculated");

        SafetyScoreResult {
            total_score,
            score_breakdown,
            events,
            trip_metrics,
            validation,
        }
    }
}
