//! Penalty normalization and score composition
//!
//! Event counts are normalized per 10 km driven, so the same number of
//! incidents costs more on a short trip than on a long one. Speeding is
//! charged by share of driving time and phone use by the minute.

use crate::config::ScoringConfig;
use crate::detectors::DetectionReport;
use crate::types::{EventSummary, PenaltyBreakdown, TripMetrics};

/// Highest attainable score
pub const MAX_SCORE: f64 = 10.0;

/// Converter from raw detections to penalties and a final score
pub struct PenaltyNormalizer;

impl PenaltyNormalizer {
    /// Compute per-category penalties for a validated trip
    pub fn normalize(
        metrics: &TripMetrics,
        detection: &DetectionReport,
        config: &ScoringConfig,
    ) -> PenaltyBreakdown {
        let distance_units = metrics.distance_km / config.penalty_distance_km;

        PenaltyBreakdown {
            hard_brakes: per_distance(
                detection.hard_brakes.len(),
                distance_units,
                config.penalty_hard_brake,
            ),
            hard_accelerations: per_distance(
                detection.hard_accelerations.len(),
                distance_units,
                config.penalty_hard_accel,
            ),
            harsh_corners: per_distance(
                detection.harsh_corners.len(),
                distance_units,
                config.penalty_harsh_corner,
            ),
            speeding_time: detection.speeding.fraction * config.penalty_speeding_multiplier,
            phone_interaction: detection.phone_use_minutes * config.penalty_phone_per_minute,
        }
    }

    /// Final score: ten minus all penalties, clamped to 0-10, one decimal
    pub fn compose_score(breakdown: &PenaltyBreakdown) -> f64 {
        round_to_tenth((MAX_SCORE - breakdown.total()).clamp(0.0, MAX_SCORE))
    }

    /// Raw counts and percentages that explain the penalties
    pub fn summarize_events(detection: &DetectionReport) -> EventSummary {
        EventSummary {
            hard_brake_count: detection.hard_brakes.len() as u32,
            hard_accel_count: detection.hard_accelerations.len() as u32,
            harsh_corner_count: detection.harsh_corners.len() as u32,
            speeding_percentage: (detection.speeding.fraction * 100.0).round() as u32,
            phone_use_minutes: detection.phone_use_minutes,
        }
    }
}

/// `count / units * weight`, zero when no distance was covered
fn per_distance(count: usize, distance_units: f64, weight: f64) -> f64 {
    if distance_units <= 0.0 || count == 0 {
        return 0.0;
    }
    count as f64 / distance_units * weight
}

/// Round half away from zero to one decimal place
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
