//! Trip validity gate
//!
//! Decides whether a trip is eligible for scoring at all. Every check runs
//! regardless of earlier failures so the driver sees all reasons at once.

use crate::config::ScoringConfig;
use crate::geo::distance_between;
use crate::types::{
    InertialSample, LocationSample, TripMetrics, ValidationCode, ValidationIssue, ValidationResult,
};

/// Validator applying the fixed eligibility checklist
pub struct TripValidator;

impl TripValidator {
    /// Run every check in order and collect all failures.
    pub fn validate(
        metrics: &TripMetrics,
        locations: &[LocationSample],
        inertial: &[InertialSample],
        config: &ScoringConfig,
    ) -> ValidationResult {
        let mut issues = Vec::new();

        if metrics.distance_km < config.min_distance_km {
            issues.push(issue(
                ValidationCode::TooShortDistance,
                format!("Drive at least {} km.", config.min_distance_km),
            ));
        }

        if metrics.duration_minutes < config.min_duration_minutes {
            issues.push(issue(
                ValidationCode::TooShortTime,
                format!("Drive at least {} minutes.", config.min_duration_minutes),
            ));
        }

        if metrics.avg_speed_kmh < config.min_avg_speed_kmh {
            issues.push(issue(
                ValidationCode::LowAvgSpeed,
                format!(
                    "Average speed must be at least {} km/h.",
                    config.min_avg_speed_kmh
                ),
            ));
        }

        if let Some(idle) = idle_ratio(metrics) {
            if idle > config.max_idle_ratio {
                issues.push(issue(
                    ValidationCode::ExcessiveIdle,
                    "Trip mostly stationary; try a normal moving trip.".to_string(),
                ));
            }
        }

        if find_teleport(locations, config.max_plausible_speed_mps).is_some() {
            issues.push(issue(
                ValidationCode::GpsTeleport,
                "GPS jumped; wait for stable signal before starting.".to_string(),
            ));
        }

        if inertial.len() < config.min_inertial_samples {
            issues.push(issue(
                ValidationCode::LowSensorQuality,
                "Enable Location + Motion; keep phone stable.".to_string(),
            ));
        }

        ValidationResult::from_issues(issues)
    }
}

fn issue(code: ValidationCode, message: String) -> ValidationIssue {
    ValidationIssue { code, message }
}

/// Stationary share of the trip, undefined for a zero-length trip
pub fn idle_ratio(metrics: &TripMetrics) -> Option<f64> {
    if metrics.duration_minutes <= 0.0 {
        return None;
    }
    Some(1.0 - metrics.moving_time_minutes / metrics.duration_minutes)
}

/// Index of the first fix reached at an implausible speed.
///
/// A fix that moved while reporting no elapsed time is treated as a jump.
pub fn find_teleport(locations: &[LocationSample], max_speed_mps: f64) -> Option<usize> {
    locations
        .windows(2)
        .position(|pair| {
            let distance_m = distance_between(&pair[0], &pair[1]);
            let elapsed_s = (pair[1].timestamp as f64 - pair[0].timestamp as f64) / 1000.0;
            if elapsed_s <= 0.0 {
                distance_m > 0.0
            } else {
                distance_m / elapsed_s > max_speed_mps
            }
        })
        .map(|i| i + 1)
}
