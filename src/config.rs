//! Scoring configuration
//!
//! Every threshold the engine uses lives here. The defaults are the fixed
//! constants that make scores comparable across deployments; overriding them
//! produces scores that are no longer comparable with default-configured ones.

use crate::error::ScoreError;
use serde::{Deserialize, Serialize};

/// Thresholds and weights for one scoring call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    // Event detection
    /// Acceleration magnitude for a hard brake (m/s²).
    pub hard_brake_threshold: f64,
    /// Consecutive samples above the brake threshold (~300 ms at 50 Hz).
    pub hard_brake_min_samples: usize,
    /// Acceleration magnitude for a hard acceleration (m/s²).
    pub hard_accel_threshold: f64,
    /// Samples skipped after a hard acceleration.
    pub hard_accel_skip_samples: usize,
    /// Yaw rate for a harsh corner (deg/s).
    pub harsh_corner_threshold_dps: f64,
    /// Samples skipped after a harsh corner.
    pub harsh_corner_skip_samples: usize,
    /// Fallback speed limit applied everywhere (km/h).
    pub fallback_speed_limit_kmh: f64,
    /// Tolerance above the limit before time counts as speeding (km/h).
    pub speeding_buffer_kmh: f64,

    // Trip validity
    pub min_distance_km: f64,
    pub min_duration_minutes: f64,
    pub min_avg_speed_kmh: f64,
    /// Largest stationary share of the trip (0-1).
    pub max_idle_ratio: f64,
    /// Speed at or above which a sample counts as moving (km/h).
    pub min_moving_speed_kmh: f64,
    /// Implied speed between fixes treated as a GPS jump (m/s).
    pub max_plausible_speed_mps: f64,
    pub min_inertial_samples: usize,

    // Penalties
    /// Distance unit penalties are expressed against (km).
    pub penalty_distance_km: f64,
    pub penalty_hard_brake: f64,
    pub penalty_hard_accel: f64,
    pub penalty_harsh_corner: f64,
    /// Multiplier on the speeding fraction (0-1).
    pub penalty_speeding_multiplier: f64,
    pub penalty_phone_per_minute: f64,

    /// Reject input whose samples are not in chronological order.
    pub require_chronological_order: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            hard_brake_threshold: 3.5,
            hard_brake_min_samples: 15,
            hard_accel_threshold: 3.0,
            hard_accel_skip_samples: 10,
            harsh_corner_threshold_dps: 25.0,
            harsh_corner_skip_samples: 10,
            fallback_speed_limit_kmh: 50.0,
            speeding_buffer_kmh: 5.0,

            min_distance_km: 2.0,
            min_duration_minutes: 8.0,
            min_avg_speed_kmh: 12.0,
            max_idle_ratio: 0.3,
            min_moving_speed_kmh: 5.0,
            max_plausible_speed_mps: 100.0,
            min_inertial_samples: 10,

            penalty_distance_km: 10.0,
            penalty_hard_brake: 1.5,
            penalty_hard_accel: 1.0,
            penalty_harsh_corner: 1.0,
            penalty_speeding_multiplier: 6.0,
            penalty_phone_per_minute: 0.5,

            require_chronological_order: false,
        }
    }
}

impl ScoringConfig {
    /// Load a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ScoreError> {
        let config: ScoringConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ScoreError> {
        serde_json::to_string_pretty(self).map_err(ScoreError::JsonError)
    }

    /// Speed above which a sample counts as speeding (km/h)
    pub fn speeding_threshold_kmh(&self) -> f64 {
        self.fallback_speed_limit_kmh + self.speeding_buffer_kmh
    }

    /// Reject thresholds that would make the pipeline meaningless.
    pub fn validate(&self) -> Result<(), ScoreError> {
        let positive = [
            ("hard_brake_threshold", self.hard_brake_threshold),
            ("hard_accel_threshold", self.hard_accel_threshold),
            ("harsh_corner_threshold_dps", self.harsh_corner_threshold_dps),
            ("fallback_speed_limit_kmh", self.fallback_speed_limit_kmh),
            ("max_plausible_speed_mps", self.max_plausible_speed_mps),
            ("penalty_distance_km", self.penalty_distance_km),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ScoreError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        let non_negative = [
            ("speeding_buffer_kmh", self.speeding_buffer_kmh),
            ("min_distance_km", self.min_distance_km),
            ("min_duration_minutes", self.min_duration_minutes),
            ("min_avg_speed_kmh", self.min_avg_speed_kmh),
            ("min_moving_speed_kmh", self.min_moving_speed_kmh),
            ("penalty_hard_brake", self.penalty_hard_brake),
            ("penalty_hard_accel", self.penalty_hard_accel),
            ("penalty_harsh_corner", self.penalty_harsh_corner),
            ("penalty_speeding_multiplier", self.penalty_speeding_multiplier),
            ("penalty_phone_per_minute", self.penalty_phone_per_minute),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ScoreError::InvalidConfig(format!(
                    "{name} must be zero or positive, got {value}"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.max_idle_ratio) {
            return Err(ScoreError::InvalidConfig(format!(
                "max_idle_ratio must be within 0-1, got {}",
                self.max_idle_ratio
            )));
        }

        if self.hard_brake_min_samples == 0 {
            return Err(ScoreError::InvalidConfig(
                "hard_brake_min_samples must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
