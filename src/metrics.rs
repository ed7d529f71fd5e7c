//! Trip metrics aggregation
//!
//! Reduces the ordered location sequence of a trip to distance, duration,
//! speed statistics and moving time.

use crate::config::ScoringConfig;
use crate::geo::distance_between;
use crate::types::{LocationSample, TripMetrics};

const MS_PER_MINUTE: f64 = 60_000.0;

/// Aggregator for trip-level metrics
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// Compute metrics for a chronological location sequence.
    ///
    /// Fewer than two fixes cannot describe any movement, so the result is
    /// all-zero and the validity gate rejects the trip.
    pub fn aggregate(locations: &[LocationSample], config: &ScoringConfig) -> TripMetrics {
        if locations.len() < 2 {
            return TripMetrics::default();
        }

        let distance_m: f64 = locations
            .windows(2)
            .map(|pair| distance_between(&pair[0], &pair[1]))
            .sum();

        let first = locations[0].timestamp;
        let last = locations[locations.len() - 1].timestamp;
        let duration_minutes = last.saturating_sub(first) as f64 / MS_PER_MINUTE;

        let moving_time_ms: i64 = locations
            .windows(2)
            .filter(|pair| pair[1].speed_kmh() >= config.min_moving_speed_kmh)
            .map(|pair| elapsed_ms(&pair[0], &pair[1]))
            .fold(0i64, i64::saturating_add);

        let speeds = locations.iter().map(LocationSample::speed_kmh);
        let avg_speed_kmh = speeds.clone().sum::<f64>() / locations.len() as f64;
        let max_speed_kmh = speeds.fold(f64::MIN, f64::max);

        TripMetrics {
            distance_km: distance_m / 1000.0,
            duration_minutes,
            avg_speed_kmh,
            max_speed_kmh,
            moving_time_minutes: moving_time_ms as f64 / MS_PER_MINUTE,
        }
    }
}

/// Time between two consecutive fixes (ms); a backwards step counts as zero.
/// Saturates on corrupt timestamps.
pub(crate) fn elapsed_ms(previous: &LocationSample, current: &LocationSample) -> i64 {
    current.timestamp.saturating_sub(previous.timestamp).max(0)
}
