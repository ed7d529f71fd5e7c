//! Driving event detection
//!
//! Each inertial detector is a single forward scan that carries a resume index:
//! once an event fires, the samples it covers are skipped so one sustained
//! manoeuvre is counted once, however long the sensor stays over threshold.
//!
//! Detectors assume the trip already passed the validity gate.

use crate::config::ScoringConfig;
use crate::metrics::elapsed_ms;
use crate::normalizer::round_to_tenth;
use crate::types::{InertialSample, LocationSample, TelemetryChunk};
use serde::{Deserialize, Serialize};

const MS_PER_MINUTE: f64 = 60_000.0;

/// Kind of discrete driving event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    HardBrake,
    HardAcceleration,
    HarshCorner,
}

/// A detected event and the sample window it suppresses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrivingEvent {
    pub kind: EventKind,
    /// Index of the triggering sample
    pub start_index: usize,
    /// First index the scan resumes at
    pub resume_index: usize,
    /// Timestamp of the triggering sample (ms)
    pub timestamp: i64,
    /// Largest reading inside the event (m/s² or deg/s)
    pub peak: f64,
}

impl DrivingEvent {
    fn covers(&self, index: usize) -> bool {
        (self.start_index..self.resume_index).contains(&index)
    }
}

/// Time spent above the speeding threshold
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeedingSummary {
    pub speeding_ms: i64,
    pub total_ms: i64,
    /// speeding_ms / total_ms, zero for an empty trip
    pub fraction: f64,
}

/// Everything the detectors found on one trip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub hard_brakes: Vec<DrivingEvent>,
    pub hard_accelerations: Vec<DrivingEvent>,
    pub harsh_corners: Vec<DrivingEvent>,
    pub speeding: SpeedingSummary,
    pub phone_use_minutes: f64,
}

/// Runs every detector over a validated trip
pub struct EventDetector;

impl EventDetector {
    pub fn detect(
        chunks: &[TelemetryChunk],
        locations: &[LocationSample],
        inertial: &[InertialSample],
        config: &ScoringConfig,
    ) -> DetectionReport {
        let hard_brakes = detect_hard_braking(inertial, config);
        let hard_accelerations = detect_hard_acceleration(inertial, &hard_brakes, config);
        let harsh_corners = detect_harsh_cornering(inertial, config);
        let speeding = detect_speeding(locations, config);
        let phone_use_minutes = phone_interaction_minutes(chunks);

        DetectionReport {
            hard_brakes,
            hard_accelerations,
            harsh_corners,
            speeding,
            phone_use_minutes,
        }
    }
}

/// Fold over `0..len`, asking `detect_at` for an event only at indices the
/// previous event did not cover.
fn scan_with_resume<F>(len: usize, mut detect_at: F) -> Vec<DrivingEvent>
where
    F: FnMut(usize) -> Option<DrivingEvent>,
{
    let (events, _) = (0..len).fold((Vec::new(), 0usize), |(mut events, resume), i| {
        if i < resume {
            return (events, resume);
        }
        match detect_at(i) {
            Some(event) => {
                let next = event.resume_index.max(i + 1);
                events.push(event);
                (events, next)
            }
            None => (events, resume),
        }
    });
    events
}

fn accel_magnitude(sample: &InertialSample) -> f64 {
    sample.acceleration.magnitude()
}

fn yaw_rate_dps(sample: &InertialSample) -> f64 {
    sample.angular_rate.z.abs().to_degrees()
}

/// Hard braking: acceleration magnitude above threshold for a sustained run.
///
/// The whole over-threshold run is consumed by one event, so a 40-sample
/// brake counts once rather than once per fixed 15-sample window.
pub fn detect_hard_braking(samples: &[InertialSample], config: &ScoringConfig) -> Vec<DrivingEvent> {
    let threshold = config.hard_brake_threshold;
    let min_run = config.hard_brake_min_samples;

    scan_with_resume(samples.len(), |i| {
        if accel_magnitude(&samples[i]) <= threshold {
            return None;
        }
        let run_len = samples[i..]
            .iter()
            .take_while(|s| accel_magnitude(s) > threshold)
            .count();
        if run_len < min_run {
            return None;
        }
        let peak = samples[i..i + run_len]
            .iter()
            .map(accel_magnitude)
            .fold(0.0, f64::max);
        Some(DrivingEvent {
            kind: EventKind::HardBrake,
            start_index: i,
            resume_index: i + run_len,
            timestamp: samples[i].timestamp,
            peak,
        })
    })
}

/// Hard acceleration: one over-threshold sample fires, then a fixed skip.
///
/// Samples already claimed by a hard brake are not counted again.
pub fn detect_hard_acceleration(
    samples: &[InertialSample],
    hard_brakes: &[DrivingEvent],
    config: &ScoringConfig,
) -> Vec<DrivingEvent> {
    scan_with_resume(samples.len(), |i| {
        if hard_brakes.iter().any(|b| b.covers(i)) {
            return None;
        }
        let magnitude = accel_magnitude(&samples[i]);
        (magnitude > config.hard_accel_threshold).then(|| DrivingEvent {
            kind: EventKind::HardAcceleration,
            start_index: i,
            resume_index: i + config.hard_accel_skip_samples,
            timestamp: samples[i].timestamp,
            peak: magnitude,
        })
    })
}

/// Harsh cornering: yaw rate (gyro z, converted to deg/s) above threshold.
pub fn detect_harsh_cornering(
    samples: &[InertialSample],
    config: &ScoringConfig,
) -> Vec<DrivingEvent> {
    scan_with_resume(samples.len(), |i| {
        let yaw = yaw_rate_dps(&samples[i]);
        (yaw > config.harsh_corner_threshold_dps).then(|| DrivingEvent {
            kind: EventKind::HarshCorner,
            start_index: i,
            resume_index: i + config.harsh_corner_skip_samples,
            timestamp: samples[i].timestamp,
            peak: yaw,
        })
    })
}

/// Share of elapsed time spent above the fallback limit plus buffer.
pub fn detect_speeding(locations: &[LocationSample], config: &ScoringConfig) -> SpeedingSummary {
    let threshold = config.speeding_threshold_kmh();

    let (speeding_ms, total_ms) = locations
        .windows(2)
        .fold((0i64, 0i64), |(speeding, total), pair| {
            let dt = elapsed_ms(&pair[0], &pair[1]);
            let total = total.saturating_add(dt);
            if pair[1].speed_kmh() > threshold {
                (speeding.saturating_add(dt), total)
            } else {
                (speeding, total)
            }
        });

    let fraction = if total_ms > 0 {
        speeding_ms as f64 / total_ms as f64
    } else {
        0.0
    };

    SpeedingSummary {
        speeding_ms,
        total_ms,
        fraction,
    }
}

/// Minutes covered by chunks flagged for phone interaction, one decimal.
pub fn phone_interaction_minutes(chunks: &[TelemetryChunk]) -> f64 {
    let total_ms: i64 = chunks
        .iter()
        .filter(|c| c.phone_interaction)
        .map(TelemetryChunk::duration_ms)
        .fold(0i64, i64::saturating_add);
    round_to_tenth(total_ms as f64 / MS_PER_MINUTE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::tests::northbound_track;
    use crate::types::Vector3;
    use pretty_assertions::assert_eq;

    fn imu_with_accel(magnitudes: &[f64]) -> Vec<InertialSample> {
        magnitudes
            .iter()
            .enumerate()
            .map(|(i, m)| InertialSample {
                acceleration: Vector3::new(*m, 0.0, 0.0),
                angular_rate: Vector3::default(),
                timestamp: 20 * i as i64,
            })
            .collect()
    }

    fn imu_with_yaw(rates_dps: &[f64]) -> Vec<InertialSample> {
        rates_dps
            .iter()
            .enumerate()
            .map(|(i, r)| InertialSample {
                acceleration: Vector3::default(),
                angular_rate: Vector3::new(0.0, 0.0, r.to_radians()),
                timestamp: 20 * i as i64,
            })
            .collect()
    }

    fn pattern(segments: &[(f64, usize)]) -> Vec<f64> {
        segments
            .iter()
            .flat_map(|(value, count)| std::iter::repeat(*value).take(*count))
            .collect()
    }

    #[test]
    fn test_sustained_brake_counts_once() {
        let samples = imu_with_accel(&pattern(&[(0.0, 10), (4.0, 40), (0.0, 10)]));
        let brakes = detect_hard_braking(&samples, &ScoringConfig::default());

        assert_eq!(brakes.len(), 1);
        assert_eq!(brakes[0].start_index, 10);
        assert_eq!(brakes[0].resume_index, 50);
        assert_eq!(brakes[0].timestamp, 200);
    }

    #[test]
    fn test_short_spike_is_not_brake() {
        let samples = imu_with_accel(&pattern(&[(0.0, 5), (5.0, 14), (0.0, 5)]));
        assert!(detect_hard_braking(&samples, &ScoringConfig::default()).is_empty());
    }

    #[test]
    fn test_brake_run_exactly_minimum() {
        let samples = imu_with_accel(&pattern(&[(4.0, 15), (0.0, 5), (4.0, 15)]));
        let brakes = detect_hard_braking(&samples, &ScoringConfig::default());
        let starts: Vec<usize> = brakes.iter().map(|b| b.start_index).collect();
        assert_eq!(starts, vec![0, 20]);
    }

    #[test]
    fn test_brake_threshold_is_strict() {
        let samples = imu_with_accel(&pattern(&[(3.5, 30)]));
        assert!(detect_hard_braking(&samples, &ScoringConfig::default()).is_empty());
    }

    #[test]
    fn test_brake_peak() {
        let mut values = pattern(&[(4.0, 20)]);
        values[7] = 6.5;
        let brakes = detect_hard_braking(&imu_with_accel(&values), &ScoringConfig::default());
        assert_eq!(brakes[0].peak, 6.5);
    }

    #[test]
    fn test_acceleration_skip_window() {
        // 25 consecutive samples above 3.0 -> fires at 0, 10, 20
        let samples = imu_with_accel(&pattern(&[(3.2, 25), (0.0, 10)]));
        let accels = detect_hard_acceleration(&samples, &[], &ScoringConfig::default());
        let starts: Vec<usize> = accels.iter().map(|a| a.start_index).collect();
        assert_eq!(starts, vec![0, 10, 20]);
    }

    #[test]
    fn test_acceleration_isolated_spikes() {
        let samples = imu_with_accel(&pattern(&[(0.0, 5), (3.1, 1), (0.0, 20), (3.1, 1)]));
        let accels = detect_hard_acceleration(&samples, &[], &ScoringConfig::default());
        assert_eq!(accels.len(), 2);
        assert_eq!(accels[1].start_index, 26);
    }

    #[test]
    fn test_brake_samples_not_counted_as_acceleration() {
        let samples = imu_with_accel(&pattern(&[(0.0, 5), (4.0, 15), (0.0, 5), (3.2, 1)]));
        let config = ScoringConfig::default();
        let brakes = detect_hard_braking(&samples, &config);
        let accels = detect_hard_acceleration(&samples, &brakes, &config);

        assert_eq!(brakes.len(), 1);
        assert_eq!(accels.len(), 1);
        assert_eq!(accels[0].start_index, 25);
    }

    #[test]
    fn test_cornering_converts_rad_to_deg() {
        // 26 deg/s fires, 24 deg/s does not
        let samples = imu_with_yaw(&pattern(&[(24.0, 20), (26.0, 1), (0.0, 20), (-30.0, 1)]));
        let corners = detect_harsh_cornering(&samples, &ScoringConfig::default());

        assert_eq!(corners.len(), 2);
        assert_eq!(corners[0].start_index, 20);
        assert!((corners[1].peak - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_cornering_sustained_turn_dedup() {
        let samples = imu_with_yaw(&pattern(&[(40.0, 15)]));
        let corners = detect_harsh_cornering(&samples, &ScoringConfig::default());
        assert_eq!(corners.len(), 2);
    }

    #[test]
    fn test_speeding_fraction() {
        // 11 fixes one second apart; last 5 intervals at 72 km/h
        let mut track = northbound_track(11, 10.0, 1000, 40.0 / 3.6);
        for fix in track.iter_mut().skip(6) {
            fix.speed = 20.0;
        }
        let speeding = detect_speeding(&track, &ScoringConfig::default());

        assert_eq!(speeding.total_ms, 10_000);
        assert_eq!(speeding.speeding_ms, 5_000);
        assert!((speeding.fraction - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_speeding_buffer_applies() {
        // 54 km/h is over the limit but within the buffer
        let track = northbound_track(5, 10.0, 1000, 54.0 / 3.6);
        assert_eq!(detect_speeding(&track, &ScoringConfig::default()).speeding_ms, 0);
    }

    #[test]
    fn test_speeding_empty_track() {
        let speeding = detect_speeding(&[], &ScoringConfig::default());
        assert_eq!(speeding, SpeedingSummary::default());
    }

    #[test]
    fn test_phone_minutes_from_flagged_chunks() {
        let chunk = |start: i64, minutes: i64, flagged: bool| TelemetryChunk {
            start_time: start,
            end_time: start + minutes * 60_000,
            phone_interaction: flagged,
            ..Default::default()
        };
        let chunks = vec![chunk(0, 5, true), chunk(300_000, 5, false), chunk(600_000, 10, true)];
        assert_eq!(phone_interaction_minutes(&chunks), 15.0);
    }

    #[test]
    fn test_phone_minutes_rounded() {
        let chunks = vec![TelemetryChunk {
            start_time: 0,
            end_time: 100_000,
            phone_interaction: true,
            ..Default::default()
        }];
        // 1.666.. minutes
        assert_eq!(phone_interaction_minutes(&chunks), 1.7);
    }

    #[test]
    fn test_extreme_timestamps_saturate() {
        let mut track = northbound_track(3, 10.0, 1000, 20.0);
        track[0].timestamp = i64::MIN;
        track[1].timestamp = 0;
        track[2].timestamp = i64::MAX;
        let speeding = detect_speeding(&track, &ScoringConfig::default());
        assert_eq!(speeding.total_ms, i64::MAX);
        assert_eq!(speeding.speeding_ms, i64::MAX);
        assert_eq!(speeding.fraction, 1.0);

        let chunks = vec![
            TelemetryChunk {
                start_time: i64::MIN,
                end_time: i64::MAX,
                phone_interaction: true,
                ..Default::default()
            };
            2
        ];
        assert!(phone_interaction_minutes(&chunks).is_finite());
    }

    #[test]
    fn test_detect_runs_all_detectors() {
        let samples = imu_with_accel(&pattern(&[(0.0, 10), (4.0, 20), (0.0, 10)]));
        let report = EventDetector::detect(&[], &[], &samples, &ScoringConfig::default());

        assert_eq!(report.hard_brakes.len(), 1);
        assert!(report.hard_accelerations.is_empty());
        assert!(report.harsh_corners.is_empty());
        assert_eq!(report.phone_use_minutes, 0.0);
    }
}
