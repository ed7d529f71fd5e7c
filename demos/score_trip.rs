//! Score a synthetic 20-minute commute with one hard brake

use trip_safety::types::{InertialSample, LocationSample, TelemetryChunk, Trip, Vector3};
use trip_safety::{summarize, SafetyScorer};

const START_MS: i64 = 1_700_000_000_000;
// ~8.33 m/s (30 km/h) heading north
const STEP_DEG: f64 = 8.333 / 111_195.0;

fn chunk(minute: usize) -> TelemetryChunk {
    let start = START_MS + minute as i64 * 60_000;
    let locations = (0..60)
        .map(|s| LocationSample {
            latitude: 40.0 + (minute * 60 + s) as f64 * STEP_DEG,
            longitude: -73.9,
            speed: 8.333,
            heading: 0.0,
            accuracy: 5.0,
            timestamp: start + s as i64 * 1_000,
        })
        .collect();
    let inertial = (0..50)
        .map(|i| InertialSample {
            acceleration: if minute == 7 && (10..25).contains(&i) {
                Vector3::new(-4.2, 0.0, 0.0)
            } else {
                Vector3::new(0.1, 0.0, 0.0)
            },
            angular_rate: Vector3::default(),
            timestamp: start + i as i64 * 20,
        })
        .collect();

    TelemetryChunk {
        session_id: Some("demo-commute".to_string()),
        chunk_index: Some(minute as u32),
        start_time: start,
        end_time: start + 60_000,
        locations,
        inertial,
        phone_interaction: false,
        device_flags: None,
    }
}

fn main() {
    let trip = Trip::new((0..20).map(chunk).collect());
    let scorer = SafetyScorer::new();

    match scorer.score(&trip) {
        Ok(result) => {
            let summary = summarize(&result);
            println!("{}", summary.summary);
            println!("{}", summary.recommendation);
        }
        Err(e) => eprintln!("Error: {e}"),
    }
}
