//! Telemetry adapter
//!
//! Parses uploaded chunk JSON into typed chunks and assembles a trip. Chunks
//! from collectors that capture the accelerometer and gyroscope separately
//! carry two raw streams, which are joined into inertial samples here.

use crate::error::ScoreError;
use crate::types::{InertialSample, TelemetryChunk, Trip, Vector3};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Largest timestamp difference (ms) tolerated between joined sensor readings
pub const STREAM_JOIN_TOLERANCE_MS: i64 = 10;

/// Accepted top-level layouts for a trip upload
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TripPayload {
    Chunks(Vec<Value>),
    Envelope {
        #[serde(default, alias = "sessionId")]
        session_id: Option<String>,
        chunks: Vec<Value>,
    },
}

/// Parse a JSON array of chunks, or an object with a `chunks` array, into a trip.
///
/// A session id on the envelope is copied onto chunks that lack one.
pub fn parse_trip(json: &str) -> Result<Trip, ScoreError> {
    let payload: TripPayload = serde_json::from_str(json)
        .map_err(|e| ScoreError::ParseError(format!("Failed to parse trip chunks: {e}")))?;

    let (session_id, raw_chunks) = match payload {
        TripPayload::Chunks(chunks) => (None, chunks),
        TripPayload::Envelope { session_id, chunks } => (session_id, chunks),
    };

    let chunks = raw_chunks
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            let mut chunk = parse_chunk(index, raw)?;
            if chunk.session_id.is_none() {
                chunk.session_id = session_id.clone();
            }
            Ok(chunk)
        })
        .collect::<Result<Vec<_>, ScoreError>>()?;

    Ok(Trip::new(chunks))
}

/// Decode one chunk, joining `accelerometer`/`gyroscope` streams when present.
fn parse_chunk(index: usize, mut raw: Value) -> Result<TelemetryChunk, ScoreError> {
    let (accelerometer, gyroscope) = match raw.as_object_mut() {
        Some(fields) => (fields.remove("accelerometer"), fields.remove("gyroscope")),
        None => (None, None),
    };

    let mut chunk: TelemetryChunk = serde_json::from_value(raw)
        .map_err(|e| ScoreError::ParseError(format!("Failed to parse chunk {index}: {e}")))?;

    if accelerometer.is_none() && gyroscope.is_none() {
        return Ok(chunk);
    }
    if !chunk.inertial.is_empty() {
        return Err(ScoreError::StreamMismatch(format!(
            "chunk {index} carries both joined inertial samples and raw sensor streams"
        )));
    }

    let accelerometer = parse_stream(index, "accelerometer", accelerometer)?;
    let gyroscope = parse_stream(index, "gyroscope", gyroscope)?;
    chunk.inertial = join_inertial_streams(&accelerometer, &gyroscope)?;
    Ok(chunk)
}

fn parse_stream(
    index: usize,
    name: &str,
    raw: Option<Value>,
) -> Result<Vec<AxisReading>, ScoreError> {
    match raw {
        Some(value) => serde_json::from_value(value).map_err(|e| {
            ScoreError::ParseError(format!("Failed to parse {name} of chunk {index}: {e}"))
        }),
        None => Ok(Vec::new()),
    }
}

/// Fail on the first sample whose timestamp goes backwards.
///
/// Equal timestamps are allowed; collectors emit duplicate fixes.
pub fn check_chronological_order(trip: &Trip) -> Result<(), ScoreError> {
    let locations = trip.locations();
    check_stream("location", locations.iter().map(|s| s.timestamp))?;
    let inertial = trip.inertial();
    check_stream("inertial", inertial.iter().map(|s| s.timestamp))?;
    check_stream("chunk", trip.chunks.iter().map(|c| c.start_time))
}

fn check_stream(
    stream: &'static str,
    timestamps: impl Iterator<Item = i64>,
) -> Result<(), ScoreError> {
    let mut previous: Option<i64> = None;
    for (index, timestamp_ms) in timestamps.enumerate() {
        if let Some(previous_ms) = previous {
            if timestamp_ms < previous_ms {
                return Err(ScoreError::UnorderedSamples {
                    stream,
                    index,
                    timestamp_ms,
                    previous_ms,
                });
            }
        }
        previous = Some(timestamp_ms);
    }
    Ok(())
}

/// One reading from a single three-axis sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisReading {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub timestamp: i64,
}

impl AxisReading {
    fn vector(&self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// Join accelerometer and gyroscope streams sample-by-sample.
///
/// The collector must deliver both streams on a shared clock: equal lengths
/// and matching timestamps (within [`STREAM_JOIN_TOLERANCE_MS`]) at every
/// index. Anything else is rejected rather than guessed at.
pub fn join_inertial_streams(
    accelerometer: &[AxisReading],
    gyroscope: &[AxisReading],
) -> Result<Vec<InertialSample>, ScoreError> {
    if accelerometer.len() != gyroscope.len() {
        return Err(ScoreError::StreamMismatch(format!(
            "accelerometer has {} samples, gyroscope has {}",
            accelerometer.len(),
            gyroscope.len()
        )));
    }

    accelerometer
        .iter()
        .zip(gyroscope)
        .enumerate()
        .map(|(index, (accel, gyro))| {
            let drift_ms = accel.timestamp.abs_diff(gyro.timestamp);
            if drift_ms > STREAM_JOIN_TOLERANCE_MS.unsigned_abs() {
                return Err(ScoreError::StreamMismatch(format!(
                    "sample {index}: accelerometer at {} ms, gyroscope at {} ms",
                    accel.timestamp, gyro.timestamp
                )));
            }
            Ok(InertialSample {
                acceleration: accel.vector(),
                angular_rate: gyro.vector(),
                timestamp: accel.timestamp,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LocationSample;
    use pretty_assertions::assert_eq;

    fn collector_json() -> &'static str {
        r#"[
            {
                "sessionId": "sess-42",
                "chunkIndex": 0,
                "startTime": 1700000000000,
                "endTime": 1700000060000,
                "gpsData": [
                    { "lat": 40.0, "lng": -74.0, "speed": 10.0, "heading": 90.0, "accuracy": 4.0, "timestamp": 1700000000000 },
                    { "lat": 40.0001, "lng": -74.0, "speed": 11.0, "heading": 90.0, "accuracy": 4.0, "timestamp": 1700000001000 }
                ],
                "imuData": [
                    { "accelerometer": { "x": 0.1, "y": 0.2, "z": 0.3 }, "gyroscope": { "x": 0.0, "y": 0.0, "z": 0.5 }, "timestamp": 1700000000000 }
                ],
                "phoneInteractionDetected": true,
                "deviceFlags": { "isScreenOn": true, "batteryLevel": 0.8, "networkType": "wifi" }
            }
        ]"#
    }

    #[test]
    fn test_parse_collector_layout() {
        let trip = parse_trip(collector_json()).unwrap();
        assert_eq!(trip.chunks.len(), 1);

        let chunk = &trip.chunks[0];
        assert_eq!(chunk.session_id.as_deref(), Some("sess-42"));
        assert_eq!(chunk.chunk_index, Some(0));
        assert!(chunk.phone_interaction);
        assert_eq!(chunk.locations.len(), 2);
        assert_eq!(chunk.locations[1].latitude, 40.0001);
        assert_eq!(chunk.inertial[0].angular_rate.z, 0.5);
        assert_eq!(
            chunk.device_flags.as_ref().and_then(|f| f.network_type.as_deref()),
            Some("wifi")
        );
    }

    #[test]
    fn test_parse_envelope_layout() {
        let json = r#"{
            "session_id": "sess-7",
            "chunks": [
                { "start_time": 0, "end_time": 1000, "locations": [], "inertial": [] },
                { "session_id": "other", "start_time": 1000, "end_time": 2000 }
            ]
        }"#;
        let trip = parse_trip(json).unwrap();

        assert_eq!(trip.chunks[0].session_id.as_deref(), Some("sess-7"));
        assert_eq!(trip.chunks[1].session_id.as_deref(), Some("other"));
        assert!(!trip.chunks[1].phone_interaction);
    }

    #[test]
    fn test_parse_empty_array() {
        let trip = parse_trip("[]").unwrap();
        assert!(trip.chunks.is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_trip("{\"chunks\": 5}"),
            Err(ScoreError::ParseError(_))
        ));
    }

    fn fix(timestamp: i64) -> LocationSample {
        LocationSample {
            latitude: 0.0,
            longitude: 0.0,
            speed: 0.0,
            heading: 0.0,
            accuracy: 5.0,
            timestamp,
        }
    }

    #[test]
    fn test_order_check_accepts_duplicates() {
        let chunk = TelemetryChunk {
            locations: vec![fix(0), fix(1000), fix(1000), fix(2000)],
            ..Default::default()
        };
        assert!(check_chronological_order(&Trip::new(vec![chunk])).is_ok());
    }

    #[test]
    fn test_order_check_across_chunks() {
        let first = TelemetryChunk {
            start_time: 0,
            end_time: 5000,
            locations: vec![fix(0), fix(5000)],
            ..Default::default()
        };
        let second = TelemetryChunk {
            start_time: 5000,
            end_time: 9000,
            locations: vec![fix(4000)],
            ..Default::default()
        };
        let err = check_chronological_order(&Trip::new(vec![first, second])).unwrap_err();
        match err {
            ScoreError::UnorderedSamples { stream, index, .. } => {
                assert_eq!(stream, "location");
                assert_eq!(index, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_joins_separate_sensor_streams() {
        let json = r#"[{
            "startTime": 0,
            "endTime": 60000,
            "accelerometer": [
                { "x": -4.0, "y": 0.0, "z": 0.0, "timestamp": 0 },
                { "x": 0.2, "y": 0.0, "z": 0.0, "timestamp": 20 }
            ],
            "gyroscope": [
                { "x": 0.0, "y": 0.0, "z": 0.5, "timestamp": 1 },
                { "x": 0.0, "y": 0.0, "z": 0.1, "timestamp": 21 }
            ]
        }]"#;
        let trip = parse_trip(json).unwrap();
        let inertial = &trip.chunks[0].inertial;

        assert_eq!(inertial.len(), 2);
        assert_eq!(inertial[0].acceleration, Vector3::new(-4.0, 0.0, 0.0));
        assert_eq!(inertial[0].angular_rate.z, 0.5);
        assert_eq!(inertial[1].timestamp, 20);
    }

    #[test]
    fn test_parse_rejects_unpaired_sensor_streams() {
        let json = r#"[{
            "startTime": 0,
            "endTime": 60000,
            "accelerometer": [{ "x": 1.0, "y": 0.0, "z": 0.0, "timestamp": 0 }]
        }]"#;
        assert!(matches!(
            parse_trip(json),
            Err(ScoreError::StreamMismatch(_))
        ));
    }

    #[test]
    fn test_parse_rejects_joined_and_raw_inertial_together() {
        let json = r#"[{
            "startTime": 0,
            "endTime": 60000,
            "imuData": [
                { "accelerometer": { "x": 0.1, "y": 0.0, "z": 0.0 }, "gyroscope": { "x": 0.0, "y": 0.0, "z": 0.0 }, "timestamp": 0 }
            ],
            "accelerometer": [{ "x": 1.0, "y": 0.0, "z": 0.0, "timestamp": 0 }],
            "gyroscope": [{ "x": 0.0, "y": 0.0, "z": 0.0, "timestamp": 0 }]
        }]"#;
        assert!(matches!(
            parse_trip(json),
            Err(ScoreError::StreamMismatch(_))
        ));
    }

    fn readings(timestamps: &[i64], z: f64) -> Vec<AxisReading> {
        timestamps
            .iter()
            .map(|t| AxisReading {
                x: 0.0,
                y: 0.0,
                z,
                timestamp: *t,
            })
            .collect()
    }

    #[test]
    fn test_join_aligned_streams() {
        let accel = readings(&[0, 20, 40], 1.0);
        let gyro = readings(&[2, 21, 45], 0.3);
        let joined = join_inertial_streams(&accel, &gyro).unwrap();

        assert_eq!(joined.len(), 3);
        assert_eq!(joined[2].timestamp, 40);
        assert_eq!(joined[2].acceleration.z, 1.0);
        assert_eq!(joined[2].angular_rate.z, 0.3);
    }

    #[test]
    fn test_join_rejects_length_mismatch() {
        let accel = readings(&[0, 20, 40], 1.0);
        let gyro = readings(&[0, 20], 0.3);
        assert!(matches!(
            join_inertial_streams(&accel, &gyro),
            Err(ScoreError::StreamMismatch(_))
        ));
    }

    #[test]
    fn test_join_rejects_drift() {
        let accel = readings(&[0, 20, 40], 1.0);
        let gyro = readings(&[0, 20, 60], 0.3);
        assert!(join_inertial_streams(&accel, &gyro).is_err());
    }

    #[test]
    fn test_join_extreme_timestamps() {
        let accel = readings(&[i64::MIN], 1.0);
        let gyro = readings(&[i64::MAX], 0.3);
        assert!(matches!(
            join_inertial_streams(&accel, &gyro),
            Err(ScoreError::StreamMismatch(_))
        ));
    }
}
