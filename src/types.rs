//! Core types for the trip scoring pipeline
//!
//! This module defines the data that flows through each stage: raw telemetry
//! chunks, the assembled trip, derived metrics, the validity verdict and the
//! final score result.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single location fix (~1 Hz)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    /// Latitude in degrees
    #[serde(alias = "lat")]
    pub latitude: f64,
    /// Longitude in degrees
    #[serde(alias = "lng", alias = "lon")]
    pub longitude: f64,
    /// Ground speed (m/s)
    #[serde(default)]
    pub speed: f64,
    /// Course over ground (degrees)
    #[serde(default)]
    pub heading: f64,
    /// Horizontal accuracy (meters)
    #[serde(default)]
    pub accuracy: f64,
    /// Unix timestamp (ms)
    pub timestamp: i64,
}

impl LocationSample {
    /// Speed converted from m/s to km/h
    pub fn speed_kmh(&self) -> f64 {
        self.speed * 3.6
    }
}

/// Three-axis reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// A single inertial sample (~50 Hz)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InertialSample {
    /// Linear acceleration (m/s²)
    #[serde(alias = "accelerometer")]
    pub acceleration: Vector3,
    /// Angular rate (rad/s)
    #[serde(alias = "gyroscope")]
    pub angular_rate: Vector3,
    /// Unix timestamp (ms)
    pub timestamp: i64,
}

/// Device state reported alongside a chunk. Carried for provenance only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceFlags {
    #[serde(default, alias = "isScreenOn")]
    pub is_screen_on: bool,
    #[serde(default, alias = "batteryLevel")]
    pub battery_level: Option<f64>,
    #[serde(default, alias = "networkType")]
    pub network_type: Option<String>,
}

/// One uploaded batch of samples covering a short window of a trip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryChunk {
    /// Session this chunk belongs to
    #[serde(default, alias = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Position of this chunk within the session
    #[serde(default, alias = "chunkIndex", skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<u32>,
    /// Chunk window start (ms)
    #[serde(alias = "startTime")]
    pub start_time: i64,
    /// Chunk window end (ms)
    #[serde(alias = "endTime")]
    pub end_time: i64,
    /// Location fixes, chronological
    #[serde(default, alias = "gpsData")]
    pub locations: Vec<LocationSample>,
    /// Inertial samples, chronological
    #[serde(default, alias = "imuData")]
    pub inertial: Vec<InertialSample>,
    /// Whether the phone was handled during this chunk
    #[serde(default, alias = "phoneInteractionDetected")]
    pub phone_interaction: bool,
    #[serde(default, alias = "deviceFlags", skip_serializing_if = "Option::is_none")]
    pub device_flags: Option<DeviceFlags>,
}

impl TelemetryChunk {
    /// Wall-clock length of the chunk window (ms), never negative
    pub fn duration_ms(&self) -> i64 {
        self.end_time.saturating_sub(self.start_time).max(0)
    }
}

/// The full chronological sequence of chunks for one driving session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub chunks: Vec<TelemetryChunk>,
}

impl Trip {
    pub fn new(chunks: Vec<TelemetryChunk>) -> Self {
        Self { chunks }
    }

    /// All location fixes across chunks, in upload order
    pub fn locations(&self) -> Vec<LocationSample> {
        self.chunks
            .iter()
            .flat_map(|c| c.locations.iter().copied())
            .collect()
    }

    /// All inertial samples across chunks, in upload order
    pub fn inertial(&self) -> Vec<InertialSample> {
        self.chunks
            .iter()
            .flat_map(|c| c.inertial.iter().copied())
            .collect()
    }

    /// First session id found on any chunk
    pub fn session_id(&self) -> Option<&str> {
        self.chunks.iter().find_map(|c| c.session_id.as_deref())
    }
}

/// Aggregate metrics derived from the location sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TripMetrics {
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub avg_speed_kmh: f64,
    pub max_speed_kmh: f64,
    pub moving_time_minutes: f64,
}

/// Reason a trip is not eligible for scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCode {
    TooShortDistance,
    TooShortTime,
    LowAvgSpeed,
    ExcessiveIdle,
    GpsTeleport,
    LowSensorQuality,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCode::TooShortDistance => "too_short_distance",
            ValidationCode::TooShortTime => "too_short_time",
            ValidationCode::LowAvgSpeed => "low_avg_speed",
            ValidationCode::ExcessiveIdle => "excessive_idle",
            ValidationCode::GpsTeleport => "gps_teleport",
            ValidationCode::LowSensorQuality => "low_sensor_quality",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed validity check with a driver-facing message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: ValidationCode,
    pub message: String,
}

/// Outcome of the validity gate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn from_issues(errors: Vec<ValidationIssue>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Codes of every failed check, in check order
    pub fn codes(&self) -> Vec<ValidationCode> {
        self.errors.iter().map(|e| e.code).collect()
    }

    pub fn has(&self, code: ValidationCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }
}

/// Penalty categories, in tie-break order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyCategory {
    HardBraking,
    HardAcceleration,
    HarshCornering,
    Speeding,
    PhoneInteraction,
}

impl PenaltyCategory {
    pub const ALL: [PenaltyCategory; 5] = [
        PenaltyCategory::HardBraking,
        PenaltyCategory::HardAcceleration,
        PenaltyCategory::HarshCornering,
        PenaltyCategory::Speeding,
        PenaltyCategory::PhoneInteraction,
    ];
}

/// Per-category deductions from the maximum score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PenaltyBreakdown {
    pub hard_brakes: f64,
    pub hard_accelerations: f64,
    pub harsh_corners: f64,
    pub speeding_time: f64,
    pub phone_interaction: f64,
}

impl PenaltyBreakdown {
    pub fn get(&self, category: PenaltyCategory) -> f64 {
        match category {
            PenaltyCategory::HardBraking => self.hard_brakes,
            PenaltyCategory::HardAcceleration => self.hard_accelerations,
            PenaltyCategory::HarshCornering => self.harsh_corners,
            PenaltyCategory::Speeding => self.speeding_time,
            PenaltyCategory::PhoneInteraction => self.phone_interaction,
        }
    }

    pub fn total(&self) -> f64 {
        PenaltyCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

/// Raw event counts and percentages behind the penalties
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub hard_brake_count: u32,
    pub hard_accel_count: u32,
    pub harsh_corner_count: u32,
    /// Share of driving time above the speed threshold (0-100, rounded)
    pub speeding_percentage: u32,
    pub phone_use_minutes: f64,
}

/// Complete output of one scoring call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyScoreResult {
    /// Final score (0-10, one decimal)
    pub total_score: f64,
    pub score_breakdown: PenaltyBreakdown,
    pub events: EventSummary,
    pub trip_metrics: TripMetrics,
    pub validation: ValidationResult,
}

impl SafetyScoreResult {
    pub fn is_valid(&self) -> bool {
        self.validation.is_valid
    }
}

/// Validity verdict without scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidityReport {
    pub trip_metrics: TripMetrics,
    pub validation: ValidationResult,
}

/// Human-readable synopsis of a scored trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub summary: String,
    /// Category that cost the most points (hard braking when none did)
    pub primary_category: PenaltyCategory,
    pub recommendation: String,
}

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Where a report's numbers came from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProvenance {
    pub session_id: Option<String>,
    pub chunk_count: usize,
    pub location_samples: usize,
    pub inertial_samples: usize,
    pub computed_at_utc: String,
}

/// Complete scoring report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub provenance: ReportProvenance,
    pub result: SafetyScoreResult,
    pub summary: TripSummary,
}
