//! Great-circle distance

use crate::types::LocationSample;

/// Mean Earth radius (meters)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two `(latitude, longitude)` pairs in degrees.
pub fn haversine_distance(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = from;
    let (lat2, lon2) = to;

    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    // Clamp guards against a > 1 from rounding on antipodal points
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());
    EARTH_RADIUS_M * c
}

/// Haversine distance in meters between two location fixes
pub fn distance_between(a: &LocationSample, b: &LocationSample) -> f64 {
    haversine_distance((a.latitude, a.longitude), (b.latitude, b.longitude))
}
