//! Great-circle helpers shared by every distance-aware part of the engine.
//!
//! All edge weights, search heuristics, and nearest-node lookups go through
//! [`distance`] so the A* heuristic stays admissible against the edge costs.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance to `other`, in meters.
    pub fn distance_to(&self, other: &Self) -> f64 {
        distance(self.latitude, self.longitude, other.latitude, other.longitude)
    }

    /// Initial bearing towards `other`, in degrees clockwise from north.
    pub fn bearing_to(&self, other: &Self) -> f64 {
        bearing(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// Calculate the haversine distance between two points in meters.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Forward azimuth from point 1 to point 2, normalized to `[0, 360)` degrees.
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    let degrees = x.atan2(y).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if degrees >= 360.0 {
        0.0
    } else {
        degrees
    }
}

/// Project a point `distance_m` meters away along `bearing_deg`.
///
/// Used by fixtures and curation tooling to lay out nodes at known spacing.
pub fn destination_point(origin: Coordinates, distance_m: f64, bearing_deg: f64) -> Coordinates {
    if distance_m.abs() <= f64::EPSILON {
        return origin;
    }

    let angular_distance = distance_m / EARTH_RADIUS_M;
    let theta = bearing_deg.to_radians();
    let phi1 = origin.latitude.to_radians();
    let lambda1 = origin.longitude.to_radians();

    let phi2 = (phi1.sin() * angular_distance.cos()
        + phi1.cos() * angular_distance.sin() * theta.cos())
    .asin();
    let lambda2 = lambda1
        + (theta.sin() * angular_distance.sin() * phi1.cos())
            .atan2(angular_distance.cos() - phi1.sin() * phi2.sin());

    Coordinates::new(phi2.to_degrees(), lambda2.to_degrees())
}
