//! Geofencing: great-circle distance and the "reached its school" rule.

use serde::{Deserialize, Serialize};

use crate::constants::EARTH_MEAN_RADIUS_METERS;

/// WGS84 latitude/longitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Haversine distance in meters.
    pub fn distance_meters(&self, other: &Self) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_MEAN_RADIUS_METERS * c
    }

    /// Both components finite and within their ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Whether a scan taken at `scan` counts as delivered to the school at
/// `school`. Invalid coordinates never count.
pub fn is_final_destination(school: Coordinates, scan: Coordinates, radius_meters: f64) -> bool {
    if !school.is_valid() || !scan.is_valid() {
        return false;
    }
    school.distance_meters(&scan) <= radius_meters
}
