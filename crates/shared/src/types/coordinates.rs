use serde::{Deserialize, Serialize};

/// Mean earth radius used for spherical distance, in meters.
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Geographic coordinates (latitude, longitude)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Create new coordinates with validation
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinatesError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinatesError::InvalidLatitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinatesError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Create coordinates without validation (use when data is trusted)
    pub fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Haversine distance to another point in meters, on a sphere of
    /// radius 6 371 000 m.
    pub fn distance_meters(&self, other: &Coordinates) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_METERS * c
    }

    /// Check whether another point lies within `radius_meters` of this one.
    pub fn within_radius(&self, other: &Coordinates, radius_meters: f64) -> bool {
        self.distance_meters(other) <= radius_meters
    }
}

/// Error for invalid coordinates
#[derive(Debug, Clone, thiserror::Error)]
pub enum CoordinatesError {
    #[error("Invalid latitude: {0}. Must be between -90 and 90")]
    InvalidLatitude(f64),
    #[error("Invalid longitude: {0}. Must be between -180 and 180")]
    InvalidLongitude(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coordinates() {
        let coords = Coordinates::new(40.7128, -74.0060).unwrap();
        assert_eq!(coords.latitude, 40.7128);
        assert_eq!(coords.longitude, -74.0060);
    }

    #[test]
    fn test_invalid_latitude() {
        assert!(Coordinates::new(91.0, 0.0).is_err());
        assert!(Coordinates::new(-91.0, 0.0).is_err());
    }

    #[test]
    fn test_invalid_longitude() {
        assert!(Coordinates::new(0.0, 181.0).is_err());
        assert!(Coordinates::new(0.0, -181.0).is_err());
    }

    #[test]
    fn test_distance_calculation() {
        // New York to Los Angeles: approximately 3944 km
        let nyc = Coordinates::new(40.7128, -74.0060).unwrap();
        let la = Coordinates::new(34.0522, -118.2437).unwrap();

        let distance = nyc.distance_meters(&la);
        assert!(distance > 3_900_000.0 && distance < 4_000_000.0);
    }

    #[test]
    fn test_same_point_distance() {
        let point = Coordinates::new(40.7128, -74.0060).unwrap();
        assert!(point.distance_meters(&point) < 0.001);
    }

    #[test]
    fn test_nearby_point_within_default_radius() {
        // Two points in downtown Austin roughly 42 m apart.
        let venue = Coordinates::new(30.2672, -97.7431).unwrap();
        let nearby = Coordinates::new(30.2675, -97.7428).unwrap();

        let distance = venue.distance_meters(&nearby);
        assert!(distance > 30.0 && distance < 60.0);
        assert!(venue.within_radius(&nearby, 100.0));
    }

    #[test]
    fn test_distant_point_outside_radius() {
        let venue = Coordinates::new(30.2672, -97.7431).unwrap();
        let away = Coordinates::new(30.2700, -97.7500).unwrap();

        assert!(venue.distance_meters(&away) > 100.0);
        assert!(!venue.within_radius(&away, 100.0));
    }
}
