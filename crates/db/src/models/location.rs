use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::types::{Coordinates, LocationId, TenantId};
use sqlx::types::Json;
use sqlx::FromRow;

/// Check-in radius applied when a location does not specify one.
pub const DEFAULT_CHECK_IN_RADIUS_METERS: f64 = 100.0;

/// Location database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Location {
    pub tenant_id: TenantId,
    pub id: LocationId,
    pub name: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub check_in_radius_meters: f64,
    pub extra: Option<Json<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Location {
    /// Stored coordinates, when both components are present.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinates::new_unchecked(lat, lng)),
            _ => None,
        }
    }
}

/// Input for creating a new location
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLocation {
    pub tenant_id: TenantId,
    pub name: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub check_in_radius_meters: f64,
    pub extra: Option<serde_json::Value>,
}

/// Input for updating a location; absent fields are unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLocation {
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub check_in_radius_meters: Option<f64>,
    pub extra: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_coordinates_require_both_components() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut location = Location {
            tenant_id: TenantId::from("tnt_1"),
            id: LocationId::from("loc_1"),
            name: "Main studio".to_string(),
            address: None,
            latitude: Some(30.2672),
            longitude: Some(-97.7431),
            check_in_radius_meters: DEFAULT_CHECK_IN_RADIUS_METERS,
            extra: None,
            created_at: now,
            updated_at: now,
        };
        assert!(location.coordinates().is_some());

        location.longitude = None;
        assert!(location.coordinates().is_none());
    }
}
