//! Geographic coordinates.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A WGS84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a point, rejecting out-of-range coordinates.
    pub fn new(latitude: f64, longitude: f64) -> DomainResult<Self> {
        shared::validation::validate_coordinates(latitude, longitude)
            .map_err(|e| DomainError::Validation(shared::validation::message_of(&e)))?;
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// The null island point used when no location has been reported yet.
    pub const fn origin() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
        }
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(p: GeoPoint) -> Self {
        // geo uses (x, y) = (longitude, latitude)
        geo::Point::new(p.longitude, p.latitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_range() {
        assert!(GeoPoint::new(48.85, 2.35).is_ok());
        assert!(matches!(
            GeoPoint::new(91.0, 0.0),
            Err(DomainError::Validation(_))
        ));
        assert!(GeoPoint::new(0.0, -181.0).is_err());
    }

    #[test]
    fn test_into_geo_point_axis_order() {
        let p: geo::Point<f64> = GeoPoint::new(4.05, 9.7).unwrap().into();
        assert_eq!(p.x(), 9.7);
        assert_eq!(p.y(), 4.05);
    }

    #[test]
    fn test_camel_case_serialization() {
        let json = serde_json::to_string(&GeoPoint::origin()).unwrap();
        assert_eq!(json, r#"{"latitude":0.0,"longitude":0.0}"#);
    }
}
