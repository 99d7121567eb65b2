//! Common validation utilities.

use validator::ValidationError;

/// Largest search radius accepted anywhere in the API, in kilometres.
/// Half of Earth's circumference, so any point is reachable.
pub const MAX_RADIUS_KM: f64 = 20_038.0;

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}

/// Validates a latitude/longitude pair.
pub fn validate_coordinates(lat: f64, lon: f64) -> Result<(), ValidationError> {
    validate_latitude(lat)?;
    validate_longitude(lon)
}

/// Validates a search radius: finite, strictly positive and at most
/// [`MAX_RADIUS_KM`].
pub fn validate_radius_km(radius_km: f64) -> Result<(), ValidationError> {
    if radius_km.is_finite() && radius_km > 0.0 && radius_km <= MAX_RADIUS_KM {
        Ok(())
    } else {
        let mut err = ValidationError::new("radius_range");
        err.message = Some("Radius must be a positive number of kilometres".into());
        Err(err)
    }
}

/// Returns the human-readable message of a validation error.
pub fn message_of(err: &ValidationError) -> String {
    err.message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| err.code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_latitude_bounds() {
        assert!(validate_latitude(0.0).is_ok());
        assert!(validate_latitude(90.0).is_ok());
        assert!(validate_latitude(-90.0).is_ok());
        assert!(validate_latitude(90.0001).is_err());
        assert!(validate_latitude(-91.0).is_err());
    }

    #[test]
    fn test_validate_longitude_bounds() {
        assert!(validate_longitude(180.0).is_ok());
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(180.5).is_err());
    }

    #[test]
    fn test_validate_coordinates_reports_latitude_first() {
        let err = validate_coordinates(100.0, 500.0).unwrap_err();
        assert_eq!(err.code, "latitude_range");
    }

    #[test]
    fn test_validate_radius() {
        assert!(validate_radius_km(10.0).is_ok());
        assert!(validate_radius_km(MAX_RADIUS_KM).is_ok());
        assert!(validate_radius_km(0.0).is_err());
        assert!(validate_radius_km(-5.0).is_err());
        assert!(validate_radius_km(f64::NAN).is_err());
        assert!(validate_radius_km(f64::INFINITY).is_err());
    }

    #[test]
    fn test_message_of() {
        let err = validate_longitude(200.0).unwrap_err();
        assert_eq!(message_of(&err), "Longitude must be between -180 and 180");

        let bare = ValidationError::new("custom_code");
        assert_eq!(message_of(&bare), "custom_code");
    }
}
