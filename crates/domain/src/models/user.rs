//! User domain model.
//!
//! A user is either a donor or a doctor. The identity fields are shared and
//! the role-specific fields live in [`UserProfile`], whose variant is the
//! role. The role never changes after registration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::blood_type::BloodType;
use super::location::GeoPoint;
use crate::error::{DomainError, DomainResult};

/// User role, derived from the profile variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Donor,
    Doctor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Donor => "donor",
            Role::Doctor => "doctor",
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "donor" => Ok(Role::Donor),
            "doctor" => Ok(Role::Doctor),
            other => Err(DomainError::validation(format!("Unknown role: {}", other))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Donor availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonorStatus {
    #[default]
    Available,
    Unavailable,
}

impl DonorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonorStatus::Available => "available",
            DonorStatus::Unavailable => "unavailable",
        }
    }
}

impl FromStr for DonorStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(DonorStatus::Available),
            "unavailable" => Ok(DonorStatus::Unavailable),
            other => Err(DomainError::validation(format!(
                "Invalid donor status: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DonorProfile {
    pub blood_type: BloodType,
    pub status: DonorStatus,
    pub location: GeoPoint,
    pub medical_history: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoctorProfile {
    pub hospital: String,
    pub national_id: Option<String>,
    pub license_number: Option<String>,
}

/// Role-specific attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum UserProfile {
    Donor(DonorProfile),
    Doctor(DoctorProfile),
}

impl UserProfile {
    pub fn role(&self) -> Role {
        match self {
            UserProfile::Donor(_) => Role::Donor,
            UserProfile::Doctor(_) => Role::Doctor,
        }
    }

    /// Builds the profile for a registration request, enforcing the fields
    /// each role requires: a blood type for donors, a hospital for doctors.
    pub fn from_registration(request: &RegisterUserRequest) -> DomainResult<Self> {
        match request.role {
            Role::Donor => {
                let blood_type = request.blood_type.ok_or_else(|| {
                    DomainError::validation("Blood type is required for donors")
                })?;
                let location = match (request.latitude, request.longitude) {
                    (Some(lat), Some(lon)) => GeoPoint::new(lat, lon)?,
                    (None, None) => GeoPoint::origin(),
                    _ => {
                        return Err(DomainError::validation(
                            "Latitude and longitude must be provided together",
                        ))
                    }
                };
                Ok(UserProfile::Donor(DonorProfile {
                    blood_type,
                    status: DonorStatus::Available,
                    location,
                    medical_history: request.medical_history.clone().unwrap_or_default(),
                }))
            }
            Role::Doctor => {
                let hospital = request
                    .hospital
                    .as_deref()
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| DomainError::validation("Hospital is required for doctors"))?;
                Ok(UserProfile::Doctor(DoctorProfile {
                    hospital: hospital.to_string(),
                    national_id: request.national_id.clone(),
                    license_number: request.license_number.clone(),
                }))
            }
        }
    }
}

/// A registered donor or doctor.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub push_token: Option<String>,
    pub profile: UserProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn as_donor(&self) -> Option<&DonorProfile> {
        match &self.profile {
            UserProfile::Donor(d) => Some(d),
            UserProfile::Doctor(_) => None,
        }
    }

    pub fn as_doctor(&self) -> Option<&DoctorProfile> {
        match &self.profile {
            UserProfile::Doctor(d) => Some(d),
            UserProfile::Donor(_) => None,
        }
    }

    pub fn blood_type(&self) -> Option<BloodType> {
        self.as_donor().map(|d| d.blood_type)
    }
}

/// Data needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub profile: UserProfile,
}

/// Request payload for registering a donor or doctor.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    pub name: String,

    #[validate(email(message = "A valid email is required"))]
    pub email: String,

    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: String,

    #[validate(length(min = 5, max = 30, message = "Phone must be 5-30 characters"))]
    pub phone: String,

    pub role: Role,

    pub blood_type: Option<BloodType>,

    #[validate(length(max = 200, message = "Hospital must be at most 200 characters"))]
    pub hospital: Option<String>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,

    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be between -180 and 180"
    ))]
    pub longitude: Option<f64>,

    #[validate(length(max = 2000, message = "Medical history must be at most 2000 characters"))]
    pub medical_history: Option<String>,

    pub national_id: Option<String>,

    pub license_number: Option<String>,
}

/// Request payload for email/password login (users and blood banks).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request payload for a donor location update.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationRequest {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: f64,

    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be between -180 and 180"
    ))]
    pub longitude: f64,
}

/// Request payload for a donor availability update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDonorStatusRequest {
    pub status: DonorStatus,
}

/// Public representation of a user. The password hash and push token are
/// never exposed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<BloodType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DonorStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hospital: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    pub has_push_token: bool,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        let role = u.role();
        let mut response = Self {
            id: u.id,
            name: u.name,
            email: u.email,
            phone: u.phone,
            role,
            blood_type: None,
            status: None,
            location: None,
            medical_history: None,
            hospital: None,
            national_id: None,
            license_number: None,
            has_push_token: u.push_token.is_some(),
            is_active: u.is_active,
            last_login_at: u.last_login_at,
            created_at: u.created_at,
        };

        match u.profile {
            UserProfile::Donor(d) => {
                response.blood_type = Some(d.blood_type);
                response.status = Some(d.status);
                response.location = Some(d.location);
                response.medical_history = Some(d.medical_history);
            }
            UserProfile::Doctor(d) => {
                response.hospital = Some(d.hospital);
                response.national_id = d.national_id;
                response.license_number = d.license_number;
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(json: &str) -> RegisterUserRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_donor_requires_blood_type() {
        let req = registration(
            r#"{"name":"Awa","email":"awa@example.com","password":"Secret1","phone":"+237600000000","role":"donor"}"#,
        );
        let err = UserProfile::from_registration(&req).unwrap_err();
        assert!(err.to_string().contains("Blood type is required"));
    }

    #[test]
    fn test_donor_profile_defaults() {
        let req = registration(
            r#"{"name":"Awa","email":"awa@example.com","password":"Secret1","phone":"+237600000000","role":"donor","bloodType":"O-","latitude":4.05,"longitude":9.7}"#,
        );
        let profile = UserProfile::from_registration(&req).unwrap();
        assert_eq!(profile.role(), Role::Donor);
        match profile {
            UserProfile::Donor(d) => {
                assert_eq!(d.blood_type, BloodType::ONegative);
                assert_eq!(d.status, DonorStatus::Available);
                assert_eq!(d.location.latitude, 4.05);
                assert!(d.medical_history.is_empty());
            }
            UserProfile::Doctor(_) => panic!("expected donor profile"),
        }
    }

    #[test]
    fn test_donor_half_coordinates_rejected() {
        let req = registration(
            r#"{"name":"Awa","email":"awa@example.com","password":"Secret1","phone":"+237600000000","role":"donor","bloodType":"A+","latitude":4.05}"#,
        );
        assert!(matches!(
            UserProfile::from_registration(&req),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_doctor_requires_hospital() {
        let req = registration(
            r#"{"name":"Dr Mbarga","email":"doc@example.com","password":"Secret1","phone":"+237600000001","role":"doctor","hospital":"   "}"#,
        );
        let err = UserProfile::from_registration(&req).unwrap_err();
        assert!(err.to_string().contains("Hospital is required"));
    }

    #[test]
    fn test_doctor_profile_trims_hospital() {
        let req = registration(
            r#"{"name":"Dr Mbarga","email":"doc@example.com","password":"Secret1","phone":"+237600000001","role":"doctor","hospital":" Central ","licenseNumber":"LIC-9"}"#,
        );
        match UserProfile::from_registration(&req).unwrap() {
            UserProfile::Doctor(d) => {
                assert_eq!(d.hospital, "Central");
                assert_eq!(d.license_number.as_deref(), Some("LIC-9"));
            }
            UserProfile::Donor(_) => panic!("expected doctor profile"),
        }
    }

    #[test]
    fn test_register_request_validation() {
        let req = registration(
            r#"{"name":"A","email":"not-an-email","password":"123","phone":"1","role":"donor"}"#,
        );
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("phone"));
    }

    #[test]
    fn test_donor_status_parse() {
        assert_eq!("available".parse::<DonorStatus>().unwrap(), DonorStatus::Available);
        assert!("busy".parse::<DonorStatus>().is_err());
        let req: UpdateDonorStatusRequest =
            serde_json::from_str(r#"{"status":"unavailable"}"#).unwrap();
        assert_eq!(req.status, DonorStatus::Unavailable);
    }

    #[test]
    fn test_user_response_hides_secrets() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Awa".into(),
            email: "awa@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            phone: "+237600000000".into(),
            is_active: true,
            last_login_at: None,
            push_token: Some("device-token".into()),
            profile: UserProfile::Donor(DonorProfile {
                blood_type: BloodType::APositive,
                status: DonorStatus::Available,
                location: GeoPoint::origin(),
                medical_history: String::new(),
            }),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&UserResponse::from(user)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("device-token"));
        assert!(json.contains("\"role\":\"donor\""));
        assert!(json.contains("\"bloodType\":\"A+\""));
        assert!(json.contains("\"hasPushToken\":true"));
        assert!(!json.contains("hospital"));
    }
}
