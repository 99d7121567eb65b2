//! Blood bank domain model and its inline inventory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

use super::blood_type::BloodType;
use super::location::GeoPoint;

/// Unit counts per blood type. Every one of the eight types is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory(BTreeMap<BloodType, i32>);

impl Inventory {
    pub fn empty() -> Self {
        Self(BloodType::ALL.into_iter().map(|bt| (bt, 0)).collect())
    }

    /// Builds an inventory from stored rows; types absent from `counts` are zero.
    pub fn from_counts(counts: impl IntoIterator<Item = (BloodType, i32)>) -> Self {
        let mut inventory = Self::empty();
        for (bt, units) in counts {
            inventory.set(bt, units);
        }
        inventory
    }

    pub fn units(&self, blood_type: BloodType) -> i32 {
        self.0.get(&blood_type).copied().unwrap_or(0)
    }

    pub fn set(&mut self, blood_type: BloodType, units: i32) {
        self.0.insert(blood_type, units);
    }

    /// True when at least `quantity` units of `blood_type` are in stock.
    pub fn has_available(&self, blood_type: BloodType, quantity: i32) -> bool {
        self.units(blood_type) >= quantity
    }

    /// Count after applying `delta`, or `None` if it would overflow or go
    /// below zero.
    pub fn adjusted(&self, blood_type: BloodType, delta: i32) -> Option<i32> {
        self.units(blood_type)
            .checked_add(delta)
            .filter(|units| *units >= 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BloodType, i32)> + '_ {
        self.0.iter().map(|(bt, units)| (*bt, *units))
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::empty()
    }
}

/// A blood bank. Authenticates separately from users.
#[derive(Debug, Clone)]
pub struct BloodBank {
    pub id: Uuid,
    pub hospital_name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub password_hash: String,
    pub location: GeoPoint,
    pub is_active: bool,
    pub push_token: Option<String>,
    pub inventory: Inventory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBloodBank {
    pub hospital_name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub password_hash: String,
    pub location: GeoPoint,
}

/// Request payload for blood bank registration.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBloodBankRequest {
    #[validate(length(min = 2, max = 200, message = "Hospital name must be 2-200 characters"))]
    pub hospital_name: String,

    #[validate(length(min = 1, max = 500, message = "Address is required"))]
    pub address: String,

    #[validate(length(min = 5, max = 30, message = "Phone must be 5-30 characters"))]
    pub phone: String,

    #[validate(email(message = "A valid email is required"))]
    pub email: String,

    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: String,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: f64,

    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be between -180 and 180"
    ))]
    pub longitude: f64,
}

/// Public representation of a blood bank. The password hash is never exposed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodBankResponse {
    pub id: Uuid,
    pub hospital_name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub location: GeoPoint,
    pub is_active: bool,
    pub inventory: Inventory,
    pub created_at: DateTime<Utc>,
}

impl From<BloodBank> for BloodBankResponse {
    fn from(b: BloodBank) -> Self {
        Self {
            id: b.id,
            hospital_name: b.hospital_name,
            address: b.address,
            phone: b.phone,
            email: b.email,
            location: b.location,
            is_active: b.is_active,
            inventory: b.inventory,
            created_at: b.created_at,
        }
    }
}

/// Request payload for `PATCH /api/bloodbanks/inventory`. `quantity` is a
/// signed delta added to the current count.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInventoryRequest {
    pub blood_type: BloodType,

    #[validate(range(
        min = -100000,
        max = 100000,
        message = "Quantity must be between -100000 and 100000"
    ))]
    pub quantity: i32,
}

/// Response for inventory reads and updates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryResponse {
    pub hospital_name: String,
    pub address: String,
    pub phone: String,
    pub inventory: Inventory,
}

impl From<&BloodBank> for InventoryResponse {
    fn from(b: &BloodBank) -> Self {
        Self {
            hospital_name: b.hospital_name.clone(),
            address: b.address.clone(),
            phone: b.phone.clone(),
            inventory: b.inventory.clone(),
        }
    }
}

/// A blood bank annotated with its distance from a search center.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyBloodBank {
    pub id: Uuid,
    pub hospital_name: String,
    pub address: String,
    pub phone: String,
    pub location: GeoPoint,
    pub distance_km: f64,
}

/// Query parameters for `GET /api/bloodbanks/nearby`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NearbyBloodBanksQuery {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: f64,

    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be between -180 and 180"
    ))]
    pub longitude: f64,

    #[validate(range(
        exclusive_min = 0.0,
        max = 500.0,
        message = "Max distance must be greater than 0 and at most 500 km"
    ))]
    pub max_distance: Option<f64>,
}
