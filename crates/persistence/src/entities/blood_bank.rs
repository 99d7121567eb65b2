//! Blood bank entity (database row mapping).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::blood_bank::{BloodBank, Inventory};
use domain::models::{BloodType, GeoPoint};
use domain::DomainError;

use super::corrupt;

/// A blood_banks row joined with its blood_inventory rows, aggregated into
/// a JSON object keyed by blood type.
#[derive(Debug, Clone, FromRow)]
pub struct BloodBankEntity {
    pub id: Uuid,
    pub hospital_name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub password_hash: String,
    pub latitude: f64,
    pub longitude: f64,
    pub is_active: bool,
    pub fcm_token: Option<String>,
    pub inventory: Json<BTreeMap<String, i32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BloodBankEntity> for BloodBank {
    type Error = DomainError;

    fn try_from(entity: BloodBankEntity) -> Result<Self, Self::Error> {
        let counts = entity
            .inventory
            .0
            .iter()
            .map(|(bt, units)| {
                bt.parse::<BloodType>()
                    .map(|bt| (bt, *units))
                    .map_err(|e| corrupt("blood_inventory", entity.id, &e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: entity.id,
            hospital_name: entity.hospital_name,
            address: entity.address,
            phone: entity.phone,
            email: entity.email,
            password_hash: entity.password_hash,
            location: GeoPoint {
                latitude: entity.latitude,
                longitude: entity.longitude,
            },
            is_active: entity.is_active,
            push_token: entity.fcm_token,
            inventory: Inventory::from_counts(counts),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(inventory: &[(&str, i32)]) -> BloodBankEntity {
        BloodBankEntity {
            id: Uuid::new_v4(),
            hospital_name: "Central".to_string(),
            address: "1 Main St".to_string(),
            phone: "+237600000009".to_string(),
            email: "central@example.com".to_string(),
            password_hash: "hash".to_string(),
            latitude: 4.05,
            longitude: 9.7,
            is_active: true,
            fcm_token: None,
            inventory: Json(
                inventory
                    .iter()
                    .map(|(bt, units)| (bt.to_string(), *units))
                    .collect(),
            ),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_inventory_missing_types_default_to_zero() {
        let bank = BloodBank::try_from(entity(&[("O-", 3), ("A+", 12)])).unwrap();
        assert_eq!(bank.inventory.units(BloodType::ONegative), 3);
        assert_eq!(bank.inventory.units(BloodType::APositive), 12);
        assert_eq!(bank.inventory.units(BloodType::BPositive), 0);
        assert_eq!(bank.location.latitude, 4.05);
    }

    #[test]
    fn test_unknown_blood_type_rejected() {
        assert!(matches!(
            BloodBank::try_from(entity(&[("Z+", 1)])),
            Err(DomainError::Storage(_))
        ));
    }
}
