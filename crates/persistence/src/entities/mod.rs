//! Database entity definitions.
//!
//! Entities are direct mappings to database rows. Enum columns are stored
//! as TEXT and parsed on conversion to domain models.

pub mod alert;
pub mod blood_bank;
pub mod notification;
pub mod user;

pub use alert::{AlertEntity, AlertResponseEntity};
pub use blood_bank::BloodBankEntity;
pub use notification::NotificationEntity;
pub use user::UserEntity;

use domain::DomainError;
use uuid::Uuid;

/// Error for a row that violates the domain model.
pub(crate) fn corrupt(table: &str, id: Uuid, detail: &str) -> DomainError {
    DomainError::Storage(format!("Invalid {} row {}: {}", table, id, detail))
}
