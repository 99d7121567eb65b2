//! Domain models for BloodLink.

pub mod alert;
pub mod blood_bank;
pub mod blood_type;
pub mod location;
pub mod notification;
pub mod user;

pub use alert::{Alert, AlertResponse, AlertStatus, AlertView, ResponseStatus, Urgency};
pub use blood_bank::{BloodBank, Inventory};
pub use blood_type::BloodType;
pub use location::GeoPoint;
pub use notification::{Notification, NotificationType, Recipient, RecipientKind};
pub use user::{DonorStatus, Role, User, UserProfile};
