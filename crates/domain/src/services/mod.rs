//! Domain services for BloodLink.
//!
//! Services contain business logic that operates on domain models.

pub mod alert_lifecycle;
pub mod geolocation;
pub mod inventory;
pub mod notification;

#[cfg(test)]
pub(crate) mod memory;

pub use alert_lifecycle::{AlertLifecycleService, AlertSettings, Caller};
pub use geolocation::{
    find_donors_within_radius, find_within_radius, haversine_km, sort_by_distance, Locatable,
    WithinRadius, EARTH_RADIUS_KM,
};
pub use inventory::InventoryLedger;
pub use notification::{
    LoggingPushTransport, NotificationDispatcher, PushMessage, PushOutcome, PushTransport,
};
