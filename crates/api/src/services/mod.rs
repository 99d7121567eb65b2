//! Services used by the API layer: account authentication and the FCM push
//! transport.

pub mod auth;
pub mod fcm;

pub use auth::{AuthError, AuthService, BloodBankSession, UserSession};
pub use fcm::FcmPushTransport;
