//! Repository implementations for database operations.
//!
//! Each repository implements one of the store ports defined in
//! `domain::ports`.

pub mod alert;
pub mod blood_bank;
pub mod notification;
pub mod user;

pub use alert::AlertRepository;
pub use blood_bank::BloodBankRepository;
pub use notification::NotificationRepository;
pub use user::UserRepository;
