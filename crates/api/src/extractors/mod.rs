//! Custom Axum extractors.
//!
//! Resolve the verified token claims to the stored principal.

pub mod principal;

pub use principal::{BloodBankAuth, DoctorAuth, DonorAuth, Principal, UserAuth};
