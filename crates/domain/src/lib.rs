//! Domain layer for the BloodLink backend.
//!
//! This crate contains:
//! - Domain models (Alert, AlertResponse, User, BloodBank, Notification)
//! - Store ports implemented by the persistence layer
//! - The alert lifecycle engine and the services it orchestrates:
//!   geolocation matching, notification dispatch and the inventory ledger

pub mod error;
pub mod models;
pub mod ports;
pub mod services;

pub use error::{DomainError, DomainResult};
