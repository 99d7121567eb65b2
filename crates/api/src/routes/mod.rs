//! HTTP route handlers.

pub mod alerts;
pub mod auth;
pub mod blood_banks;
pub mod donors;
pub mod health;
pub mod notifications;
