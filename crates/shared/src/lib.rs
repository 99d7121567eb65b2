//! Shared utilities for the BloodLink backend.
//!
//! This crate provides functionality used across the other crates:
//! - Password hashing with Argon2id and the account password policy
//! - RS256 JWT issuance and verification for users and blood banks
//! - Validators for coordinates and search radii

pub mod jwt;
pub mod password;
pub mod validation;
