//! Domain layer for the accreditation backend.
//!
//! This crate contains:
//! - Domain models (Project, AccreditationRecord, ScanLog)
//! - Business logic services (CSV import, lifecycle transitions, scan validation)
//! - Domain error types

pub mod models;
pub mod services;
