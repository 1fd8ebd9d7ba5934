//! HTTP route handlers.

pub mod accreditations;
pub mod bulk_import;
pub mod health;
pub mod projects;
pub mod scans;
