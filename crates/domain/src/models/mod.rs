//! Domain models for the accreditation backend.

pub mod accreditation;
pub mod bulk_import;
pub mod project;
pub mod scan_log;

pub use accreditation::{AccreditationRecord, AccreditationStatus, Identification};
pub use project::{Phase, PhaseWindow, Project};
pub use scan_log::ScanLog;
