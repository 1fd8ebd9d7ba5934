//! Repository implementations for database operations.

pub mod accreditation;
pub mod project;
pub mod scan_log;

pub use accreditation::{AccreditationRepository, NewAccreditation};
pub use project::{NewProject, ProjectRepository, ProjectUpdate};
pub use scan_log::ScanLogRepository;
