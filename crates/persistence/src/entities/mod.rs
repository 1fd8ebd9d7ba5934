//! Entity definitions (database row mappings).

pub mod accreditation;
pub mod project;
pub mod scan_log;

pub use accreditation::{AccreditationEntity, AccreditationStatusDb, IdentificationTypeDb};
pub use project::ProjectEntity;
pub use scan_log::ScanLogEntity;

use thiserror::Error;

/// A row that cannot be mapped into its domain model.
///
/// Table constraints make these unreachable in practice; surfacing them
/// as errors keeps the mapping honest instead of panicking.
#[derive(Debug, Error)]
pub enum EntityError {
    #[error("accreditation {0} has inconsistent identification columns")]
    InconsistentIdentification(uuid::Uuid),
    #[error("scan log {0} carries unknown phase name {1:?}")]
    UnknownPhase(uuid::Uuid, String),
}
