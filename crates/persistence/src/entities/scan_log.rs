//! Scan log entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use domain::models::project::Phase;
use domain::models::scan_log::ScanLog;

use super::EntityError;

/// Database row mapping for the scan_logs table.
#[derive(Debug, Clone, FromRow)]
pub struct ScanLogEntity {
    pub id: Uuid,
    pub accreditation_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub was_valid: bool,
    pub valid_phases: Vec<String>,
    pub scanned_by: Uuid,
    pub scanner_name: Option<String>,
    pub device: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl ScanLogEntity {
    /// Maps the row into the domain model, parsing stored phase names.
    pub fn into_domain(self) -> Result<ScanLog, EntityError> {
        let mut valid_phases = Vec::with_capacity(self.valid_phases.len());
        for name in &self.valid_phases {
            let phase = Phase::from_str(name)
                .map_err(|_| EntityError::UnknownPhase(self.id, name.clone()))?;
            valid_phases.push(phase);
        }

        Ok(ScanLog {
            id: self.id,
            accreditation_id: self.accreditation_id,
            recorded_at: self.recorded_at,
            was_valid: self.was_valid,
            valid_phases,
            scanned_by: self.scanned_by,
            scanner_name: self.scanner_name,
            device: self.device,
            location: self.location,
            notes: self.notes,
        })
    }
}
