//! Accreditation entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::accreditation::{
    AccreditationRecord, AccreditationStatus, Identification, PhaseAccess, PhaseAccessSet,
};

use super::EntityError;

/// Database enum mapping for the accreditation_status type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "accreditation_status", rename_all = "lowercase")]
pub enum AccreditationStatusDb {
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl From<AccreditationStatus> for AccreditationStatusDb {
    fn from(status: AccreditationStatus) -> Self {
        match status {
            AccreditationStatus::Draft => AccreditationStatusDb::Draft,
            AccreditationStatus::Pending => AccreditationStatusDb::Pending,
            AccreditationStatus::Approved => AccreditationStatusDb::Approved,
            AccreditationStatus::Rejected => AccreditationStatusDb::Rejected,
        }
    }
}

impl From<AccreditationStatusDb> for AccreditationStatus {
    fn from(status: AccreditationStatusDb) -> Self {
        match status {
            AccreditationStatusDb::Draft => AccreditationStatus::Draft,
            AccreditationStatusDb::Pending => AccreditationStatus::Pending,
            AccreditationStatusDb::Approved => AccreditationStatus::Approved,
            AccreditationStatusDb::Rejected => AccreditationStatus::Rejected,
        }
    }
}

/// Database enum mapping for the identification_type type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "identification_type", rename_all = "lowercase")]
pub enum IdentificationTypeDb {
    Qid,
    Passport,
}

/// Database row mapping for the accreditations table.
///
/// Identification is stored as nullable column groups; a table CHECK
/// keeps exactly one group populated for the declared type.
#[derive(Debug, Clone, FromRow)]
pub struct AccreditationEntity {
    pub id: Uuid,
    pub accreditation_number: String,
    pub project_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
    pub job_title: String,
    pub access_group: String,
    pub identification_type: IdentificationTypeDb,
    pub qid_number: Option<String>,
    pub qid_expiry: Option<NaiveDate>,
    pub passport_number: Option<String>,
    pub passport_country: Option<String>,
    pub passport_expiry: Option<NaiveDate>,
    pub hayya_visa_number: Option<String>,
    pub hayya_visa_expiry: Option<NaiveDate>,
    pub bump_in_access: bool,
    pub bump_in_starts_at: Option<DateTime<Utc>>,
    pub bump_in_ends_at: Option<DateTime<Utc>>,
    pub live_access: bool,
    pub live_starts_at: Option<DateTime<Utc>>,
    pub live_ends_at: Option<DateTime<Utc>>,
    pub bump_out_access: bool,
    pub bump_out_starts_at: Option<DateTime<Utc>>,
    pub bump_out_ends_at: Option<DateTime<Utc>>,
    pub status: AccreditationStatusDb,
    pub qr_token: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<Uuid>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub revoked_by: Option<Uuid>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revocation_reason: Option<String>,
}

impl AccreditationEntity {
    /// Maps the row into the domain model, rebuilding the typed
    /// identification from the column groups.
    pub fn into_domain(self) -> Result<AccreditationRecord, EntityError> {
        let identification = match self.identification_type {
            IdentificationTypeDb::Qid => match (self.qid_number.clone(), self.qid_expiry) {
                (Some(number), Some(expiry)) => Identification::Qid { number, expiry },
                _ => return Err(EntityError::InconsistentIdentification(self.id)),
            },
            IdentificationTypeDb::Passport => match (
                self.passport_number.clone(),
                self.passport_country.clone(),
                self.passport_expiry,
                self.hayya_visa_number.clone(),
                self.hayya_visa_expiry,
            ) {
                (
                    Some(number),
                    Some(country),
                    Some(expiry),
                    Some(hayya_visa_number),
                    Some(hayya_visa_expiry),
                ) => Identification::Passport {
                    number,
                    country,
                    expiry,
                    hayya_visa_number,
                    hayya_visa_expiry,
                },
                _ => return Err(EntityError::InconsistentIdentification(self.id)),
            },
        };

        Ok(AccreditationRecord {
            id: self.id,
            accreditation_number: self.accreditation_number,
            project_id: self.project_id,
            first_name: self.first_name,
            last_name: self.last_name,
            organization: self.organization,
            job_title: self.job_title,
            access_group: self.access_group,
            identification,
            access: PhaseAccessSet {
                bump_in: PhaseAccess {
                    enabled: self.bump_in_access,
                    starts_at: self.bump_in_starts_at,
                    ends_at: self.bump_in_ends_at,
                },
                live: PhaseAccess {
                    enabled: self.live_access,
                    starts_at: self.live_starts_at,
                    ends_at: self.live_ends_at,
                },
                bump_out: PhaseAccess {
                    enabled: self.bump_out_access,
                    starts_at: self.bump_out_starts_at,
                    ends_at: self.bump_out_ends_at,
                },
            },
            status: self.status.into(),
            qr_token: self.qr_token,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
            submitted_at: self.submitted_at,
            approved_by: self.approved_by,
            approved_at: self.approved_at,
            rejected_by: self.rejected_by,
            rejected_at: self.rejected_at,
            revoked_by: self.revoked_by,
            revoked_at: self.revoked_at,
            revocation_reason: self.revocation_reason,
        })
    }
}
