//! Accreditation record domain models.
//!
//! One record is one person's badge request on a project, carrying their
//! identification, per-phase access grants, and lifecycle state.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use shared::validation::{validate_access_group, validate_qid_number};

use super::project::{Phase, PhaseWindow, Project};

/// Length of a generated QR token.
pub const QR_TOKEN_LENGTH: usize = 32;

/// Lifecycle status of an accreditation record.
///
/// Revocation is not a status: it is metadata stamped on an APPROVED
/// record, so "approved but revoked" stays distinguishable from
/// "approved and live" at scan time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccreditationStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl AccreditationStatus {
    /// Database string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccreditationStatus::Draft => "draft",
            AccreditationStatus::Pending => "pending",
            AccreditationStatus::Approved => "approved",
            AccreditationStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for AccreditationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AccreditationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(AccreditationStatus::Draft),
            "pending" => Ok(AccreditationStatus::Pending),
            "approved" => Ok(AccreditationStatus::Approved),
            "rejected" => Ok(AccreditationStatus::Rejected),
            _ => Err(format!("Unknown accreditation status: {}", s)),
        }
    }
}

/// The declared identification type of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentificationType {
    Qid,
    Passport,
}

impl IdentificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentificationType::Qid => "qid",
            IdentificationType::Passport => "passport",
        }
    }
}

impl std::fmt::Display for IdentificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IdentificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "qid" => Ok(IdentificationType::Qid),
            "passport" => Ok(IdentificationType::Passport),
            _ => Err(format!("Unknown identification type: {}", s)),
        }
    }
}

/// Identification carried by a record: exactly one of the two variants.
///
/// The enum makes the mutual-exclusion invariant structural. An edit that
/// switches type replaces the whole variant, so fields of the previously
/// selected group cannot survive the switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Identification {
    Qid {
        number: String,
        expiry: NaiveDate,
    },
    Passport {
        number: String,
        country: String,
        expiry: NaiveDate,
        hayya_visa_number: String,
        hayya_visa_expiry: NaiveDate,
    },
}

impl Identification {
    /// The declared type of this identification.
    pub fn kind(&self) -> IdentificationType {
        match self {
            Identification::Qid { .. } => IdentificationType::Qid,
            Identification::Passport { .. } => IdentificationType::Passport,
        }
    }

    /// The primary identifier (QID number or passport number).
    pub fn identifier(&self) -> &str {
        match self {
            Identification::Qid { number, .. } => number,
            Identification::Passport { number, .. } => number,
        }
    }

    fn validate_fields(&self) -> Result<(), ValidationError> {
        match self {
            Identification::Qid { number, .. } => validate_qid_number(number),
            Identification::Passport {
                number,
                country,
                hayya_visa_number,
                ..
            } => {
                for (field, value) in [
                    ("passport number", number),
                    ("passport country", country),
                    ("Hayya visa number", hayya_visa_number),
                ] {
                    if value.trim().is_empty() {
                        let mut err = ValidationError::new("identification");
                        err.message = Some(format!("{} is required", field).into());
                        return Err(err);
                    }
                }
                Ok(())
            }
        }
    }
}

/// Access grant for one phase: a flag, plus an optional override window
/// that narrows the project-level window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseAccess {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

impl PhaseAccess {
    /// The override window, if both bounds are set.
    pub fn override_window(&self) -> Option<PhaseWindow> {
        match (self.starts_at, self.ends_at) {
            (Some(starts_at), Some(ends_at)) => Some(PhaseWindow { starts_at, ends_at }),
            _ => None,
        }
    }

    /// The window that applies at scan time: the override if present,
    /// otherwise the project-level window for the phase.
    pub fn effective_window(&self, project_window: &PhaseWindow) -> PhaseWindow {
        self.override_window().unwrap_or(*project_window)
    }
}

/// Per-phase access grants of a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseAccessSet {
    #[serde(default)]
    pub bump_in: PhaseAccess,
    #[serde(default)]
    pub live: PhaseAccess,
    #[serde(default)]
    pub bump_out: PhaseAccess,
}

impl PhaseAccessSet {
    pub fn get(&self, phase: Phase) -> &PhaseAccess {
        match phase {
            Phase::BumpIn => &self.bump_in,
            Phase::Live => &self.live,
            Phase::BumpOut => &self.bump_out,
        }
    }

    /// Checks every override against the owning project's windows.
    ///
    /// An override must have both bounds, be ordered, and fall entirely
    /// within the project window for the same phase.
    pub fn validate_against(&self, project: &Project) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        for phase in Phase::ALL {
            let access = self.get(phase);
            if !access.enabled {
                continue;
            }
            match (access.starts_at, access.ends_at) {
                (None, None) => {}
                (Some(starts_at), Some(ends_at)) => {
                    let window = PhaseWindow { starts_at, ends_at };
                    if !window.is_ordered() {
                        errors.push(format!("{} override start is after its end", phase));
                    } else if !project.window(phase).contains_window(&window) {
                        errors.push(format!(
                            "{} override must fall within the project window",
                            phase
                        ));
                    }
                }
                _ => {
                    errors.push(format!(
                        "{} override requires both start and end dates",
                        phase
                    ));
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// A full accreditation record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccreditationRecord {
    pub id: Uuid,
    pub accreditation_number: String,
    pub project_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
    pub job_title: String,
    pub access_group: String,
    pub identification: Identification,
    pub access: PhaseAccessSet,
    pub status: AccreditationStatus,
    /// Present once the record has been approved; survives revocation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_token: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_reason: Option<String>,
}

impl AccreditationRecord {
    /// Whether the record has been revoked. Only APPROVED records can
    /// carry revocation metadata.
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

/// Generate an opaque QR token.
///
/// The alphabet is a strict subset of what scanners accept, so a
/// generated token always passes the client-side input checks.
pub fn generate_qr_token() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    (0..QR_TOKEN_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CHARS.len());
            CHARS[idx] as char
        })
        .collect()
}

/// Request to create a single accreditation record.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_identification))]
pub struct CreateAccreditationRequest {
    #[validate(length(min = 1, max = 100, message = "firstName must be 1-100 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "lastName must be 1-100 characters"))]
    pub last_name: String,

    #[validate(length(min = 1, max = 200, message = "organization must be 1-200 characters"))]
    pub organization: String,

    #[validate(length(min = 1, max = 100, message = "jobTitle must be 1-100 characters"))]
    pub job_title: String,

    #[validate(custom(function = validate_access_group))]
    pub access_group: String,

    pub identification: Identification,

    #[serde(default)]
    pub access: PhaseAccessSet,
}

/// Request to edit a record.
///
/// Carries the full replacement state; a changed identification type
/// drops every field of the previous variant by construction.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_identification_update))]
pub struct UpdateAccreditationRequest {
    #[validate(length(min = 1, max = 100, message = "firstName must be 1-100 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "lastName must be 1-100 characters"))]
    pub last_name: String,

    #[validate(length(min = 1, max = 200, message = "organization must be 1-200 characters"))]
    pub organization: String,

    #[validate(length(min = 1, max = 100, message = "jobTitle must be 1-100 characters"))]
    pub job_title: String,

    #[validate(custom(function = validate_access_group))]
    pub access_group: String,

    pub identification: Identification,

    #[serde(default)]
    pub access: PhaseAccessSet,
}

/// Request to revoke an approved record.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RevokeAccreditationRequest {
    #[validate(length(min = 1, max = 500, message = "reason must be 1-500 characters"))]
    pub reason: String,
}

/// Response after approving a record: the record plus the verify URL
/// that badge generation prints into the QR payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveAccreditationResponse {
    #[serde(flatten)]
    pub record: AccreditationRecord,
    pub verify_url: String,
}

/// Compact record view used in lists and scan responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccreditationSummary {
    pub id: Uuid,
    pub accreditation_number: String,
    pub project_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
    pub job_title: String,
    pub access_group: String,
    pub status: AccreditationStatus,
    pub revoked: bool,
}

impl From<&AccreditationRecord> for AccreditationSummary {
    fn from(record: &AccreditationRecord) -> Self {
        Self {
            id: record.id,
            accreditation_number: record.accreditation_number.clone(),
            project_id: record.project_id,
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            organization: record.organization.clone(),
            job_title: record.job_title.clone(),
            access_group: record.access_group.clone(),
            status: record.status,
            revoked: record.is_revoked(),
        }
    }
}

/// Query parameters for listing accreditation records.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAccreditationsQuery {
    #[serde(default)]
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub status: Option<AccreditationStatus>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    20
}

/// Pagination info for list responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

/// Response for listing accreditation records.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAccreditationsResponse {
    pub data: Vec<AccreditationSummary>,
    pub pagination: Pagination,
}

fn validate_identification(req: &CreateAccreditationRequest) -> Result<(), ValidationError> {
    req.identification.validate_fields()
}

fn validate_identification_update(req: &UpdateAccreditationRequest) -> Result<(), ValidationError> {
    req.identification.validate_fields()
}
