//! Scan log domain models.
//!
//! Scan logs are append-only: one entry is written per resolvable scan
//! attempt and entries are never updated or deleted. There is no update
//! DTO on purpose.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::project::Phase;

/// One recorded scan attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanLog {
    pub id: Uuid,
    pub accreditation_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub was_valid: bool,
    /// Phases that were inside their effective window at scan time,
    /// recorded even when the overall outcome was invalid.
    pub valid_phases: Vec<Phase>,
    pub scanned_by: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scanner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Input for appending a scan log entry.
#[derive(Debug, Clone)]
pub struct CreateScanLogInput {
    pub accreditation_id: Uuid,
    pub was_valid: bool,
    pub valid_phases: Vec<Phase>,
    pub scanned_by: Uuid,
    pub scanner_name: Option<String>,
    pub device: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Query parameters for listing a record's scan logs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListScanLogsQuery {
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

/// Response for listing scan logs, newest first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListScanLogsResponse {
    pub data: Vec<ScanLog>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}
