//! Scan verification routes.
//!
//! Every resolvable scan appends exactly one immutable scan log entry.
//! An unresolvable token is reported as not-found and logged nowhere:
//! there is no record to attach the entry to.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use domain::models::accreditation::{AccreditationRecord, AccreditationSummary};
use domain::models::project::{Phase, Project};
use domain::models::scan_log::CreateScanLogInput;
use domain::services::scan::{self, ScanInput};
use persistence::repositories::{AccreditationRepository, ProjectRepository, ScanLogRepository};
use shared::crypto::token_fingerprint;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ActorContext;
use crate::middleware::metrics::record_scan;

/// Scanner payload: the raw scanned or typed value plus context.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordScanRequest {
    /// A QR payload URL, a raw token, or an `ACC-####` number.
    pub input: String,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Verification outcome returned to the scanner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub record: AccreditationSummary,
    pub was_valid: bool,
    pub valid_phases: Vec<Phase>,
}

/// Verify a badge by QR token path segment.
///
/// GET /api/v1/verify/:token
pub async fn verify_token(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(token): Path<String>,
) -> Result<Json<ScanResponse>, ApiError> {
    let input = scan::interpret(&token)?;
    resolve_and_log(&state, &actor, input, None, None, None).await
}

/// Record a scan from the scanner app (QR payload or manual entry).
///
/// POST /api/v1/scans
pub async fn record_scan_attempt(
    State(state): State<AppState>,
    actor: ActorContext,
    Json(request): Json<RecordScanRequest>,
) -> Result<Json<ScanResponse>, ApiError> {
    let input = scan::interpret(&request.input)?;
    resolve_and_log(
        &state,
        &actor,
        input,
        request.device,
        request.location,
        request.notes,
    )
    .await
}

/// Shared scan pipeline: resolve, evaluate at "now", append one log row.
async fn resolve_and_log(
    state: &AppState,
    actor: &ActorContext,
    input: ScanInput,
    device: Option<String>,
    location: Option<String>,
    notes: Option<String>,
) -> Result<Json<ScanResponse>, ApiError> {
    let record = resolve(state, &input).await?;
    let project = load_project(state, record.project_id).await?;

    let evaluation = scan::evaluate(&record, &project, Utc::now());

    let scan_repo = ScanLogRepository::new(state.pool.clone());
    scan_repo
        .insert(&CreateScanLogInput {
            accreditation_id: record.id,
            was_valid: evaluation.was_valid,
            valid_phases: evaluation.valid_phases.clone(),
            scanned_by: actor.actor_id,
            scanner_name: actor.display_name.clone(),
            device,
            location,
            notes,
        })
        .await?;

    record_scan(evaluation.was_valid);
    info!(
        accreditation_id = %record.id,
        accreditation_number = %record.accreditation_number,
        was_valid = evaluation.was_valid,
        actor_id = %actor.actor_id,
        "Scan recorded"
    );

    Ok(Json(ScanResponse {
        record: AccreditationSummary::from(&record),
        was_valid: evaluation.was_valid,
        valid_phases: evaluation.valid_phases,
    }))
}

/// Resolves interpreted input to a record.
///
/// "Not found" is distinct from "found but invalid": the former is a
/// 404 with nothing logged, the latter is a normal scan outcome.
async fn resolve(state: &AppState, input: &ScanInput) -> Result<AccreditationRecord, ApiError> {
    let repo = AccreditationRepository::new(state.pool.clone());
    let entity = match input {
        ScanInput::Token(token) => {
            let found = repo.find_by_token(token).await?;
            if found.is_none() {
                info!(token_fp = %token_fingerprint(token), "Scan token not found");
            }
            found
        }
        ScanInput::AccreditationNumber(number) => repo.find_by_number(number).await?,
    };

    let entity = entity.ok_or_else(|| ApiError::NotFound("Badge not found".to_string()))?;
    Ok(entity.into_domain()?)
}

async fn load_project(state: &AppState, project_id: Uuid) -> Result<Project, ApiError> {
    let repo = ProjectRepository::new(state.pool.clone());
    let entity = repo
        .find_by_id(project_id)
        .await?
        // FK guarantees the project row; a miss is data corruption
        .ok_or_else(|| ApiError::Internal(format!("project {} missing", project_id)))?;
    Ok(entity.into())
}
