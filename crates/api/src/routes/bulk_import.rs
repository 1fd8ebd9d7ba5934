//! Bulk CSV import routes: template download, validate, commit.
//!
//! Commit is best-effort and sequential: rows are independent, a failed
//! row never rolls back or blocks its siblings, and the outcome carries
//! per-row counts. No transaction wraps the batch on purpose.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::{info, warn};
use validator::Validate;

use domain::models::accreditation::{CreateAccreditationRequest, PhaseAccessSet};
use domain::models::bulk_import::{
    CommitError, CommitImportRequest, CommitOutcome, ImportPreview, ValidateImportRequest,
};
use domain::services::csv_import;
use persistence::repositories::{AccreditationRepository, NewAccreditation, ProjectRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ActorContext;
use crate::middleware::metrics::record_records_imported;

/// Download the CSV import template.
///
/// GET /api/v1/import/template
pub async fn get_template() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"accreditation_import_template.csv\"",
            ),
        ],
        csv_import::template_csv(),
    )
}

/// Validate raw CSV text against a project, persisting nothing.
///
/// POST /api/v1/import/validate
pub async fn validate_import(
    State(state): State<AppState>,
    Json(request): Json<ValidateImportRequest>,
) -> Result<Json<ImportPreview>, ApiError> {
    if request.csv.len() > state.config.limits.max_import_bytes {
        return Err(ApiError::Validation(format!(
            "Import file exceeds the maximum of {} bytes",
            state.config.limits.max_import_bytes
        )));
    }

    // The project must exist even though validation is offline
    let project_repo = ProjectRepository::new(state.pool.clone());
    project_repo
        .find_by_id(request.project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let preview =
        csv_import::preview(&request.csv).map_err(|e| ApiError::Validation(e.to_string()))?;

    info!(
        project_id = %request.project_id,
        rows = preview.rows.len(),
        valid = preview.valid_count,
        invalid = preview.invalid_count,
        duplicates = preview.duplicate_count,
        "Import file validated"
    );

    Ok(Json(preview))
}

/// Commit validated rows, creating DRAFT records.
///
/// POST /api/v1/import/commit
pub async fn commit_import(
    State(state): State<AppState>,
    actor: ActorContext,
    Json(request): Json<CommitImportRequest>,
) -> Result<Json<CommitOutcome>, ApiError> {
    let project_repo = ProjectRepository::new(state.pool.clone());
    let project: domain::models::project::Project = project_repo
        .find_by_id(request.project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?
        .into();

    let repo = AccreditationRepository::new(state.pool.clone());
    let mut outcome = CommitOutcome::default();

    for (index, row) in request.records.iter().enumerate() {
        let row_number = index + 1;

        if row.is_duplicate && request.skip_duplicates {
            outcome.skipped += 1;
            continue;
        }

        match create_row(&repo, &project, actor.actor_id, row).await {
            Ok(()) => outcome.imported += 1,
            Err(error) => {
                warn!(
                    project_id = %request.project_id,
                    row = row_number,
                    error = %error,
                    "Import row failed"
                );
                outcome.failed += 1;
                outcome.errors.push(CommitError {
                    row: row_number,
                    error,
                });
            }
        }
    }

    record_records_imported(outcome.imported as usize);
    info!(
        project_id = %request.project_id,
        actor_id = %actor.actor_id,
        imported = outcome.imported,
        skipped = outcome.skipped,
        failed = outcome.failed,
        "Import committed"
    );

    Ok(Json(outcome))
}

/// Creates one record from a commit row; any error is reported as a
/// per-row failure string.
async fn create_row(
    repo: &AccreditationRepository,
    project: &domain::models::project::Project,
    actor_id: uuid::Uuid,
    row: &domain::models::bulk_import::CommitRecord,
) -> Result<(), String> {
    let identification = row.record.to_identification()?;

    // Reuse the single-entry request validation on the imported data
    let request = CreateAccreditationRequest {
        first_name: row.record.first_name.clone(),
        last_name: row.record.last_name.clone(),
        organization: row.record.organization.clone(),
        job_title: row.record.job_title.clone(),
        access_group: row.record.access_group.clone(),
        identification,
        access: PhaseAccessSet::default(),
    };
    request.validate().map_err(|e| e.to_string())?;

    if !project.allows_group(&request.access_group) {
        return Err(format!(
            "Access group {:?} is not allowed on this project",
            request.access_group
        ));
    }

    repo.create(&NewAccreditation {
        project_id: project.id,
        first_name: request.first_name,
        last_name: request.last_name,
        organization: request.organization,
        job_title: request.job_title,
        access_group: request.access_group,
        identification: request.identification,
        access: request.access,
        created_by: actor_id,
    })
    .await
    .map_err(|e| e.to_string())?;

    Ok(())
}
