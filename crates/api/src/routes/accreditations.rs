//! Accreditation record routes: CRUD plus lifecycle transitions.
//!
//! Handlers check transition legality with the domain state machine
//! before running the guarded UPDATE; the guard catches races, the
//! state machine produces the precise error.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use domain::models::accreditation::{
    generate_qr_token, AccreditationRecord, AccreditationSummary, ApproveAccreditationResponse,
    CreateAccreditationRequest, ListAccreditationsQuery, ListAccreditationsResponse, Pagination,
    RevokeAccreditationRequest, UpdateAccreditationRequest,
};
use domain::models::project::Project;
use domain::models::scan_log::{ListScanLogsQuery, ListScanLogsResponse, ScanLog};
use domain::services::lifecycle;
use persistence::repositories::{
    AccreditationRepository, NewAccreditation, ProjectRepository, ScanLogRepository,
};
use shared::crypto::token_fingerprint;
use shared::pagination::{decode_cursor, encode_cursor};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ActorContext;

async fn load_project(state: &AppState, project_id: Uuid) -> Result<Project, ApiError> {
    let repo = ProjectRepository::new(state.pool.clone());
    let entity = repo
        .find_by_id(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;
    Ok(entity.into())
}

async fn load_record(state: &AppState, id: Uuid) -> Result<AccreditationRecord, ApiError> {
    let repo = AccreditationRepository::new(state.pool.clone());
    let entity = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Accreditation record not found".to_string()))?;
    Ok(entity.into_domain()?)
}

/// Create a single accreditation record.
///
/// POST /api/v1/projects/:project_id/accreditations
///
/// The record always lands in DRAFT regardless of caller intent.
pub async fn create_accreditation(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(project_id): Path<Uuid>,
    Json(request): Json<CreateAccreditationRequest>,
) -> Result<(StatusCode, Json<AccreditationRecord>), ApiError> {
    request.validate()?;

    let project = load_project(&state, project_id).await?;
    if !project.allows_group(&request.access_group) {
        return Err(ApiError::Validation(format!(
            "Access group {:?} is not allowed on this project",
            request.access_group
        )));
    }
    if let Err(errors) = request.access.validate_against(&project) {
        return Err(ApiError::Validation(errors.join(", ")));
    }

    let repo = AccreditationRepository::new(state.pool.clone());
    let entity = repo
        .create(&NewAccreditation {
            project_id,
            first_name: request.first_name,
            last_name: request.last_name,
            organization: request.organization,
            job_title: request.job_title,
            access_group: request.access_group,
            identification: request.identification,
            access: request.access,
            created_by: actor.actor_id,
        })
        .await?;

    let record = entity.into_domain()?;
    info!(
        accreditation_id = %record.id,
        accreditation_number = %record.accreditation_number,
        project_id = %project_id,
        actor_id = %actor.actor_id,
        "Accreditation record created"
    );

    Ok((StatusCode::CREATED, Json(record)))
}

/// List accreditation records with optional filters.
///
/// GET /api/v1/accreditations?projectId=&status=&page=&perPage=
pub async fn list_accreditations(
    State(state): State<AppState>,
    Query(query): Query<ListAccreditationsQuery>,
) -> Result<Json<ListAccreditationsResponse>, ApiError> {
    let page = query.page.max(1);
    let per_page = query.per_page.clamp(1, state.config.limits.max_per_page);
    let status_db = query.status.map(Into::into);

    let repo = AccreditationRepository::new(state.pool.clone());
    let total = repo.count(query.project_id, status_db).await?;
    let entities = repo
        .list(query.project_id, status_db, per_page, (page - 1) * per_page)
        .await?;

    let mut data = Vec::with_capacity(entities.len());
    for entity in entities {
        let record = entity.into_domain()?;
        data.push(AccreditationSummary::from(&record));
    }

    Ok(Json(ListAccreditationsResponse {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
        },
    }))
}

/// Fetch one record.
///
/// GET /api/v1/accreditations/:id
pub async fn get_accreditation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccreditationRecord>, ApiError> {
    Ok(Json(load_record(&state, id).await?))
}

/// Edit a record's person, identification, and access fields.
///
/// PUT /api/v1/accreditations/:id
///
/// Switching identification type drops every field of the previous
/// variant; decided records are no longer editable.
pub async fn update_accreditation(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAccreditationRequest>,
) -> Result<Json<AccreditationRecord>, ApiError> {
    request.validate()?;

    let record = load_record(&state, id).await?;
    if !lifecycle::is_editable(record.status) {
        return Err(ApiError::InvalidState(format!(
            "cannot edit a record in {} status",
            record.status
        )));
    }

    let project = load_project(&state, record.project_id).await?;
    if !project.allows_group(&request.access_group) {
        return Err(ApiError::Validation(format!(
            "Access group {:?} is not allowed on this project",
            request.access_group
        )));
    }
    if let Err(errors) = request.access.validate_against(&project) {
        return Err(ApiError::Validation(errors.join(", ")));
    }

    let repo = AccreditationRepository::new(state.pool.clone());
    let entity = repo
        .update_details(
            id,
            &NewAccreditation {
                project_id: record.project_id,
                first_name: request.first_name,
                last_name: request.last_name,
                organization: request.organization,
                job_title: request.job_title,
                access_group: request.access_group,
                identification: request.identification,
                access: request.access,
                created_by: record.created_by,
            },
        )
        .await?
        // The record was decided between our check and the update
        .ok_or_else(|| ApiError::InvalidState("record is no longer editable".to_string()))?;

    info!(
        accreditation_id = %id,
        actor_id = %actor.actor_id,
        "Accreditation record updated"
    );

    Ok(Json(entity.into_domain()?))
}

/// Submit a DRAFT record for approval.
///
/// POST /api/v1/accreditations/:id/submit
pub async fn submit_accreditation(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
) -> Result<Json<AccreditationRecord>, ApiError> {
    let record = load_record(&state, id).await?;
    lifecycle::submit(record.status)?;

    let repo = AccreditationRepository::new(state.pool.clone());
    let entity = repo
        .submit(id)
        .await?
        .ok_or_else(|| ApiError::InvalidState("record already left draft".to_string()))?;

    info!(
        accreditation_id = %id,
        actor_id = %actor.actor_id,
        "Accreditation submitted"
    );

    Ok(Json(entity.into_domain()?))
}

/// Approve a PENDING record, assigning a QR token if none exists.
///
/// POST /api/v1/accreditations/:id/approve
///
/// The response carries the verify URL that badge generation prints
/// into the QR payload.
pub async fn approve_accreditation(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ApproveAccreditationResponse>, ApiError> {
    let record = load_record(&state, id).await?;
    lifecycle::approve(record.status)?;

    let token = generate_qr_token();
    let repo = AccreditationRepository::new(state.pool.clone());
    let entity = repo
        .approve(id, actor.actor_id, &token)
        .await?
        .ok_or_else(|| ApiError::InvalidState("record is no longer pending".to_string()))?;

    let approved = entity.into_domain()?;
    let assigned_token = approved
        .qr_token
        .clone()
        .ok_or_else(|| ApiError::Internal("approved record has no token".to_string()))?;
    let verify_url = format!(
        "{}/verify/{}",
        state.config.badge.verify_base_url.trim_end_matches('/'),
        assigned_token
    );

    info!(
        accreditation_id = %id,
        actor_id = %actor.actor_id,
        token_fp = %token_fingerprint(&assigned_token),
        "Accreditation approved"
    );

    Ok(Json(ApproveAccreditationResponse {
        record: approved,
        verify_url,
    }))
}

/// Reject a PENDING record. Terminal.
///
/// POST /api/v1/accreditations/:id/reject
pub async fn reject_accreditation(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
) -> Result<Json<AccreditationRecord>, ApiError> {
    let record = load_record(&state, id).await?;
    lifecycle::reject(record.status)?;

    let repo = AccreditationRepository::new(state.pool.clone());
    let entity = repo
        .reject(id, actor.actor_id)
        .await?
        .ok_or_else(|| ApiError::InvalidState("record is no longer pending".to_string()))?;

    info!(
        accreditation_id = %id,
        actor_id = %actor.actor_id,
        "Accreditation rejected"
    );

    Ok(Json(entity.into_domain()?))
}

/// Revoke an APPROVED record. Terminal and irreversible.
///
/// POST /api/v1/accreditations/:id/revoke
pub async fn revoke_accreditation(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(id): Path<Uuid>,
    Json(request): Json<RevokeAccreditationRequest>,
) -> Result<Json<AccreditationRecord>, ApiError> {
    request.validate()?;

    let record = load_record(&state, id).await?;
    lifecycle::revoke(record.status, record.is_revoked(), &request.reason)?;

    let repo = AccreditationRepository::new(state.pool.clone());
    let entity = repo
        .revoke(id, actor.actor_id, &request.reason)
        .await?
        .ok_or_else(|| ApiError::InvalidState("record cannot be revoked".to_string()))?;

    info!(
        accreditation_id = %id,
        actor_id = %actor.actor_id,
        "Accreditation revoked"
    );

    Ok(Json(entity.into_domain()?))
}

/// List a record's scan history, newest first.
///
/// GET /api/v1/accreditations/:id/scans?cursor=&limit=
pub async fn list_scans(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListScanLogsQuery>,
) -> Result<Json<ListScanLogsResponse>, ApiError> {
    // 404 on unknown record rather than an empty page
    load_record(&state, id).await?;

    let cursor = match query.cursor.as_deref() {
        Some(raw) => Some(decode_cursor(raw).map_err(|e| ApiError::Validation(e.to_string()))?),
        None => None,
    };
    let limit = query.limit.clamp(1, state.config.limits.max_per_page);

    let repo = ScanLogRepository::new(state.pool.clone());
    let entities = repo.list_for_record(id, cursor, limit).await?;

    let mut data: Vec<ScanLog> = Vec::with_capacity(entities.len());
    for entity in entities {
        data.push(entity.into_domain()?);
    }

    let next_cursor = if data.len() as i64 == limit {
        data.last().map(|log| encode_cursor(log.recorded_at, log.id))
    } else {
        None
    };

    Ok(Json(ListScanLogsResponse { data, next_cursor }))
}
