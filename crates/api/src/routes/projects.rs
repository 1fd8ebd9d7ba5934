//! Project routes.
//!
//! Projects are created and edited by administrators and never expire on
//! their own; deactivation is an explicit edit.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use domain::models::project::{
    CreateProjectRequest, ListProjectsResponse, Project, UpdateProjectRequest,
};
use persistence::repositories::{NewProject, ProjectRepository, ProjectUpdate};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ActorContext;

/// Create a new project.
///
/// POST /api/v1/projects
pub async fn create_project(
    State(state): State<AppState>,
    actor: ActorContext,
    Json(request): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    request.validate()?;

    let repo = ProjectRepository::new(state.pool.clone());
    let entity = repo
        .create(&NewProject {
            name: request.name,
            code: request.code,
            bump_in_starts_at: request.bump_in.starts_at,
            bump_in_ends_at: request.bump_in.ends_at,
            live_starts_at: request.live.starts_at,
            live_ends_at: request.live.ends_at,
            bump_out_starts_at: request.bump_out.starts_at,
            bump_out_ends_at: request.bump_out.ends_at,
            access_groups: request.access_groups,
            created_by: actor.actor_id,
        })
        .await?;

    info!(
        project_id = %entity.id,
        code = %entity.code,
        actor_id = %actor.actor_id,
        "Project created"
    );

    Ok((StatusCode::CREATED, Json(entity.into())))
}

/// List all projects.
///
/// GET /api/v1/projects
pub async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<ListProjectsResponse>, ApiError> {
    let repo = ProjectRepository::new(state.pool.clone());
    let projects = repo.list().await?.into_iter().map(Project::from).collect();
    Ok(Json(ListProjectsResponse { data: projects }))
}

/// Fetch one project.
///
/// GET /api/v1/projects/:project_id
pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Project>, ApiError> {
    let repo = ProjectRepository::new(state.pool.clone());
    let entity = repo
        .find_by_id(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;
    Ok(Json(entity.into()))
}

/// Update a project.
///
/// PUT /api/v1/projects/:project_id
pub async fn update_project(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(project_id): Path<Uuid>,
    Json(request): Json<UpdateProjectRequest>,
) -> Result<Json<Project>, ApiError> {
    request.validate()?;

    let repo = ProjectRepository::new(state.pool.clone());
    let entity = repo
        .update(
            project_id,
            &ProjectUpdate {
                name: request.name,
                bump_in_starts_at: request.bump_in.starts_at,
                bump_in_ends_at: request.bump_in.ends_at,
                live_starts_at: request.live.starts_at,
                live_ends_at: request.live.ends_at,
                bump_out_starts_at: request.bump_out.starts_at,
                bump_out_ends_at: request.bump_out.ends_at,
                access_groups: request.access_groups,
                is_active: request.is_active,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    info!(
        project_id = %project_id,
        actor_id = %actor.actor_id,
        "Project updated"
    );

    Ok(Json(entity.into()))
}
