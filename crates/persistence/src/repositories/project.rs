//! Project repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::ProjectEntity;
use crate::metrics::QueryTimer;

const COLUMNS: &str = "id, name, code, bump_in_starts_at, bump_in_ends_at, \
    live_starts_at, live_ends_at, bump_out_starts_at, bump_out_ends_at, \
    access_groups, is_active, created_by, created_at, updated_at";

/// Input for creating a project.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub code: String,
    pub bump_in_starts_at: DateTime<Utc>,
    pub bump_in_ends_at: DateTime<Utc>,
    pub live_starts_at: DateTime<Utc>,
    pub live_ends_at: DateTime<Utc>,
    pub bump_out_starts_at: DateTime<Utc>,
    pub bump_out_ends_at: DateTime<Utc>,
    pub access_groups: Vec<String>,
    pub created_by: Uuid,
}

/// Input for updating a project.
#[derive(Debug, Clone)]
pub struct ProjectUpdate {
    pub name: String,
    pub bump_in_starts_at: DateTime<Utc>,
    pub bump_in_ends_at: DateTime<Utc>,
    pub live_starts_at: DateTime<Utc>,
    pub live_ends_at: DateTime<Utc>,
    pub bump_out_starts_at: DateTime<Utc>,
    pub bump_out_ends_at: DateTime<Utc>,
    pub access_groups: Vec<String>,
    pub is_active: bool,
}

/// Repository for project-related database operations.
#[derive(Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    /// Creates a new ProjectRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new project.
    pub async fn create(&self, input: &NewProject) -> Result<ProjectEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_project");
        let result = sqlx::query_as::<_, ProjectEntity>(&format!(
            r#"
            INSERT INTO projects (
                name, code,
                bump_in_starts_at, bump_in_ends_at,
                live_starts_at, live_ends_at,
                bump_out_starts_at, bump_out_ends_at,
                access_groups, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.code)
        .bind(input.bump_in_starts_at)
        .bind(input.bump_in_ends_at)
        .bind(input.live_starts_at)
        .bind(input.live_ends_at)
        .bind(input.bump_out_starts_at)
        .bind(input.bump_out_ends_at)
        .bind(&input.access_groups)
        .bind(input.created_by)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find project by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ProjectEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_project_by_id");
        let result = sqlx::query_as::<_, ProjectEntity>(&format!(
            "SELECT {COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List all projects, newest first.
    pub async fn list(&self) -> Result<Vec<ProjectEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_projects");
        let result = sqlx::query_as::<_, ProjectEntity>(&format!(
            "SELECT {COLUMNS} FROM projects ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Update a project.
    pub async fn update(
        &self,
        id: Uuid,
        update: &ProjectUpdate,
    ) -> Result<Option<ProjectEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_project");
        let result = sqlx::query_as::<_, ProjectEntity>(&format!(
            r#"
            UPDATE projects
            SET name = $2,
                bump_in_starts_at = $3, bump_in_ends_at = $4,
                live_starts_at = $5, live_ends_at = $6,
                bump_out_starts_at = $7, bump_out_ends_at = $8,
                access_groups = $9,
                is_active = $10,
                updated_at = now()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.name)
        .bind(update.bump_in_starts_at)
        .bind(update.bump_in_ends_at)
        .bind(update.live_starts_at)
        .bind(update.live_ends_at)
        .bind(update.bump_out_starts_at)
        .bind(update.bump_out_ends_at)
        .bind(&update.access_groups)
        .bind(update.is_active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}

#[cfg(test)]
mod tests {
    // Note: ProjectRepository tests require a database connection and are
    // covered by integration tests against a live instance.
}
