//! Project entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::project::{PhaseWindow, Project};

/// Database row mapping for the projects table.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectEntity {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub bump_in_starts_at: DateTime<Utc>,
    pub bump_in_ends_at: DateTime<Utc>,
    pub live_starts_at: DateTime<Utc>,
    pub live_ends_at: DateTime<Utc>,
    pub bump_out_starts_at: DateTime<Utc>,
    pub bump_out_ends_at: DateTime<Utc>,
    pub access_groups: Vec<String>,
    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProjectEntity> for Project {
    fn from(entity: ProjectEntity) -> Self {
        Project {
            id: entity.id,
            name: entity.name,
            code: entity.code,
            bump_in: PhaseWindow {
                starts_at: entity.bump_in_starts_at,
                ends_at: entity.bump_in_ends_at,
            },
            live: PhaseWindow {
                starts_at: entity.live_starts_at,
                ends_at: entity.live_ends_at,
            },
            bump_out: PhaseWindow {
                starts_at: entity.bump_out_starts_at,
                ends_at: entity.bump_out_ends_at,
            },
            access_groups: entity.access_groups,
            is_active: entity.is_active,
            created_by: entity.created_by,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_entity_into_domain() {
        let entity = ProjectEntity {
            id: Uuid::new_v4(),
            name: "Winter Cup".to_string(),
            code: "WC25".to_string(),
            bump_in_starts_at: Utc.with_ymd_and_hms(2024, 12, 20, 0, 0, 0).unwrap(),
            bump_in_ends_at: Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap(),
            live_starts_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            live_ends_at: Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap(),
            bump_out_starts_at: Utc.with_ymd_and_hms(2025, 1, 11, 0, 0, 0).unwrap(),
            bump_out_ends_at: Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap(),
            access_groups: vec!["MEDIA".to_string()],
            is_active: true,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let project: Project = entity.clone().into();
        assert_eq!(project.id, entity.id);
        assert_eq!(project.bump_in.starts_at, entity.bump_in_starts_at);
        assert_eq!(project.live.ends_at, entity.live_ends_at);
        assert_eq!(project.access_groups, vec!["MEDIA".to_string()]);
    }
}
