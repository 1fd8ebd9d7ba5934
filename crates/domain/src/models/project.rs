//! Project domain models.
//!
//! A project defines one event: its three access phases (bump-in, live,
//! bump-out) and the access groups badges may be issued under.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use shared::validation::validate_phase_range;

/// One of the three named access phases of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    BumpIn,
    Live,
    BumpOut,
}

impl Phase {
    /// All phases in chronological order.
    pub const ALL: [Phase; 3] = [Phase::BumpIn, Phase::Live, Phase::BumpOut];

    /// Stable string form, matching the serialized representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::BumpIn => "BUMP_IN",
            Phase::Live => "LIVE",
            Phase::BumpOut => "BUMP_OUT",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUMP_IN" => Ok(Phase::BumpIn),
            "LIVE" => Ok(Phase::Live),
            "BUMP_OUT" => Ok(Phase::BumpOut),
            _ => Err(format!("Unknown phase: {}", s)),
        }
    }
}

/// A closed timestamp range; both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseWindow {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl PhaseWindow {
    /// Whether the given instant falls inside the window (inclusive).
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.starts_at <= instant && instant <= self.ends_at
    }

    /// Whether `other` lies entirely inside this window.
    pub fn contains_window(&self, other: &PhaseWindow) -> bool {
        self.starts_at <= other.starts_at && other.ends_at <= self.ends_at
    }

    /// Invariant check: start must not be after end.
    pub fn is_ordered(&self) -> bool {
        self.starts_at <= self.ends_at
    }
}

/// A project (event) with its phase windows and allowed access groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub bump_in: PhaseWindow,
    pub live: PhaseWindow,
    pub bump_out: PhaseWindow,
    pub access_groups: Vec<String>,
    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// The project-level window for the given phase.
    pub fn window(&self, phase: Phase) -> &PhaseWindow {
        match phase {
            Phase::BumpIn => &self.bump_in,
            Phase::Live => &self.live,
            Phase::BumpOut => &self.bump_out,
        }
    }

    /// Whether the given access group is allowed on this project.
    pub fn allows_group(&self, group: &str) -> bool {
        self.access_groups.iter().any(|g| g == group)
    }
}

/// Request to create a new project.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_project_windows))]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,

    /// Short project code, e.g. "GF24".
    #[validate(length(min = 2, max = 20, message = "code must be 2-20 characters"))]
    pub code: String,

    pub bump_in: PhaseWindow,
    pub live: PhaseWindow,
    pub bump_out: PhaseWindow,

    #[validate(length(min = 1, message = "at least one access group is required"))]
    pub access_groups: Vec<String>,
}

/// Request to update an existing project.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_update_project_windows))]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,

    pub bump_in: PhaseWindow,
    pub live: PhaseWindow,
    pub bump_out: PhaseWindow,

    #[validate(length(min = 1, message = "at least one access group is required"))]
    pub access_groups: Vec<String>,

    pub is_active: bool,
}

/// Response for listing projects.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProjectsResponse {
    pub data: Vec<Project>,
}

fn check_windows(windows: [(&str, &PhaseWindow); 3]) -> Result<(), ValidationError> {
    for (name, window) in windows {
        if validate_phase_range(window.starts_at, window.ends_at).is_err() {
            let mut err = ValidationError::new("phase_range");
            err.message = Some(format!("{} window start must not be after its end", name).into());
            return Err(err);
        }
    }
    Ok(())
}

fn validate_project_windows(req: &CreateProjectRequest) -> Result<(), ValidationError> {
    check_windows([
        ("bumpIn", &req.bump_in),
        ("live", &req.live),
        ("bumpOut", &req.bump_out),
    ])
}

fn validate_update_project_windows(req: &UpdateProjectRequest) -> Result<(), ValidationError> {
    check_windows([
        ("bumpIn", &req.bump_in),
        ("live", &req.live),
        ("bumpOut", &req.bump_out),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window(start_day: u32, end_day: u32) -> PhaseWindow {
        PhaseWindow {
            starts_at: Utc.with_ymd_and_hms(2025, 1, start_day, 0, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2025, 1, end_day, 23, 59, 59).unwrap(),
        }
    }

    fn sample_project() -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "Grand Final 2025".to_string(),
            code: "GF25".to_string(),
            bump_in: window(1, 5),
            live: window(6, 10),
            bump_out: window(11, 14),
            access_groups: vec!["MEDIA".to_string(), "PRODUCTION".to_string()],
            is_active: true,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_phase_display_roundtrip() {
        for phase in Phase::ALL {
            assert_eq!(Phase::from_str(phase.as_str()).unwrap(), phase);
        }
    }

    #[test]
    fn test_phase_from_str_unknown() {
        assert!(Phase::from_str("SETUP").is_err());
        assert!(Phase::from_str("live").is_err()); // case sensitive
    }

    #[test]
    fn test_phase_serde_form() {
        assert_eq!(
            serde_json::to_string(&Phase::BumpIn).unwrap(),
            "\"BUMP_IN\""
        );
        assert_eq!(serde_json::to_string(&Phase::Live).unwrap(), "\"LIVE\"");
    }

    #[test]
    fn test_window_contains_inclusive_bounds() {
        let w = window(1, 10);
        assert!(w.contains(w.starts_at));
        assert!(w.contains(w.ends_at));
        assert!(w.contains(Utc.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap()));
        assert!(!w.contains(Utc.with_ymd_and_hms(2025, 1, 11, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_window_contains_window() {
        let outer = window(1, 10);
        assert!(outer.contains_window(&window(2, 9)));
        assert!(outer.contains_window(&window(1, 10)));
        assert!(!outer.contains_window(&window(2, 11)));
    }

    #[test]
    fn test_project_window_lookup() {
        let project = sample_project();
        assert_eq!(project.window(Phase::BumpIn), &project.bump_in);
        assert_eq!(project.window(Phase::Live), &project.live);
        assert_eq!(project.window(Phase::BumpOut), &project.bump_out);
    }

    #[test]
    fn test_project_allows_group() {
        let project = sample_project();
        assert!(project.allows_group("MEDIA"));
        assert!(!project.allows_group("media"));
        assert!(!project.allows_group("CATERING"));
    }

    #[test]
    fn test_create_project_request_valid() {
        let req = CreateProjectRequest {
            name: "Grand Final 2025".to_string(),
            code: "GF25".to_string(),
            bump_in: window(1, 5),
            live: window(6, 10),
            bump_out: window(11, 14),
            access_groups: vec!["MEDIA".to_string()],
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_project_request_reversed_window() {
        let req = CreateProjectRequest {
            name: "Grand Final 2025".to_string(),
            code: "GF25".to_string(),
            bump_in: window(5, 1),
            live: window(6, 10),
            bump_out: window(11, 14),
            access_groups: vec!["MEDIA".to_string()],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_project_request_no_groups() {
        let req = CreateProjectRequest {
            name: "Grand Final 2025".to_string(),
            code: "GF25".to_string(),
            bump_in: window(1, 5),
            live: window(6, 10),
            bump_out: window(11, 14),
            access_groups: vec![],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_project_request_deserialize_camel_case() {
        let json = serde_json::json!({
            "name": "Grand Final 2025",
            "code": "GF25",
            "bumpIn": {"startsAt": "2025-01-01T00:00:00Z", "endsAt": "2025-01-05T00:00:00Z"},
            "live": {"startsAt": "2025-01-06T00:00:00Z", "endsAt": "2025-01-10T00:00:00Z"},
            "bumpOut": {"startsAt": "2025-01-11T00:00:00Z", "endsAt": "2025-01-14T00:00:00Z"},
            "accessGroups": ["MEDIA"]
        });
        let req: CreateProjectRequest = serde_json::from_value(json).unwrap();
        assert_eq!(req.code, "GF25");
        assert_eq!(req.access_groups, vec!["MEDIA".to_string()]);
    }
}
