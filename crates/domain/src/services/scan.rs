//! QR scan validation.
//!
//! Interprets scanner input (a QR payload URL, a raw token, or a
//! manually entered accreditation number) and evaluates a resolved
//! record's validity at a given instant. Lookup and logging stay in the
//! caller; everything here is pure.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use shared::validation::normalize_accreditation_number;

use crate::models::accreditation::{AccreditationRecord, AccreditationStatus};
use crate::models::project::{Phase, Project};

/// Maximum length accepted for a raw (non-URL) token input.
pub const MAX_RAW_TOKEN_LENGTH: usize = 50;

/// Path segment preceding the token in a QR payload URL.
const VERIFY_PATH: &str = "/verify/";

lazy_static::lazy_static! {
    static ref TOKEN_CHARSET: regex::Regex = regex::Regex::new(r"^[A-Za-z0-9-]+$").unwrap();
    static ref MANUAL_NUMBER: regex::Regex = regex::Regex::new(r"^(?i)acc-\d+$").unwrap();
}

/// Interpreted scanner input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanInput {
    /// An opaque QR token, extracted from a URL or taken raw.
    Token(String),
    /// A manually entered accreditation number, normalized to uppercase.
    AccreditationNumber(String),
}

/// Rejection of scanner input before any lookup happens.
///
/// These mirror the scanner's own client-side checks; the server-side
/// lookup remains the authority on whether a token exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanInputError {
    #[error("scanned value is empty")]
    Empty,
    #[error("scanned value exceeds {MAX_RAW_TOKEN_LENGTH} characters")]
    TooLong,
    #[error("scanned value contains characters outside the token alphabet")]
    InvalidCharacters,
    #[error("scanned value is a URL without a verification path")]
    UnexpectedUrl,
}

/// Interprets a scanned or typed value.
///
/// Accepted forms, in order:
/// 1. a URL whose path contains `/verify/<token>`; the token is the
///    suffix after the last occurrence;
/// 2. an `ACC-####`-style accreditation number, any case;
/// 3. a raw token, subject to length and charset checks.
pub fn interpret(input: &str) -> Result<ScanInput, ScanInputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ScanInputError::Empty);
    }

    if let Some(pos) = trimmed.rfind(VERIFY_PATH) {
        let token = trimmed[pos + VERIFY_PATH.len()..].trim_end_matches('/');
        if token.is_empty() || !TOKEN_CHARSET.is_match(token) {
            return Err(ScanInputError::InvalidCharacters);
        }
        return Ok(ScanInput::Token(token.to_string()));
    }

    if MANUAL_NUMBER.is_match(trimmed) {
        return Ok(ScanInput::AccreditationNumber(
            normalize_accreditation_number(trimmed),
        ));
    }

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Err(ScanInputError::UnexpectedUrl);
    }
    if trimmed.len() > MAX_RAW_TOKEN_LENGTH {
        return Err(ScanInputError::TooLong);
    }
    if !TOKEN_CHARSET.is_match(trimmed) {
        return Err(ScanInputError::InvalidCharacters);
    }

    Ok(ScanInput::Token(trimmed.to_string()))
}

/// Outcome of evaluating one record at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanEvaluation {
    pub was_valid: bool,
    /// Phases currently inside their effective window, reported even
    /// when the overall outcome is invalid.
    pub valid_phases: Vec<Phase>,
}

/// Phases whose granted access covers `now`.
///
/// A phase counts only if the record's flag is set; the effective window
/// is the record-level override when present, else the project window.
/// Bounds are inclusive on both ends.
pub fn currently_valid_phases(
    record: &AccreditationRecord,
    project: &Project,
    now: DateTime<Utc>,
) -> Vec<Phase> {
    Phase::ALL
        .into_iter()
        .filter(|&phase| {
            let access = record.access.get(phase);
            access.enabled && access.effective_window(project.window(phase)).contains(now)
        })
        .collect()
}

/// Evaluates a resolved record.
///
/// `was_valid` requires APPROVED status, no revocation, and at least one
/// currently valid phase. A scan during a gap between phases is invalid
/// but still reports which phases were checked.
pub fn evaluate(
    record: &AccreditationRecord,
    project: &Project,
    now: DateTime<Utc>,
) -> ScanEvaluation {
    let valid_phases = currently_valid_phases(record, project, now);
    let was_valid = record.status == AccreditationStatus::Approved
        && !record.is_revoked()
        && !valid_phases.is_empty();
    ScanEvaluation {
        was_valid,
        valid_phases,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::accreditation::{Identification, PhaseAccess, PhaseAccessSet};
    use crate::models::project::PhaseWindow;
    use chrono::{NaiveDate, TimeZone};
    use uuid::Uuid;

    // Input interpretation

    #[test]
    fn test_interpret_verify_url() {
        let input = "https://badges.example.com/verify/Xy7Qm2Lp9RtAv4Kc";
        assert_eq!(
            interpret(input).unwrap(),
            ScanInput::Token("Xy7Qm2Lp9RtAv4Kc".to_string())
        );
    }

    #[test]
    fn test_interpret_verify_url_trailing_slash() {
        let input = "https://badges.example.com/verify/Xy7Qm2Lp9RtAv4Kc/";
        assert_eq!(
            interpret(input).unwrap(),
            ScanInput::Token("Xy7Qm2Lp9RtAv4Kc".to_string())
        );
    }

    #[test]
    fn test_interpret_raw_token() {
        assert_eq!(
            interpret("Xy7Qm2Lp9RtAv4Kc8NdEw3HfJs6Bg1Zu").unwrap(),
            ScanInput::Token("Xy7Qm2Lp9RtAv4Kc8NdEw3HfJs6Bg1Zu".to_string())
        );
    }

    #[test]
    fn test_interpret_trims_whitespace() {
        assert_eq!(
            interpret("  abc123  ").unwrap(),
            ScanInput::Token("abc123".to_string())
        );
    }

    #[test]
    fn test_interpret_manual_number_uppercased() {
        assert_eq!(
            interpret("acc-0042").unwrap(),
            ScanInput::AccreditationNumber("ACC-0042".to_string())
        );
        assert_eq!(
            interpret("ACC-0042").unwrap(),
            ScanInput::AccreditationNumber("ACC-0042".to_string())
        );
    }

    #[test]
    fn test_interpret_empty() {
        assert_eq!(interpret("").unwrap_err(), ScanInputError::Empty);
        assert_eq!(interpret("   ").unwrap_err(), ScanInputError::Empty);
    }

    #[test]
    fn test_interpret_too_long_raw_token() {
        let long = "a".repeat(MAX_RAW_TOKEN_LENGTH + 1);
        assert_eq!(interpret(&long).unwrap_err(), ScanInputError::TooLong);
        // Exactly at the limit is fine
        let at_limit = "a".repeat(MAX_RAW_TOKEN_LENGTH);
        assert!(interpret(&at_limit).is_ok());
    }

    #[test]
    fn test_interpret_invalid_characters() {
        assert_eq!(
            interpret("abc 123").unwrap_err(),
            ScanInputError::InvalidCharacters
        );
        assert_eq!(
            interpret("abc_123").unwrap_err(),
            ScanInputError::InvalidCharacters
        );
        assert_eq!(
            interpret("abc/123").unwrap_err(),
            ScanInputError::InvalidCharacters
        );
    }

    #[test]
    fn test_interpret_foreign_url_rejected() {
        // An absolute URL without a /verify/ path is not a token
        assert_eq!(
            interpret("https://example.com/something-else").unwrap_err(),
            ScanInputError::UnexpectedUrl
        );
    }

    #[test]
    fn test_interpret_url_with_bad_token_chars() {
        assert_eq!(
            interpret("https://badges.example.com/verify/ab%20cd").unwrap_err(),
            ScanInputError::InvalidCharacters
        );
        assert_eq!(
            interpret("https://badges.example.com/verify/").unwrap_err(),
            ScanInputError::InvalidCharacters
        );
    }

    // Validity evaluation

    fn project() -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "Winter Cup".to_string(),
            code: "WC25".to_string(),
            bump_in: PhaseWindow {
                starts_at: Utc.with_ymd_and_hms(2024, 12, 20, 0, 0, 0).unwrap(),
                ends_at: Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap(),
            },
            live: PhaseWindow {
                starts_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
                ends_at: Utc.with_ymd_and_hms(2025, 1, 10, 23, 59, 59).unwrap(),
            },
            bump_out: PhaseWindow {
                starts_at: Utc.with_ymd_and_hms(2025, 1, 11, 0, 0, 0).unwrap(),
                ends_at: Utc.with_ymd_and_hms(2025, 1, 15, 23, 59, 59).unwrap(),
            },
            access_groups: vec!["MEDIA".to_string()],
            is_active: true,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn approved_record(project_id: Uuid, access: PhaseAccessSet) -> AccreditationRecord {
        AccreditationRecord {
            id: Uuid::new_v4(),
            accreditation_number: "ACC-0042".to_string(),
            project_id,
            first_name: "Aisha".to_string(),
            last_name: "Al-Kuwari".to_string(),
            organization: "Falcon Media".to_string(),
            job_title: "Photographer".to_string(),
            access_group: "MEDIA".to_string(),
            identification: Identification::Qid {
                number: "29135640969".to_string(),
                expiry: NaiveDate::from_ymd_opt(2027, 6, 30).unwrap(),
            },
            access,
            status: AccreditationStatus::Approved,
            qr_token: Some("Xy7Qm2Lp9RtAv4Kc8NdEw3HfJs6Bg1Zu".to_string()),
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            submitted_at: Some(Utc::now()),
            approved_by: Some(Uuid::new_v4()),
            approved_at: Some(Utc::now()),
            rejected_by: None,
            rejected_at: None,
            revoked_by: None,
            revoked_at: None,
            revocation_reason: None,
        }
    }

    fn live_only_access() -> PhaseAccessSet {
        PhaseAccessSet {
            live: PhaseAccess {
                enabled: true,
                starts_at: None,
                ends_at: None,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_evaluate_inside_live_window() {
        let project = project();
        let record = approved_record(project.id, live_only_access());
        let now = Utc.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap();

        let result = evaluate(&record, &project, now);
        assert!(result.was_valid);
        assert_eq!(result.valid_phases, vec![Phase::Live]);
    }

    #[test]
    fn test_evaluate_outside_all_windows() {
        let project = project();
        let record = approved_record(project.id, live_only_access());
        let now = Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap();

        let result = evaluate(&record, &project, now);
        assert!(!result.was_valid);
        assert!(result.valid_phases.is_empty());
    }

    #[test]
    fn test_evaluate_window_bounds_inclusive() {
        let project = project();
        let record = approved_record(project.id, live_only_access());

        let at_start = evaluate(&record, &project, project.live.starts_at);
        assert!(at_start.was_valid);

        let at_end = evaluate(&record, &project, project.live.ends_at);
        assert!(at_end.was_valid);
    }

    #[test]
    fn test_evaluate_disabled_phase_never_valid() {
        let project = project();
        // Bump-in window is active but the record has no bump-in grant
        let record = approved_record(project.id, live_only_access());
        let now = Utc.with_ymd_and_hms(2024, 12, 25, 12, 0, 0).unwrap();

        let result = evaluate(&record, &project, now);
        assert!(!result.was_valid);
        assert!(result.valid_phases.is_empty());
    }

    #[test]
    fn test_evaluate_override_narrows_window() {
        let project = project();
        let mut access = live_only_access();
        access.live.starts_at = Some(Utc.with_ymd_and_hms(2025, 1, 3, 0, 0, 0).unwrap());
        access.live.ends_at = Some(Utc.with_ymd_and_hms(2025, 1, 4, 23, 59, 59).unwrap());
        let record = approved_record(project.id, access);

        // Inside project window but outside the override
        let outside = Utc.with_ymd_and_hms(2025, 1, 8, 12, 0, 0).unwrap();
        assert!(!evaluate(&record, &project, outside).was_valid);

        let inside = Utc.with_ymd_and_hms(2025, 1, 3, 12, 0, 0).unwrap();
        assert!(evaluate(&record, &project, inside).was_valid);
    }

    #[test]
    fn test_evaluate_multiple_phases() {
        let project = project();
        let access = PhaseAccessSet {
            bump_in: PhaseAccess {
                enabled: true,
                starts_at: None,
                ends_at: None,
            },
            live: PhaseAccess {
                enabled: true,
                starts_at: None,
                ends_at: None,
            },
            ..Default::default()
        };
        let record = approved_record(project.id, access);
        // Bump-in and live windows do not overlap here, so only one
        // phase is valid at a time.
        let during_bump_in = Utc.with_ymd_and_hms(2024, 12, 25, 12, 0, 0).unwrap();
        let result = evaluate(&record, &project, during_bump_in);
        assert_eq!(result.valid_phases, vec![Phase::BumpIn]);
    }

    #[test]
    fn test_evaluate_revoked_record_invalid_but_informative() {
        let project = project();
        let mut record = approved_record(project.id, live_only_access());
        record.revoked_by = Some(Uuid::new_v4());
        record.revoked_at = Some(Utc::now());
        record.revocation_reason = Some("Badge reported stolen".to_string());

        let now = Utc.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap();
        let result = evaluate(&record, &project, now);
        // Inside a valid window, but the revocation wins
        assert!(!result.was_valid);
        assert_eq!(result.valid_phases, vec![Phase::Live]);
    }

    #[test]
    fn test_evaluate_non_approved_statuses_invalid() {
        let project = project();
        let now = Utc.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap();

        for status in [
            AccreditationStatus::Draft,
            AccreditationStatus::Pending,
            AccreditationStatus::Rejected,
        ] {
            let mut record = approved_record(project.id, live_only_access());
            record.status = status;
            let result = evaluate(&record, &project, now);
            assert!(!result.was_valid, "status {} must not scan valid", status);
        }
    }

    #[test]
    fn test_evaluation_serializes_phase_names() {
        let project = project();
        let record = approved_record(project.id, live_only_access());
        let now = Utc.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap();

        let json = serde_json::to_value(evaluate(&record, &project, now)).unwrap();
        assert_eq!(json["wasValid"], true);
        assert_eq!(json["validPhases"], serde_json::json!(["LIVE"]));
    }
}
