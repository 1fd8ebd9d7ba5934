//! Common validation utilities.

use chrono::{DateTime, Utc};
use validator::ValidationError;

/// Maximum length accepted for free-text person fields.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum length accepted for an access group name.
pub const MAX_ACCESS_GROUP_LENGTH: usize = 50;

lazy_static::lazy_static! {
    static ref QID_REGEX: regex::Regex = regex::Regex::new(r"^\d{11}$").unwrap();
    static ref ACCREDITATION_NUMBER_REGEX: regex::Regex =
        regex::Regex::new(r"^ACC-\d{4,}$").unwrap();
}

/// Validates that a QID number is exactly 11 digits.
pub fn validate_qid_number(qid: &str) -> Result<(), ValidationError> {
    if QID_REGEX.is_match(qid) {
        Ok(())
    } else {
        let mut err = ValidationError::new("qid_format");
        err.message = Some("QID number must be exactly 11 digits".into());
        Err(err)
    }
}

/// Validates an accreditation number in its normalized (uppercase) form.
pub fn validate_accreditation_number(number: &str) -> Result<(), ValidationError> {
    if ACCREDITATION_NUMBER_REGEX.is_match(number) {
        Ok(())
    } else {
        let mut err = ValidationError::new("accreditation_number_format");
        err.message = Some("Accreditation number must match ACC-#### format".into());
        Err(err)
    }
}

/// Normalizes a manually entered accreditation number before lookup.
///
/// Lookups are case-insensitive on input but the column stores uppercase.
pub fn normalize_accreditation_number(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Validates that a phase window is ordered (start ≤ end).
pub fn validate_phase_range(
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if starts_at <= ends_at {
        Ok(())
    } else {
        let mut err = ValidationError::new("phase_range");
        err.message = Some("Phase start must not be after phase end".into());
        Err(err)
    }
}

/// Validates an access group name (non-empty, bounded length).
pub fn validate_access_group(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_ACCESS_GROUP_LENGTH {
        let mut err = ValidationError::new("access_group");
        err.message = Some("Access group must be 1-50 characters".into());
        return Err(err);
    }
    Ok(())
}
