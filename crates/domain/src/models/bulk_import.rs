//! Bulk CSV import models.
//!
//! The importer is a two-stage pipeline: `validate` turns raw CSV text
//! into per-row results without persisting anything, and `commit` takes
//! the rows back and creates records best-effort.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::accreditation::{Identification, IdentificationType};

/// Maximum data rows accepted in a single import file.
pub const MAX_IMPORT_ROWS: usize = 500;

/// One candidate record as carried between validate and commit.
///
/// Fields mirror the CSV template columns; empty cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
    pub job_title: String,
    pub access_group: String,
    /// Normalized to lowercase `qid` / `passport` during validation.
    pub identification_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qid_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qid_expiry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passport_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passport_country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passport_expiry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hayya_visa_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hayya_visa_expiry: Option<String>,
}

impl CandidateRecord {
    /// The identifier used for duplicate detection: the QID number or the
    /// passport number, whichever the declared type selects.
    pub fn identifier(&self) -> Option<&str> {
        let value = match self.identification_type.as_str() {
            "qid" => self.qid_number.as_deref(),
            "passport" => self.passport_number.as_deref(),
            _ => None,
        };
        value.filter(|v| !v.is_empty())
    }

    /// Builds the typed identification for record creation.
    ///
    /// Only called on validated rows, but date parsing can still fail;
    /// the error lands in the commit outcome's `failed` counter.
    pub fn to_identification(&self) -> Result<Identification, String> {
        let kind: IdentificationType = self
            .identification_type
            .parse()
            .map_err(|_| format!("unknown identification type: {}", self.identification_type))?;

        match kind {
            IdentificationType::Qid => Ok(Identification::Qid {
                number: self.qid_number.clone().unwrap_or_default(),
                expiry: parse_date("QID Expiry", self.qid_expiry.as_deref())?,
            }),
            IdentificationType::Passport => Ok(Identification::Passport {
                number: self.passport_number.clone().unwrap_or_default(),
                country: self.passport_country.clone().unwrap_or_default(),
                expiry: parse_date("Passport Expiry", self.passport_expiry.as_deref())?,
                hayya_visa_number: self.hayya_visa_number.clone().unwrap_or_default(),
                hayya_visa_expiry: parse_date(
                    "Hayya Visa Expiry",
                    self.hayya_visa_expiry.as_deref(),
                )?,
            }),
        }
    }
}

fn parse_date(field: &str, value: Option<&str>) -> Result<NaiveDate, String> {
    let raw = value.unwrap_or("");
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("{} is not a valid date (expected YYYY-MM-DD): {:?}", field, raw))
}

/// Validation result for a single CSV row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowValidation {
    /// 1-based line number in the uploaded file.
    pub row: usize,
    pub record: CandidateRecord,
    pub errors: Vec<String>,
    #[serde(default)]
    pub is_duplicate: bool,
    /// Line number of the first row that used the same identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<usize>,
}

impl RowValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Result of the validation stage; nothing has been persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub rows: Vec<RowValidation>,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub duplicate_count: usize,
}

/// Request to validate raw CSV text against a project.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateImportRequest {
    pub project_id: Uuid,
    pub csv: String,
}

/// One row submitted back for the commit stage.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    #[serde(flatten)]
    pub record: CandidateRecord,
    #[serde(default)]
    pub is_duplicate: bool,
}

/// Request to commit validated rows.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitImportRequest {
    pub project_id: Uuid,
    pub records: Vec<CommitRecord>,
    #[serde(default)]
    pub skip_duplicates: bool,
}

/// Error detail for one failed commit row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitError {
    /// 1-based index within the submitted records.
    pub row: usize,
    pub error: String,
}

/// Outcome of the commit stage. Rows are independent: a failure on one
/// never rolls back or blocks the others.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitOutcome {
    pub imported: u32,
    pub skipped: u32,
    pub failed: u32,
    pub errors: Vec<CommitError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qid_record() -> CandidateRecord {
        CandidateRecord {
            first_name: "Aisha".to_string(),
            last_name: "Al-Kuwari".to_string(),
            organization: "Falcon Media".to_string(),
            job_title: "Photographer".to_string(),
            access_group: "MEDIA".to_string(),
            identification_type: "qid".to_string(),
            qid_number: Some("29135640969".to_string()),
            qid_expiry: Some("2027-06-30".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_identifier_selects_by_type() {
        let qid = qid_record();
        assert_eq!(qid.identifier(), Some("29135640969"));

        let mut passport = qid_record();
        passport.identification_type = "passport".to_string();
        passport.passport_number = Some("P1234567".to_string());
        assert_eq!(passport.identifier(), Some("P1234567"));
    }

    #[test]
    fn test_identifier_ignores_other_variant() {
        // A passport row's qid_number cell never feeds duplicate detection
        let mut record = qid_record();
        record.identification_type = "passport".to_string();
        assert_eq!(record.identifier(), None);
    }

    #[test]
    fn test_identifier_independent_of_person_fields() {
        use fake::faker::name::en::{FirstName, LastName};
        use fake::Fake;

        let mut record = qid_record();
        record.first_name = FirstName().fake();
        record.last_name = LastName().fake();
        assert_eq!(record.identifier(), Some("29135640969"));
    }

    #[test]
    fn test_identifier_empty_is_none() {
        let mut record = qid_record();
        record.qid_number = Some(String::new());
        assert_eq!(record.identifier(), None);
    }

    #[test]
    fn test_to_identification_qid() {
        let identification = qid_record().to_identification().unwrap();
        assert_eq!(identification.identifier(), "29135640969");
        assert!(matches!(identification, Identification::Qid { .. }));
    }

    #[test]
    fn test_to_identification_bad_date() {
        let mut record = qid_record();
        record.qid_expiry = Some("30/06/2027".to_string());
        let err = record.to_identification().unwrap_err();
        assert!(err.contains("QID Expiry"));
    }

    #[test]
    fn test_to_identification_unknown_type() {
        let mut record = qid_record();
        record.identification_type = "visa".to_string();
        assert!(record.to_identification().is_err());
    }

    #[test]
    fn test_commit_request_deserialize() {
        let json = serde_json::json!({
            "projectId": "550e8400-e29b-41d4-a716-446655440001",
            "skipDuplicates": true,
            "records": [{
                "firstName": "Aisha",
                "lastName": "Al-Kuwari",
                "organization": "Falcon Media",
                "jobTitle": "Photographer",
                "accessGroup": "MEDIA",
                "identificationType": "qid",
                "qidNumber": "29135640969",
                "qidExpiry": "2027-06-30",
                "isDuplicate": false
            }]
        });
        let request: CommitImportRequest = serde_json::from_value(json).unwrap();
        assert!(request.skip_duplicates);
        assert_eq!(request.records.len(), 1);
        assert_eq!(request.records[0].record.first_name, "Aisha");
        assert!(!request.records[0].is_duplicate);
    }

    #[test]
    fn test_commit_outcome_serialize() {
        let outcome = CommitOutcome {
            imported: 8,
            skipped: 1,
            failed: 1,
            errors: vec![CommitError {
                row: 4,
                error: "access group not allowed on project".to_string(),
            }],
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["imported"], 8);
        assert_eq!(json["skipped"], 1);
        assert_eq!(json["failed"], 1);
        assert_eq!(json["errors"][0]["row"], 4);
    }

    #[test]
    fn test_candidate_record_skips_empty_cells_in_json() {
        let json = serde_json::to_value(qid_record()).unwrap();
        assert!(json.get("passportNumber").is_none());
        assert_eq!(json["qidNumber"], "29135640969");
    }
}
