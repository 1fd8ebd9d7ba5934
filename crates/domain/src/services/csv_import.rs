//! CSV bulk import: parsing, per-row validation, and in-file duplicate
//! detection.
//!
//! The file format is the fixed 13-column template. Line 1 is a header
//! and is informational only; cells are consumed by position. Validation
//! accumulates errors per row and never aborts the batch; only a file
//! with no data rows at all is a hard reject.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::models::bulk_import::{CandidateRecord, ImportPreview, RowValidation, MAX_IMPORT_ROWS};

/// The template columns, in fixed order.
pub const TEMPLATE_COLUMNS: [&str; 13] = [
    "First Name",
    "Last Name",
    "Organization",
    "Job Title",
    "Access Group",
    "Identification Type",
    "QID Number",
    "QID Expiry",
    "Passport Number",
    "Passport Country",
    "Passport Expiry",
    "Hayya Visa Number",
    "Hayya Visa Expiry",
];

// Column positions.
const COL_FIRST_NAME: usize = 0;
const COL_LAST_NAME: usize = 1;
const COL_ORGANIZATION: usize = 2;
const COL_JOB_TITLE: usize = 3;
const COL_ACCESS_GROUP: usize = 4;
const COL_IDENTIFICATION_TYPE: usize = 5;
const COL_QID_NUMBER: usize = 6;
const COL_QID_EXPIRY: usize = 7;
const COL_PASSPORT_NUMBER: usize = 8;
const COL_PASSPORT_COUNTRY: usize = 9;
const COL_PASSPORT_EXPIRY: usize = 10;
const COL_HAYYA_VISA_NUMBER: usize = 11;
const COL_HAYYA_VISA_EXPIRY: usize = 12;

lazy_static::lazy_static! {
    static ref QID_REGEX: regex::Regex = regex::Regex::new(r"^\d{11}$").unwrap();
}

/// Structural errors that reject the whole file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportFileError {
    #[error("Import file must contain a header row and at least one data row")]
    TooShort,
    #[error("Import file exceeds the maximum of {MAX_IMPORT_ROWS} data rows")]
    TooManyRows,
}

/// One raw data row: its original line number and trimmed cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    /// 1-based line number in the uploaded file.
    pub line: usize,
    pub cells: Vec<String>,
}

impl CsvRow {
    fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }

    fn optional_cell(&self, index: usize) -> Option<String> {
        let value = self.cell(index);
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }
}

/// Renders the import template: the header plus one sample row per
/// identification type.
pub fn template_csv() -> String {
    let mut out = TEMPLATE_COLUMNS.join(",");
    out.push('\n');
    out.push_str("Aisha,Al-Kuwari,Falcon Media,Photographer,MEDIA,qid,29135640969,2027-06-30,,,,,\n");
    out.push_str(
        "Jonas,Meyer,Stage Works GmbH,Rigger,PRODUCTION,passport,,,P1234567,DEU,2028-02-15,H98765432,2026-01-31\n",
    );
    out
}

/// Splits raw CSV text into data rows.
///
/// Newline split, blank lines dropped, line 1 treated as the header.
/// A file without at least a header and one data row is a hard reject,
/// reported once rather than per-row.
pub fn parse(raw: &str) -> Result<Vec<CsvRow>, ImportFileError> {
    let lines: Vec<(usize, &str)> = raw
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .collect();

    if lines.len() < 2 {
        return Err(ImportFileError::TooShort);
    }

    // Header is informational only; cells are read by position.
    let rows: Vec<CsvRow> = lines[1..]
        .iter()
        .map(|(line, content)| CsvRow {
            line: *line,
            cells: content.split(',').map(|cell| cell.trim().to_string()).collect(),
        })
        .collect();

    if rows.len() > MAX_IMPORT_ROWS {
        return Err(ImportFileError::TooManyRows);
    }

    debug!(rows = rows.len(), "parsed import file");
    Ok(rows)
}

/// Validates parsed rows and flags in-file duplicates.
///
/// Rules are evaluated independently so every problem on a row is
/// reported at once. Duplicate detection keys on the identifier the
/// declared type selects; the first row to use an identifier claims it
/// and later rows are flagged with a reference back to that line.
pub fn validate(rows: &[CsvRow]) -> ImportPreview {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut results = Vec::with_capacity(rows.len());

    for row in rows {
        let mut errors = Vec::new();

        for (index, column) in [
            (COL_FIRST_NAME, "First Name"),
            (COL_LAST_NAME, "Last Name"),
            (COL_ORGANIZATION, "Organization"),
            (COL_JOB_TITLE, "Job Title"),
            (COL_ACCESS_GROUP, "Access Group"),
        ] {
            if row.cell(index).is_empty() {
                errors.push(format!("{} is required", column));
            }
        }

        let raw_type = row.cell(COL_IDENTIFICATION_TYPE);
        let identification_type = raw_type.to_lowercase();
        match identification_type.as_str() {
            "" => errors.push("Identification Type is required".to_string()),
            "qid" => {
                let qid = row.cell(COL_QID_NUMBER);
                if qid.is_empty() {
                    errors.push("QID Number is required".to_string());
                } else if !QID_REGEX.is_match(qid) {
                    errors.push("QID Number must be exactly 11 digits".to_string());
                }
                if row.cell(COL_QID_EXPIRY).is_empty() {
                    errors.push("QID Expiry is required".to_string());
                }
            }
            "passport" => {
                for (index, column) in [
                    (COL_PASSPORT_NUMBER, "Passport Number"),
                    (COL_PASSPORT_COUNTRY, "Passport Country"),
                    (COL_PASSPORT_EXPIRY, "Passport Expiry"),
                    (COL_HAYYA_VISA_NUMBER, "Hayya Visa Number"),
                    (COL_HAYYA_VISA_EXPIRY, "Hayya Visa Expiry"),
                ] {
                    if row.cell(index).is_empty() {
                        errors.push(format!("{} is required", column));
                    }
                }
            }
            _ => errors.push("Identification Type must be \"qid\" or \"passport\"".to_string()),
        }

        let record = CandidateRecord {
            first_name: row.cell(COL_FIRST_NAME).to_string(),
            last_name: row.cell(COL_LAST_NAME).to_string(),
            organization: row.cell(COL_ORGANIZATION).to_string(),
            job_title: row.cell(COL_JOB_TITLE).to_string(),
            access_group: row.cell(COL_ACCESS_GROUP).to_string(),
            identification_type,
            qid_number: row.optional_cell(COL_QID_NUMBER),
            qid_expiry: row.optional_cell(COL_QID_EXPIRY),
            passport_number: row.optional_cell(COL_PASSPORT_NUMBER),
            passport_country: row.optional_cell(COL_PASSPORT_COUNTRY),
            passport_expiry: row.optional_cell(COL_PASSPORT_EXPIRY),
            hayya_visa_number: row.optional_cell(COL_HAYYA_VISA_NUMBER),
            hayya_visa_expiry: row.optional_cell(COL_HAYYA_VISA_EXPIRY),
        };

        let mut is_duplicate = false;
        let mut duplicate_of = None;
        if let Some(identifier) = record.identifier() {
            match seen.get(identifier) {
                Some(&first_line) => {
                    is_duplicate = true;
                    duplicate_of = Some(first_line);
                    errors.push(format!(
                        "Duplicate identification number already used in row {}",
                        first_line
                    ));
                }
                None => {
                    seen.insert(identifier.to_string(), row.line);
                }
            }
        }

        results.push(RowValidation {
            row: row.line,
            record,
            errors,
            is_duplicate,
            duplicate_of,
        });
    }

    let valid_count = results.iter().filter(|r| r.is_valid()).count();
    let duplicate_count = results.iter().filter(|r| r.is_duplicate).count();
    ImportPreview {
        invalid_count: results.len() - valid_count,
        valid_count,
        duplicate_count,
        rows: results,
    }
}

/// Convenience wrapper: parse then validate.
pub fn preview(raw: &str) -> Result<ImportPreview, ImportFileError> {
    let rows = parse(raw)?;
    Ok(validate(&rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "First Name,Last Name,Organization,Job Title,Access Group,Identification Type,QID Number,QID Expiry,Passport Number,Passport Country,Passport Expiry,Hayya Visa Number,Hayya Visa Expiry";

    fn qid_line(first_name: &str, qid: &str) -> String {
        format!(
            "{},Al-Kuwari,Falcon Media,Photographer,MEDIA,qid,{},2027-06-30,,,,,",
            first_name, qid
        )
    }

    fn passport_line(first_name: &str, passport: &str) -> String {
        format!(
            "{},Meyer,Stage Works GmbH,Rigger,PRODUCTION,passport,,,{},DEU,2028-02-15,H98765432,2026-01-31",
            first_name, passport
        )
    }

    fn file(lines: &[String]) -> String {
        let mut out = HEADER.to_string();
        for line in lines {
            out.push('\n');
            out.push_str(line);
        }
        out
    }

    #[test]
    fn test_parse_rejects_empty_file() {
        assert_eq!(parse("").unwrap_err(), ImportFileError::TooShort);
        assert_eq!(parse("\n\n\n").unwrap_err(), ImportFileError::TooShort);
    }

    #[test]
    fn test_parse_rejects_header_only() {
        assert_eq!(parse(HEADER).unwrap_err(), ImportFileError::TooShort);
    }

    #[test]
    fn test_parse_drops_blank_lines() {
        let raw = format!("{}\n\n{}\n\n", HEADER, qid_line("Aisha", "29135640969"));
        let rows = parse(&raw).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].line, 3);
    }

    #[test]
    fn test_parse_trims_cells() {
        let raw = format!(
            "{}\n Aisha , Al-Kuwari ,Falcon Media,Photographer,MEDIA,qid,29135640969,2027-06-30,,,,,",
            HEADER
        );
        let rows = parse(&raw).unwrap();
        assert_eq!(rows[0].cells[0], "Aisha");
        assert_eq!(rows[0].cells[1], "Al-Kuwari");
    }

    #[test]
    fn test_parse_too_many_rows() {
        let lines: Vec<String> = (0..=MAX_IMPORT_ROWS)
            .map(|i| qid_line("Aisha", &format!("{:011}", i)))
            .collect();
        assert_eq!(
            parse(&file(&lines)).unwrap_err(),
            ImportFileError::TooManyRows
        );
    }

    #[test]
    fn test_validate_clean_qid_row() {
        let preview = preview(&file(&[qid_line("Aisha", "29135640969")])).unwrap();
        assert_eq!(preview.valid_count, 1);
        assert_eq!(preview.invalid_count, 0);
        assert!(preview.rows[0].errors.is_empty());
        assert_eq!(preview.rows[0].record.identification_type, "qid");
    }

    #[test]
    fn test_validate_missing_required_fields_named() {
        // Missing first name and organization
        let line = ",Al-Kuwari,,Photographer,MEDIA,qid,29135640969,2027-06-30,,,,,".to_string();
        let preview = preview(&file(&[line])).unwrap();
        let errors = &preview.rows[0].errors;
        assert!(errors.iter().any(|e| e.contains("First Name")));
        assert!(errors.iter().any(|e| e.contains("Organization")));
        assert_eq!(preview.invalid_count, 1);
    }

    #[test]
    fn test_validate_qid_number_format() {
        // 11 digits passes
        let ok = preview(&file(&[qid_line("Aisha", "29135640969")])).unwrap();
        assert!(ok.rows[0].errors.is_empty());

        // Trailing letter fails
        let bad = preview(&file(&[qid_line("Aisha", "2913564096A")])).unwrap();
        assert!(bad.rows[0]
            .errors
            .iter()
            .any(|e| e.contains("exactly 11 digits")));

        // 10 digits fails
        let short = preview(&file(&[qid_line("Aisha", "2913564096")])).unwrap();
        assert!(short.rows[0]
            .errors
            .iter()
            .any(|e| e.contains("exactly 11 digits")));
    }

    #[test]
    fn test_validate_missing_qid_expiry() {
        let line =
            "Aisha,Al-Kuwari,Falcon Media,Photographer,MEDIA,qid,29135640969,,,,,,".to_string();
        let preview = preview(&file(&[line])).unwrap();
        assert!(preview.rows[0]
            .errors
            .iter()
            .any(|e| e == "QID Expiry is required"));
    }

    #[test]
    fn test_validate_identification_type_case_insensitive() {
        let line =
            "Aisha,Al-Kuwari,Falcon Media,Photographer,MEDIA,QID,29135640969,2027-06-30,,,,,"
                .to_string();
        let preview = preview(&file(&[line])).unwrap();
        assert!(preview.rows[0].errors.is_empty());
        // Normalized to lowercase on output
        assert_eq!(preview.rows[0].record.identification_type, "qid");
    }

    #[test]
    fn test_validate_unknown_identification_type() {
        let line =
            "Aisha,Al-Kuwari,Falcon Media,Photographer,MEDIA,visa,,,,,,,".to_string();
        let preview = preview(&file(&[line])).unwrap();
        assert!(preview.rows[0]
            .errors
            .iter()
            .any(|e| e.contains("\"qid\" or \"passport\"")));
    }

    #[test]
    fn test_validate_passport_group_completeness() {
        // Missing hayya visa number and expiry
        let line =
            "Jonas,Meyer,Stage Works GmbH,Rigger,PRODUCTION,passport,,,P1234567,DEU,2028-02-15,,"
                .to_string();
        let preview = preview(&file(&[line])).unwrap();
        let errors = &preview.rows[0].errors;
        assert!(errors.iter().any(|e| e == "Hayya Visa Number is required"));
        assert!(errors.iter().any(|e| e == "Hayya Visa Expiry is required"));
    }

    #[test]
    fn test_validate_errors_accumulate() {
        // Blank row: every required-field rule fires at once
        let line = ",,,,,,,,,,,,".to_string();
        let preview = preview(&file(&[line])).unwrap();
        let errors = &preview.rows[0].errors;
        assert!(errors.len() >= 6);
        assert!(errors.iter().any(|e| e.contains("First Name")));
        assert!(errors.iter().any(|e| e.contains("Identification Type")));
    }

    #[test]
    fn test_duplicate_qid_cites_first_row() {
        let preview = preview(&file(&[
            qid_line("Aisha", "29135640969"),
            qid_line("Maryam", "29135640969"),
        ]))
        .unwrap();

        let first = &preview.rows[0];
        let second = &preview.rows[1];
        assert!(!first.is_duplicate);
        assert!(second.is_duplicate);
        assert_eq!(second.duplicate_of, Some(first.row));
        assert!(second
            .errors
            .iter()
            .any(|e| e.contains(&format!("row {}", first.row))));
        assert_eq!(preview.duplicate_count, 1);
        assert_eq!(preview.valid_count, 1);
    }

    #[test]
    fn test_duplicate_passport_detected() {
        let preview = preview(&file(&[
            passport_line("Jonas", "P1234567"),
            passport_line("Erik", "P1234567"),
        ]))
        .unwrap();
        assert!(preview.rows[1].is_duplicate);
    }

    #[test]
    fn test_duplicate_detection_uses_single_identifier_map() {
        // One map covers both identifier kinds: a passport number equal
        // to an earlier QID number collides.
        let preview = preview(&file(&[
            qid_line("Aisha", "29135640969"),
            passport_line("Jonas", "29135640969"),
        ]))
        .unwrap();
        assert!(preview.rows[1].is_duplicate);
    }

    #[test]
    fn test_duplicate_on_invalid_row_still_flagged() {
        let bad_row = qid_line("", "29135640969"); // missing first name
        let preview = preview(&file(&[qid_line("Aisha", "29135640969"), bad_row])).unwrap();
        let second = &preview.rows[1];
        assert!(second.is_duplicate);
        // Duplicate error in addition to the validation errors
        assert!(second.errors.len() >= 2);
    }

    #[test]
    fn test_three_way_duplicate_all_cite_first() {
        let preview = preview(&file(&[
            qid_line("A", "29135640969"),
            qid_line("B", "29135640969"),
            qid_line("C", "29135640969"),
        ]))
        .unwrap();
        let first_line = preview.rows[0].row;
        assert_eq!(preview.rows[1].duplicate_of, Some(first_line));
        assert_eq!(preview.rows[2].duplicate_of, Some(first_line));
    }

    #[test]
    fn test_template_roundtrip() {
        let preview = preview(&template_csv()).unwrap();
        assert_eq!(preview.rows.len(), 2);
        assert_eq!(preview.valid_count, 2);
        assert_eq!(preview.invalid_count, 0);
        assert_eq!(preview.duplicate_count, 0);
    }

    #[test]
    fn test_template_has_13_columns() {
        let header = template_csv();
        let first_line = header.lines().next().unwrap();
        assert_eq!(first_line.split(',').count(), 13);
        assert_eq!(first_line.split(',').next().unwrap(), "First Name");
    }

    #[test]
    fn test_short_row_missing_cells_treated_as_empty() {
        let line = "Aisha,Al-Kuwari,Falcon Media".to_string();
        let preview = preview(&file(&[line])).unwrap();
        let errors = &preview.rows[0].errors;
        assert!(errors.iter().any(|e| e.contains("Job Title")));
        assert!(errors.iter().any(|e| e.contains("Identification Type")));
    }
}
