//! Scan log repository for database operations.
//!
//! The table is append-only: there is an insert and there are reads,
//! nothing else.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::scan_log::CreateScanLogInput;

use crate::entities::ScanLogEntity;
use crate::metrics::QueryTimer;

const COLUMNS: &str = "id, accreditation_id, recorded_at, was_valid, valid_phases, \
    scanned_by, scanner_name, device, location, notes";

/// Repository for scan-log database operations.
#[derive(Clone)]
pub struct ScanLogRepository {
    pool: PgPool,
}

impl ScanLogRepository {
    /// Creates a new ScanLogRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append one scan log entry.
    pub async fn insert(&self, input: &CreateScanLogInput) -> Result<ScanLogEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_scan_log");
        let valid_phases: Vec<String> = input
            .valid_phases
            .iter()
            .map(|phase| phase.as_str().to_string())
            .collect();
        let result = sqlx::query_as::<_, ScanLogEntity>(&format!(
            r#"
            INSERT INTO scan_logs (
                accreditation_id, was_valid, valid_phases,
                scanned_by, scanner_name, device, location, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(input.accreditation_id)
        .bind(input.was_valid)
        .bind(&valid_phases)
        .bind(input.scanned_by)
        .bind(&input.scanner_name)
        .bind(&input.device)
        .bind(&input.location)
        .bind(&input.notes)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List a record's scan logs, newest first, with an optional
    /// `(recorded_at, id)` cursor from the previous page.
    pub async fn list_for_record(
        &self,
        accreditation_id: Uuid,
        cursor: Option<(DateTime<Utc>, Uuid)>,
        limit: i64,
    ) -> Result<Vec<ScanLogEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_scan_logs");
        let (cursor_at, cursor_id) = match cursor {
            Some((at, id)) => (Some(at), Some(id)),
            None => (None, None),
        };
        let result = sqlx::query_as::<_, ScanLogEntity>(&format!(
            r#"
            SELECT {COLUMNS} FROM scan_logs
            WHERE accreditation_id = $1
              AND ($2::timestamptz IS NULL OR (recorded_at, id) < ($2::timestamptz, $3::uuid))
            ORDER BY recorded_at DESC, id DESC
            LIMIT $4
            "#
        ))
        .bind(accreditation_id)
        .bind(cursor_at)
        .bind(cursor_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}

#[cfg(test)]
mod tests {
    // Note: ScanLogRepository tests require a database connection and are
    // covered by integration tests against a live instance.
}
