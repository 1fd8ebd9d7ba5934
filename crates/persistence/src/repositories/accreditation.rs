//! Accreditation repository for database operations.
//!
//! Status transitions are guarded in SQL (`WHERE status = ...`), so the
//! unique row update is the race guard; callers decide legality with the
//! domain state machine first to report precise errors.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::accreditation::{Identification, PhaseAccessSet};

use crate::entities::{AccreditationEntity, AccreditationStatusDb, IdentificationTypeDb};
use crate::metrics::QueryTimer;

const COLUMNS: &str = "id, accreditation_number, project_id, first_name, last_name, \
    organization, job_title, access_group, identification_type, qid_number, qid_expiry, \
    passport_number, passport_country, passport_expiry, hayya_visa_number, hayya_visa_expiry, \
    bump_in_access, bump_in_starts_at, bump_in_ends_at, live_access, live_starts_at, \
    live_ends_at, bump_out_access, bump_out_starts_at, bump_out_ends_at, status, qr_token, \
    created_by, created_at, updated_at, submitted_at, approved_by, approved_at, rejected_by, \
    rejected_at, revoked_by, revoked_at, revocation_reason";

/// Input for creating an accreditation record.
///
/// The record always lands in DRAFT; the accreditation number is
/// assigned from a database sequence.
#[derive(Debug, Clone)]
pub struct NewAccreditation {
    pub project_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
    pub job_title: String,
    pub access_group: String,
    pub identification: Identification,
    pub access: PhaseAccessSet,
    pub created_by: Uuid,
}

/// Identification flattened into its column group.
struct IdentificationColumns {
    identification_type: IdentificationTypeDb,
    qid_number: Option<String>,
    qid_expiry: Option<NaiveDate>,
    passport_number: Option<String>,
    passport_country: Option<String>,
    passport_expiry: Option<NaiveDate>,
    hayya_visa_number: Option<String>,
    hayya_visa_expiry: Option<NaiveDate>,
}

/// Splitting the enum keeps the other variant's columns NULL, which is
/// what enforces the mutual-exclusion invariant on type switches.
fn identification_columns(identification: &Identification) -> IdentificationColumns {
    match identification {
        Identification::Qid { number, expiry } => IdentificationColumns {
            identification_type: IdentificationTypeDb::Qid,
            qid_number: Some(number.clone()),
            qid_expiry: Some(*expiry),
            passport_number: None,
            passport_country: None,
            passport_expiry: None,
            hayya_visa_number: None,
            hayya_visa_expiry: None,
        },
        Identification::Passport {
            number,
            country,
            expiry,
            hayya_visa_number,
            hayya_visa_expiry,
        } => IdentificationColumns {
            identification_type: IdentificationTypeDb::Passport,
            qid_number: None,
            qid_expiry: None,
            passport_number: Some(number.clone()),
            passport_country: Some(country.clone()),
            passport_expiry: Some(*expiry),
            hayya_visa_number: Some(hayya_visa_number.clone()),
            hayya_visa_expiry: Some(*hayya_visa_expiry),
        },
    }
}

/// Repository for accreditation-related database operations.
#[derive(Clone)]
pub struct AccreditationRepository {
    pool: PgPool,
}

impl AccreditationRepository {
    /// Creates a new AccreditationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new record in DRAFT status.
    pub async fn create(
        &self,
        input: &NewAccreditation,
    ) -> Result<AccreditationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_accreditation");
        let ident = identification_columns(&input.identification);
        let result = sqlx::query_as::<_, AccreditationEntity>(&format!(
            r#"
            INSERT INTO accreditations (
                accreditation_number, project_id,
                first_name, last_name, organization, job_title, access_group,
                identification_type, qid_number, qid_expiry,
                passport_number, passport_country, passport_expiry,
                hayya_visa_number, hayya_visa_expiry,
                bump_in_access, bump_in_starts_at, bump_in_ends_at,
                live_access, live_starts_at, live_ends_at,
                bump_out_access, bump_out_starts_at, bump_out_ends_at,
                created_by
            )
            VALUES (
                'ACC-' || lpad(nextval('accreditation_number_seq')::text, 4, '0'),
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24
            )
            RETURNING {COLUMNS}
            "#
        ))
        .bind(input.project_id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.organization)
        .bind(&input.job_title)
        .bind(&input.access_group)
        .bind(ident.identification_type)
        .bind(&ident.qid_number)
        .bind(ident.qid_expiry)
        .bind(&ident.passport_number)
        .bind(&ident.passport_country)
        .bind(ident.passport_expiry)
        .bind(&ident.hayya_visa_number)
        .bind(ident.hayya_visa_expiry)
        .bind(input.access.bump_in.enabled)
        .bind(input.access.bump_in.starts_at)
        .bind(input.access.bump_in.ends_at)
        .bind(input.access.live.enabled)
        .bind(input.access.live.starts_at)
        .bind(input.access.live.ends_at)
        .bind(input.access.bump_out.enabled)
        .bind(input.access.bump_out.starts_at)
        .bind(input.access.bump_out.ends_at)
        .bind(input.created_by)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find record by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<AccreditationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_accreditation_by_id");
        let result = sqlx::query_as::<_, AccreditationEntity>(&format!(
            "SELECT {COLUMNS} FROM accreditations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find record by QR token.
    pub async fn find_by_token(
        &self,
        token: &str,
    ) -> Result<Option<AccreditationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_accreditation_by_token");
        let result = sqlx::query_as::<_, AccreditationEntity>(&format!(
            "SELECT {COLUMNS} FROM accreditations WHERE qr_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find record by accreditation number (already normalized).
    pub async fn find_by_number(
        &self,
        accreditation_number: &str,
    ) -> Result<Option<AccreditationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_accreditation_by_number");
        let result = sqlx::query_as::<_, AccreditationEntity>(&format!(
            "SELECT {COLUMNS} FROM accreditations WHERE accreditation_number = $1"
        ))
        .bind(accreditation_number)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List records with optional project/status filters, newest first.
    pub async fn list(
        &self,
        project_id: Option<Uuid>,
        status: Option<AccreditationStatusDb>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AccreditationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_accreditations");
        let result = sqlx::query_as::<_, AccreditationEntity>(&format!(
            r#"
            SELECT {COLUMNS} FROM accreditations
            WHERE ($1::uuid IS NULL OR project_id = $1)
              AND ($2::accreditation_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(project_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count records matching the list filters.
    pub async fn count(
        &self,
        project_id: Option<Uuid>,
        status: Option<AccreditationStatusDb>,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_accreditations");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM accreditations
            WHERE ($1::uuid IS NULL OR project_id = $1)
              AND ($2::accreditation_status IS NULL OR status = $2)
            "#,
        )
        .bind(project_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Update person, identification, and access fields.
    ///
    /// Only DRAFT and PENDING records are editable; the guard makes the
    /// update a no-op if the record was decided concurrently.
    pub async fn update_details(
        &self,
        id: Uuid,
        input: &NewAccreditation,
    ) -> Result<Option<AccreditationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_accreditation");
        let ident = identification_columns(&input.identification);
        let result = sqlx::query_as::<_, AccreditationEntity>(&format!(
            r#"
            UPDATE accreditations
            SET first_name = $2, last_name = $3, organization = $4, job_title = $5,
                access_group = $6,
                identification_type = $7,
                qid_number = $8, qid_expiry = $9,
                passport_number = $10, passport_country = $11, passport_expiry = $12,
                hayya_visa_number = $13, hayya_visa_expiry = $14,
                bump_in_access = $15, bump_in_starts_at = $16, bump_in_ends_at = $17,
                live_access = $18, live_starts_at = $19, live_ends_at = $20,
                bump_out_access = $21, bump_out_starts_at = $22, bump_out_ends_at = $23,
                updated_at = now()
            WHERE id = $1 AND status IN ('draft', 'pending')
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.organization)
        .bind(&input.job_title)
        .bind(&input.access_group)
        .bind(ident.identification_type)
        .bind(&ident.qid_number)
        .bind(ident.qid_expiry)
        .bind(&ident.passport_number)
        .bind(&ident.passport_country)
        .bind(ident.passport_expiry)
        .bind(&ident.hayya_visa_number)
        .bind(ident.hayya_visa_expiry)
        .bind(input.access.bump_in.enabled)
        .bind(input.access.bump_in.starts_at)
        .bind(input.access.bump_in.ends_at)
        .bind(input.access.live.enabled)
        .bind(input.access.live.starts_at)
        .bind(input.access.live.ends_at)
        .bind(input.access.bump_out.enabled)
        .bind(input.access.bump_out.starts_at)
        .bind(input.access.bump_out.ends_at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// DRAFT → PENDING.
    pub async fn submit(&self, id: Uuid) -> Result<Option<AccreditationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("submit_accreditation");
        let result = sqlx::query_as::<_, AccreditationEntity>(&format!(
            r#"
            UPDATE accreditations
            SET status = 'pending', submitted_at = now(), updated_at = now()
            WHERE id = $1 AND status = 'draft'
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// PENDING → APPROVED, assigning the QR token if none exists.
    ///
    /// The unique index on qr_token guards against double-issuance.
    pub async fn approve(
        &self,
        id: Uuid,
        approved_by: Uuid,
        token: &str,
    ) -> Result<Option<AccreditationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("approve_accreditation");
        let result = sqlx::query_as::<_, AccreditationEntity>(&format!(
            r#"
            UPDATE accreditations
            SET status = 'approved',
                qr_token = COALESCE(qr_token, $3),
                approved_by = $2, approved_at = now(), updated_at = now()
            WHERE id = $1 AND status = 'pending'
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(approved_by)
        .bind(token)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// PENDING → REJECTED.
    pub async fn reject(
        &self,
        id: Uuid,
        rejected_by: Uuid,
    ) -> Result<Option<AccreditationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("reject_accreditation");
        let result = sqlx::query_as::<_, AccreditationEntity>(&format!(
            r#"
            UPDATE accreditations
            SET status = 'rejected', rejected_by = $2, rejected_at = now(), updated_at = now()
            WHERE id = $1 AND status = 'pending'
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(rejected_by)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Stamp revocation metadata on an APPROVED record.
    ///
    /// The status column and QR token are left untouched; scans treat
    /// the record as invalid from here on.
    pub async fn revoke(
        &self,
        id: Uuid,
        revoked_by: Uuid,
        reason: &str,
    ) -> Result<Option<AccreditationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("revoke_accreditation");
        let result = sqlx::query_as::<_, AccreditationEntity>(&format!(
            r#"
            UPDATE accreditations
            SET revoked_by = $2, revoked_at = now(), revocation_reason = $3, updated_at = now()
            WHERE id = $1 AND status = 'approved' AND revoked_at IS NULL
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(revoked_by)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
