use async_trait::async_trait;
use clinipay_application::PayrollLedger;
use clinipay_core::{AppError, AppResult, ClinicId, MemberId};
use clinipay_domain::PayrollRecord;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

/// PostgreSQL-backed ledger of sent payroll records.
///
/// Records are stored as JSON documents; the ledger is an append-only
/// audit trail, not a queryable reporting store.
#[derive(Clone)]
pub struct PostgresPayrollLedger {
    pool: PgPool,
}

impl PostgresPayrollLedger {
    /// Creates a ledger with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PayrollLedger for PostgresPayrollLedger {
    async fn append(
        &self,
        clinic_id: ClinicId,
        member_id: MemberId,
        record: &PayrollRecord,
        notes: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payroll_records (
                id, clinic_id, member_id, pay_period_start, pay_period_end, record, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(clinic_id.as_uuid())
        .bind(member_id.as_uuid())
        .bind(record.pay_period_start())
        .bind(record.pay_period_end())
        .bind(Json(record))
        .bind(notes)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append payroll record: {error}")))?;

        Ok(())
    }
}
