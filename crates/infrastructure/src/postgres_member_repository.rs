use async_trait::async_trait;
use clinipay_application::{MemberProfile, MemberRepository, PayAssignment, YtdFigures};
use clinipay_core::{AppError, AppResult, ClinicId, MemberId};
use clinipay_domain::{PayFrequency, PaySchedule, PayrollCutoff, RoleType};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

/// PostgreSQL-backed clinic member repository.
#[derive(Clone)]
pub struct PostgresMemberRepository {
    pool: PgPool,
}

impl PostgresMemberRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    id: Uuid,
    clinic_id: Uuid,
    display_name: String,
    email: Option<String>,
    role_type: Option<String>,
    hourly_wage: Option<f64>,
    commission_rate: Option<f64>,
    pay_frequency: Option<String>,
    payroll_dates: Option<Json<Vec<String>>>,
    monthly_rent: Option<f64>,
    revenue_share_income: f64,
    revenue_share_deduction: f64,
    ytd_pay: f64,
    ytd_deduction: f64,
    cpp_contrib: f64,
    ei_contrib: f64,
}

impl MemberRow {
    fn into_profile(self) -> AppResult<MemberProfile> {
        let pay = match self.role_type {
            Some(role) => {
                let role_type: RoleType = role.parse()?;
                let schedule = parse_schedule(
                    self.pay_frequency.as_deref(),
                    self.payroll_dates.as_ref().map(|dates| dates.0.as_slice()),
                )?;
                Some(PayAssignment {
                    role_type,
                    hourly_wage: self.hourly_wage,
                    commission_rate: self.commission_rate,
                    schedule,
                })
            }
            None => None,
        };

        Ok(MemberProfile {
            member_id: MemberId::from_uuid(self.id),
            clinic_id: ClinicId::from_uuid(self.clinic_id),
            display_name: self.display_name,
            email: self.email,
            ytd: YtdFigures {
                ytd_pay: self.ytd_pay,
                ytd_deduction: self.ytd_deduction,
                cpp_contrib: self.cpp_contrib,
                ei_contrib: self.ei_contrib,
            },
            pay,
            monthly_rent: self.monthly_rent,
            revenue_share_income: self.revenue_share_income,
            revenue_share_deduction: self.revenue_share_deduction,
        })
    }
}

/// Builds the pay schedule from the stored columns. Custom cutoff dates
/// win over the cadence column when both are present.
fn parse_schedule(frequency: Option<&str>, cutoffs: Option<&[String]>) -> AppResult<PaySchedule> {
    if let Some(cutoffs) = cutoffs
        && !cutoffs.is_empty()
    {
        let parsed = cutoffs
            .iter()
            .map(|cutoff| cutoff.parse::<PayrollCutoff>())
            .collect::<AppResult<Vec<_>>>()?;
        return Ok(PaySchedule::CutoffDays(parsed));
    }

    let frequency = frequency.ok_or_else(|| {
        AppError::Validation("member has a role but no pay schedule".to_owned())
    })?;
    Ok(PaySchedule::Cadence(frequency.parse::<PayFrequency>()?))
}

#[async_trait]
impl MemberRepository for PostgresMemberRepository {
    async fn find_member(
        &self,
        clinic_id: ClinicId,
        member_id: MemberId,
    ) -> AppResult<Option<MemberProfile>> {
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, clinic_id, display_name, email, role_type, hourly_wage,
                   commission_rate, pay_frequency, payroll_dates, monthly_rent,
                   revenue_share_income, revenue_share_deduction,
                   ytd_pay, ytd_deduction, cpp_contrib, ei_contrib
            FROM members
            WHERE clinic_id = $1 AND id = $2
            "#,
        )
        .bind(clinic_id.as_uuid())
        .bind(member_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load member: {error}")))?;

        row.map(MemberRow::into_profile).transpose()
    }

    async fn update_ytd(
        &self,
        clinic_id: ClinicId,
        member_id: MemberId,
        ytd: YtdFigures,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE members
            SET ytd_pay = $3, ytd_deduction = $4, cpp_contrib = $5, ei_contrib = $6
            WHERE clinic_id = $1 AND id = $2
            "#,
        )
        .bind(clinic_id.as_uuid())
        .bind(member_id.as_uuid())
        .bind(ytd.ytd_pay)
        .bind(ytd.ytd_deduction)
        .bind(ytd.cpp_contrib)
        .bind(ytd.ei_contrib)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update member YTD: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("member {member_id}")));
        }
        Ok(())
    }
}
