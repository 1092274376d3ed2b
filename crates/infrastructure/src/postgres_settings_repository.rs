use async_trait::async_trait;
use clinipay_application::SettingsRepository;
use clinipay_core::{AppError, AppResult};
use clinipay_domain::{SiteSettings, TaxBracket};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

/// PostgreSQL-backed storage for the site settings singleton.
#[derive(Clone)]
pub struct PostgresSettingsRepository {
    pool: PgPool,
}

impl PostgresSettingsRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SettingsRow {
    id: Uuid,
    federal_tax_brackets: Json<Vec<TaxBracket>>,
    provincial_tax_brackets: Json<Vec<TaxBracket>>,
    cpp: f64,
    cpp_exemption: f64,
    cpp_cap: f64,
    ei_ee: f64,
    ei_er: f64,
    ei_cap: f64,
    vacation_pay_rate: f64,
    overtime_pay_rate: f64,
}

impl From<SettingsRow> for SiteSettings {
    fn from(row: SettingsRow) -> Self {
        Self {
            id: Some(row.id),
            federal_tax_brackets: row.federal_tax_brackets.0,
            provincial_tax_brackets: row.provincial_tax_brackets.0,
            cpp: row.cpp,
            cpp_exemption: row.cpp_exemption,
            cpp_cap: row.cpp_cap,
            ei_ee: row.ei_ee,
            ei_er: row.ei_er,
            ei_cap: row.ei_cap,
            vacation_pay_rate: row.vacation_pay_rate,
            overtime_pay_rate: row.overtime_pay_rate,
        }
    }
}

#[async_trait]
impl SettingsRepository for PostgresSettingsRepository {
    async fn load(&self) -> AppResult<Option<SiteSettings>> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            SELECT id, federal_tax_brackets, provincial_tax_brackets,
                   cpp, cpp_exemption, cpp_cap, ei_ee, ei_er, ei_cap,
                   vacation_pay_rate, overtime_pay_rate
            FROM site_settings
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load site settings: {error}")))?;

        Ok(row.map(SiteSettings::from))
    }

    async fn insert(&self, settings: SiteSettings) -> AppResult<SiteSettings> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO site_settings (
                id, federal_tax_brackets, provincial_tax_brackets,
                cpp, cpp_exemption, cpp_cap, ei_ee, ei_er, ei_cap,
                vacation_pay_rate, overtime_pay_rate
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(id)
        .bind(Json(&settings.federal_tax_brackets))
        .bind(Json(&settings.provincial_tax_brackets))
        .bind(settings.cpp)
        .bind(settings.cpp_exemption)
        .bind(settings.cpp_cap)
        .bind(settings.ei_ee)
        .bind(settings.ei_er)
        .bind(settings.ei_cap)
        .bind(settings.vacation_pay_rate)
        .bind(settings.overtime_pay_rate)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to store site settings: {error}")))?;

        Ok(SiteSettings {
            id: Some(id),
            ..settings
        })
    }

    async fn update(&self, settings: SiteSettings) -> AppResult<SiteSettings> {
        let id = settings
            .id
            .ok_or_else(|| AppError::Validation("settings update requires an id".to_owned()))?;

        let result = sqlx::query(
            r#"
            UPDATE site_settings
            SET federal_tax_brackets = $2, provincial_tax_brackets = $3,
                cpp = $4, cpp_exemption = $5, cpp_cap = $6,
                ei_ee = $7, ei_er = $8, ei_cap = $9,
                vacation_pay_rate = $10, overtime_pay_rate = $11
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Json(&settings.federal_tax_brackets))
        .bind(Json(&settings.provincial_tax_brackets))
        .bind(settings.cpp)
        .bind(settings.cpp_exemption)
        .bind(settings.cpp_cap)
        .bind(settings.ei_ee)
        .bind(settings.ei_er)
        .bind(settings.ei_cap)
        .bind(settings.vacation_pay_rate)
        .bind(settings.overtime_pay_rate)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update site settings: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("site settings {id}")));
        }
        Ok(settings)
    }
}
