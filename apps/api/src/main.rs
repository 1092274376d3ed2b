//! Clinipay API composition root.

#![forbid(unsafe_code)]

mod dev_seed;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware::from_fn;
use axum::routing::{get, post, put};
use clinipay_application::{
    CommissionSource, MemberRepository, PayrollLedger, PayrollService, PayslipMailer,
    SettingsRepository, SettingsService, TimesheetSource,
};
use clinipay_core::AppError;
use clinipay_infrastructure::{
    ConsolePayslipMailer, HttpSheetSource, InMemoryMemberRepository, InMemoryPayrollLedger,
    InMemorySettingsRepository, InMemorySheetSource, PostgresMemberRepository,
    PostgresPayrollLedger, PostgresSettingsRepository, SmtpMailerConfig, SmtpPayslipMailer,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

/// The storage-backed ports the services are composed from.
struct Ports {
    members: Arc<dyn MemberRepository>,
    timesheets: Arc<dyn TimesheetSource>,
    commissions: Arc<dyn CommissionSource>,
    settings: Arc<dyn SettingsRepository>,
    ledger: Arc<dyn PayrollLedger>,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);
    let storage_provider = env::var("STORAGE_PROVIDER").unwrap_or_else(|_| "postgres".to_owned());
    let email_provider = env::var("EMAIL_PROVIDER").unwrap_or_else(|_| "console".to_owned());

    let ports = match storage_provider.as_str() {
        "postgres" => {
            let database_url = required_env("DATABASE_URL")?;

            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(&database_url)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to connect to database: {error}"))
                })?;

            sqlx::migrate!("../../crates/infrastructure/migrations")
                .run(&pool)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to run migrations: {error}"))
                })?;

            if migrate_only {
                info!("database migrations applied successfully");
                return Ok(());
            }

            let sheets_base_url = required_non_empty_env("SHEETS_BASE_URL")?;
            let sheets = Arc::new(HttpSheetSource::new(sheets_base_url));

            Ports {
                members: Arc::new(PostgresMemberRepository::new(pool.clone())),
                timesheets: sheets.clone(),
                commissions: sheets,
                settings: Arc::new(PostgresSettingsRepository::new(pool.clone())),
                ledger: Arc::new(PostgresPayrollLedger::new(pool)),
            }
        }
        "memory" => {
            if migrate_only {
                return Err(AppError::Validation(
                    "migrate requires STORAGE_PROVIDER=postgres".to_owned(),
                ));
            }

            let members = Arc::new(InMemoryMemberRepository::new());
            let sheets = Arc::new(InMemorySheetSource::new());
            let settings = Arc::new(InMemorySettingsRepository::new());
            dev_seed::seed(&members, &sheets, &settings).await?;

            Ports {
                members,
                timesheets: sheets.clone(),
                commissions: sheets,
                settings,
                ledger: Arc::new(InMemoryPayrollLedger::new()),
            }
        }
        _ => {
            return Err(AppError::Validation(format!(
                "STORAGE_PROVIDER must be either 'postgres' or 'memory', got '{storage_provider}'"
            )));
        }
    };

    let mailer: Arc<dyn PayslipMailer> = match email_provider.as_str() {
        "smtp" => {
            let smtp_port = required_non_empty_env("SMTP_PORT")?
                .parse::<u16>()
                .map_err(|error| AppError::Validation(format!("invalid SMTP_PORT: {error}")))?;

            let smtp_config = SmtpMailerConfig {
                host: required_non_empty_env("SMTP_HOST")?,
                port: smtp_port,
                username: required_non_empty_env("SMTP_USERNAME")?,
                password: required_non_empty_env("SMTP_PASSWORD")?,
                from_address: required_non_empty_env("SMTP_FROM_ADDRESS")?,
            };
            Arc::new(SmtpPayslipMailer::new(smtp_config))
        }
        "console" => Arc::new(ConsolePayslipMailer::new()),
        _ => {
            return Err(AppError::Validation(format!(
                "EMAIL_PROVIDER must be either 'console' or 'smtp', got '{email_provider}'"
            )));
        }
    };

    let app_state = AppState {
        payroll_service: PayrollService::new(
            ports.members,
            ports.timesheets,
            ports.commissions,
            ports.settings.clone(),
            ports.ledger,
            mailer,
        ),
        settings_service: SettingsService::new(ports.settings),
    };

    let protected_routes = Router::new()
        .route(
            "/api/payroll/{member_id}/get_user/",
            get(handlers::payroll::get_user),
        )
        .route(
            "/api/payroll/{member_id}/intervals/",
            get(handlers::payroll::intervals),
        )
        .route(
            "/api/payroll/{member_id}/generate_payroll/",
            post(handlers::payroll::generate_payroll),
        )
        .route(
            "/api/payroll/{member_id}/send_payroll/",
            post(handlers::payroll::send_payroll),
        )
        .route(
            "/api/site-settings/",
            get(handlers::settings::get_settings).post(handlers::settings::create_settings),
        )
        .route(
            "/api/site-settings/{id}/",
            put(handlers::settings::update_settings),
        )
        .route_layer(from_fn(middleware::require_identity));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static("x-user-subject"),
            HeaderName::from_static("x-user-name"),
            HeaderName::from_static("x-user-email"),
            HeaderName::from_static("x-user-staff"),
        ]);

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Internal(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "clinipay-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
