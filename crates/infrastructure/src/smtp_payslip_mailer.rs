//! SMTP payslip mailer using the `lettre` crate.

use async_trait::async_trait;
use clinipay_application::{PayslipMailer, PayslipMessage};
use clinipay_core::{AppError, AppResult};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// SMTP mailer configuration.
#[derive(Clone)]
pub struct SmtpMailerConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// SMTP username.
    pub username: String,
    /// SMTP password.
    pub password: String,
    /// Sender email address.
    pub from_address: String,
}

/// Production payslip mailer delivering over SMTP.
#[derive(Clone)]
pub struct SmtpPayslipMailer {
    config: SmtpMailerConfig,
}

impl SmtpPayslipMailer {
    /// Creates a new SMTP mailer.
    #[must_use]
    pub fn new(config: SmtpMailerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PayslipMailer for SmtpPayslipMailer {
    async fn send_payslip(&self, message: PayslipMessage) -> AppResult<()> {
        let from = self
            .config
            .from_address
            .parse()
            .map_err(|error| AppError::Internal(format!("invalid from address: {error}")))?;

        let to = message
            .to
            .parse()
            .map_err(|error| AppError::Internal(format!("invalid recipient address: {error}")))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.body)
            .map_err(|error| AppError::Internal(format!("failed to build payslip: {error}")))?;

        let credentials =
            Credentials::new(self.config.username.clone(), self.config.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
            .map_err(|error| {
                AppError::Internal(format!("failed to create SMTP transport: {error}"))
            })?
            .port(self.config.port)
            .credentials(credentials)
            .build();

        mailer
            .send(email)
            .await
            .map_err(|error| AppError::Internal(format!("failed to send payslip: {error}")))?;

        Ok(())
    }
}
