//! Console payslip mailer for development. Logs payslips to tracing
//! output instead of delivering them.

use async_trait::async_trait;
use clinipay_application::{PayslipMailer, PayslipMessage};
use clinipay_core::AppResult;
use tracing::info;

/// Development mailer that logs payslips to the console.
#[derive(Clone)]
pub struct ConsolePayslipMailer;

impl ConsolePayslipMailer {
    /// Creates a new console mailer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsolePayslipMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PayslipMailer for ConsolePayslipMailer {
    async fn send_payslip(&self, message: PayslipMessage) -> AppResult<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "--- PAYSLIP (console) ---\nTo: {}\nSubject: {}\n\n{}\n--- END PAYSLIP ---",
            message.to,
            message.subject,
            message.body
        );

        Ok(())
    }
}
