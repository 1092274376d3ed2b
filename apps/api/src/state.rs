use clinipay_application::{PayrollService, SettingsService};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Payroll generation and delivery.
    pub payroll_service: PayrollService,
    /// Clinic-wide settings.
    pub settings_service: SettingsService,
}
