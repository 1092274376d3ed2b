//! Wire types for the HTTP API.
//!
//! Payroll records travel as the JSON-map form the payroll screens
//! consume (`earnings` / `deductions` / `breakdown` objects keyed by
//! field name); conversion to and from the typed domain record lives
//! here, including rejection of maps that contradict the role tag.

mod payroll;
mod settings;

use serde::Serialize;

pub use payroll::{
    GeneratePayrollRequest, IntervalsQuery, MemberQuery, PayIntervalResponse, PayTotalsDto,
    PayrollRecordDto, SendPayrollRequest, UserResponse, YtdAmountsDto,
};
pub use settings::{SiteSettingsDto, TaxBracketDto};

/// Health probe payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Fixed status marker.
    pub status: &'static str,
}
