use async_trait::async_trait;
use chrono::NaiveDate;
use clinipay_core::{AppResult, ClinicId, MemberId};
use clinipay_domain::{PaySchedule, PayrollRecord, RoleType, SiteSettings};
use serde::{Deserialize, Serialize};

/// A member's statutory figures accumulated over the calendar year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct YtdFigures {
    /// Gross earnings paid year to date.
    pub ytd_pay: f64,
    /// Deductions withheld year to date.
    pub ytd_deduction: f64,
    /// Pension contributions year to date.
    pub cpp_contrib: f64,
    /// Insurance premiums year to date.
    pub ei_contrib: f64,
}

/// How a member is paid: role plus the rate matching it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayAssignment {
    /// Compensation role.
    pub role_type: RoleType,
    /// Base wage, set for hourly roles.
    pub hourly_wage: Option<f64>,
    /// Commission fraction, set for commission roles.
    pub commission_rate: Option<f64>,
    /// Pay period policy.
    pub schedule: PaySchedule,
}

/// A clinic member as payroll sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberProfile {
    /// Member identifier.
    pub member_id: MemberId,
    /// Owning clinic.
    pub clinic_id: ClinicId,
    /// Display name shown on stubs and in the payroll screens.
    pub display_name: String,
    /// Payslip delivery address, when the member has one on file.
    pub email: Option<String>,
    /// Year-to-date statutory figures.
    pub ytd: YtdFigures,
    /// Pay assignment; absent when the member is not configured for
    /// payroll yet.
    pub pay: Option<PayAssignment>,
    /// Monthly rent charged at month end, when the member rents space.
    pub monthly_rent: Option<f64>,
    /// Revenue share paid to the member each period.
    pub revenue_share_income: f64,
    /// Revenue share charged to the member each period.
    pub revenue_share_deduction: f64,
}

/// One day of recorded hours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimesheetEntry {
    /// The day the hours were worked.
    pub date: NaiveDate,
    /// Hours worked that day.
    pub hours: f64,
}

/// Billed commission figures for a pay period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommissionSummary {
    /// Billed services before GST.
    pub adjusted_total: f64,
    /// GST collected on the billed services.
    pub tax_gst: f64,
    /// Point-of-sale fees passed through to the member.
    pub pos_fees: f64,
}

/// Payslip email handed to a mailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayslipMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text payslip body.
    pub body: String,
}

/// Repository port for clinic members.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Looks up a member within a clinic.
    async fn find_member(
        &self,
        clinic_id: ClinicId,
        member_id: MemberId,
    ) -> AppResult<Option<MemberProfile>>;

    /// Replaces a member's year-to-date figures.
    async fn update_ytd(
        &self,
        clinic_id: ClinicId,
        member_id: MemberId,
        ytd: YtdFigures,
    ) -> AppResult<()>;
}

/// Source port for recorded working hours.
#[async_trait]
pub trait TimesheetSource: Send + Sync {
    /// Returns daily hours for a member within an inclusive date range.
    async fn daily_hours(
        &self,
        clinic_id: ClinicId,
        member_id: MemberId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<TimesheetEntry>>;
}

/// Source port for billed commission figures.
#[async_trait]
pub trait CommissionSource: Send + Sync {
    /// Returns the commission summary for a member and period, `None`
    /// when nothing was billed.
    async fn commission_summary(
        &self,
        clinic_id: ClinicId,
        member_id: MemberId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Option<CommissionSummary>>;
}

/// Persistence port for sent payroll records.
#[async_trait]
pub trait PayrollLedger: Send + Sync {
    /// Appends a sent record with the staff member's notes.
    async fn append(
        &self,
        clinic_id: ClinicId,
        member_id: MemberId,
        record: &PayrollRecord,
        notes: &str,
    ) -> AppResult<()>;
}

/// Delivery port for payslip emails.
#[async_trait]
pub trait PayslipMailer: Send + Sync {
    /// Delivers one payslip message.
    async fn send_payslip(&self, message: PayslipMessage) -> AppResult<()>;
}

/// Storage port for the clinic-wide settings singleton.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Loads the stored settings, `None` before first save.
    async fn load(&self) -> AppResult<Option<SiteSettings>>;

    /// Stores new settings and returns them with an identifier assigned.
    async fn insert(&self, settings: SiteSettings) -> AppResult<SiteSettings>;

    /// Updates previously stored settings by identifier.
    async fn update(&self, settings: SiteSettings) -> AppResult<SiteSettings>;
}
