//! Payroll domain model for Clinipay.
//!
//! This crate holds the pure business rules: pay interval generation,
//! payroll records with role-conditional earnings, the pay stub layout,
//! clinic settings with tax bracket schedules, and the statutory
//! deduction arithmetic. Nothing in here performs I/O.

#![forbid(unsafe_code)]

/// Currency rounding, formatting and lenient parsing.
pub mod money;
/// Pay stub presentation derived from a payroll record.
pub mod paystub;
/// Payroll records and addressable pay fields.
pub mod record;
/// Compensation role classification.
pub mod role;
/// Pay schedules and pay interval generation.
pub mod schedule;
/// Clinic settings and the tax bracket schedule editor.
pub mod settings;
/// Progressive tax and statutory contribution arithmetic.
pub mod tax;

pub use money::{format_currency, parse_currency, round_cents};
pub use paystub::PayStub;
pub use record::{
    CommissionEarnings, DeductionField, EarningsDetail, EarningsField, HourlyEarnings,
    PayTotals, PayrollField, PayrollRecord, PayrollRecordParts, StatutoryDeductions, YtdAmounts,
};
pub use role::RoleType;
pub use schedule::{PayFrequency, PayInterval, PaySchedule, PayrollCutoff};
pub use settings::{BracketDraft, BracketScheduleEditor, SiteSettings, TaxBracket};
pub use tax::{ContributionRoom, PeriodDeductions};
