//! Application services and ports for Clinipay payroll.

#![forbid(unsafe_code)]

mod payroll_ports;
mod payroll_service;
mod record_editor;
mod settings_service;

pub use payroll_ports::{
    CommissionSource, CommissionSummary, MemberProfile, MemberRepository, PayAssignment,
    PayrollLedger, PayslipMailer, PayslipMessage, SettingsRepository, TimesheetEntry,
    TimesheetSource, YtdFigures,
};
pub use payroll_service::PayrollService;
pub use record_editor::RecordEditor;
pub use settings_service::SettingsService;
