//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_payslip_mailer;
mod http_sheet_source;
mod in_memory_member_repository;
mod in_memory_payroll_ledger;
mod in_memory_settings_repository;
mod in_memory_sheet_source;
mod postgres_member_repository;
mod postgres_payroll_ledger;
mod postgres_settings_repository;
mod smtp_payslip_mailer;

pub use console_payslip_mailer::ConsolePayslipMailer;
pub use http_sheet_source::HttpSheetSource;
pub use in_memory_member_repository::InMemoryMemberRepository;
pub use in_memory_payroll_ledger::{InMemoryPayrollLedger, LedgerEntry};
pub use in_memory_settings_repository::InMemorySettingsRepository;
pub use in_memory_sheet_source::InMemorySheetSource;
pub use postgres_member_repository::PostgresMemberRepository;
pub use postgres_payroll_ledger::PostgresPayrollLedger;
pub use postgres_settings_repository::PostgresSettingsRepository;
pub use smtp_payslip_mailer::{SmtpMailerConfig, SmtpPayslipMailer};
