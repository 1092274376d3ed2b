use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use clinipay_core::{AppError, AppResult, ClinicId, MemberId, UserIdentity};
use clinipay_domain::{
    EarningsDetail, PayFrequency, PaySchedule, PayrollRecord, RoleType, SiteSettings, TaxBracket,
};
use tokio::sync::Mutex;

use crate::payroll_ports::{
    CommissionSource, CommissionSummary, MemberProfile, MemberRepository, PayAssignment,
    PayrollLedger, PayslipMailer, PayslipMessage, SettingsRepository, TimesheetEntry,
    TimesheetSource, YtdFigures,
};

use super::{PayrollService, contains_month_end, split_overtime};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_else(|| unreachable!())
}

fn staff() -> UserIdentity {
    UserIdentity::new("staff-1", "Robin Clerk", Some("robin@clinic.test".to_owned()), true)
}

fn practitioner() -> UserIdentity {
    UserIdentity::new("member-1", "Dana Reid", None, false)
}

/// Settings with zero tax and contribution rates so earnings math can be
/// asserted without statutory noise.
fn zero_rate_settings() -> SiteSettings {
    SiteSettings {
        id: None,
        federal_tax_brackets: vec![TaxBracket {
            tax_rate: 0.0,
            min_income: 0.0,
            max_income: 10_000_000.0,
        }],
        provincial_tax_brackets: vec![TaxBracket {
            tax_rate: 0.0,
            min_income: 0.0,
            max_income: 10_000_000.0,
        }],
        cpp: 0.0,
        cpp_exemption: 0.0,
        cpp_cap: 1.0,
        ei_ee: 0.0,
        ei_er: 0.0,
        ei_cap: 1.0,
        vacation_pay_rate: 0.04,
        overtime_pay_rate: 1.5,
    }
}

fn hourly_employee_profile(clinic_id: ClinicId, member_id: MemberId) -> MemberProfile {
    MemberProfile {
        member_id,
        clinic_id,
        display_name: "Sam Ota".to_owned(),
        email: Some("sam@clinic.test".to_owned()),
        ytd: YtdFigures::default(),
        pay: Some(PayAssignment {
            role_type: RoleType::HourlyEmployee,
            hourly_wage: Some(30.0),
            commission_rate: None,
            schedule: PaySchedule::Cadence(PayFrequency::Weekly),
        }),
        monthly_rent: None,
        revenue_share_income: 0.0,
        revenue_share_deduction: 0.0,
    }
}

fn commission_employee_profile(clinic_id: ClinicId, member_id: MemberId) -> MemberProfile {
    MemberProfile {
        member_id,
        clinic_id,
        display_name: "Dana Reid".to_owned(),
        email: Some("dana@clinic.test".to_owned()),
        ytd: YtdFigures {
            ytd_pay: 5_000.0,
            ytd_deduction: 900.0,
            cpp_contrib: 300.0,
            ei_contrib: 88.0,
        },
        pay: Some(PayAssignment {
            role_type: RoleType::CommissionEmployee,
            hourly_wage: None,
            commission_rate: Some(0.45),
            schedule: PaySchedule::Cadence(PayFrequency::SemiMonthly),
        }),
        monthly_rent: None,
        revenue_share_income: 0.0,
        revenue_share_deduction: 0.0,
    }
}

struct FakeMembers {
    members: Mutex<Vec<MemberProfile>>,
    updated: Mutex<Vec<YtdFigures>>,
}

impl FakeMembers {
    fn with(members: Vec<MemberProfile>) -> Self {
        Self {
            members: Mutex::new(members),
            updated: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MemberRepository for FakeMembers {
    async fn find_member(
        &self,
        clinic_id: ClinicId,
        member_id: MemberId,
    ) -> AppResult<Option<MemberProfile>> {
        let members = self.members.lock().await;
        Ok(members
            .iter()
            .find(|member| member.clinic_id == clinic_id && member.member_id == member_id)
            .cloned())
    }

    async fn update_ytd(
        &self,
        _clinic_id: ClinicId,
        _member_id: MemberId,
        ytd: YtdFigures,
    ) -> AppResult<()> {
        self.updated.lock().await.push(ytd);
        Ok(())
    }
}

struct FakeTimesheets {
    entries: Vec<TimesheetEntry>,
}

#[async_trait]
impl TimesheetSource for FakeTimesheets {
    async fn daily_hours(
        &self,
        _clinic_id: ClinicId,
        _member_id: MemberId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<TimesheetEntry>> {
        Ok(self
            .entries
            .iter()
            .copied()
            .filter(|entry| entry.date >= start && entry.date <= end)
            .collect())
    }
}

struct FakeCommissions {
    summary: Option<CommissionSummary>,
}

#[async_trait]
impl CommissionSource for FakeCommissions {
    async fn commission_summary(
        &self,
        _clinic_id: ClinicId,
        _member_id: MemberId,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> AppResult<Option<CommissionSummary>> {
        Ok(self.summary)
    }
}

struct FakeSettings {
    settings: Option<SiteSettings>,
}

#[async_trait]
impl SettingsRepository for FakeSettings {
    async fn load(&self) -> AppResult<Option<SiteSettings>> {
        Ok(self.settings.clone())
    }

    async fn insert(&self, settings: SiteSettings) -> AppResult<SiteSettings> {
        Ok(settings)
    }

    async fn update(&self, settings: SiteSettings) -> AppResult<SiteSettings> {
        Ok(settings)
    }
}

#[derive(Default)]
struct FakeLedger {
    appended: Mutex<Vec<(MemberId, String)>>,
}

#[async_trait]
impl PayrollLedger for FakeLedger {
    async fn append(
        &self,
        _clinic_id: ClinicId,
        member_id: MemberId,
        _record: &PayrollRecord,
        notes: &str,
    ) -> AppResult<()> {
        self.appended.lock().await.push((member_id, notes.to_owned()));
        Ok(())
    }
}

#[derive(Default)]
struct FakeMailer {
    fail: bool,
    sent: Mutex<Vec<PayslipMessage>>,
}

#[async_trait]
impl PayslipMailer for FakeMailer {
    async fn send_payslip(&self, message: PayslipMessage) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Internal("smtp connection refused".to_owned()));
        }
        self.sent.lock().await.push(message);
        Ok(())
    }
}

struct Harness {
    service: PayrollService,
    members: Arc<FakeMembers>,
    ledger: Arc<FakeLedger>,
    mailer: Arc<FakeMailer>,
}

fn harness(
    members: Vec<MemberProfile>,
    entries: Vec<TimesheetEntry>,
    summary: Option<CommissionSummary>,
    settings: Option<SiteSettings>,
    mail_fails: bool,
) -> Harness {
    let members = Arc::new(FakeMembers::with(members));
    let ledger = Arc::new(FakeLedger::default());
    let mailer = Arc::new(FakeMailer {
        fail: mail_fails,
        sent: Mutex::new(Vec::new()),
    });
    let service = PayrollService::new(
        Arc::clone(&members) as Arc<dyn MemberRepository>,
        Arc::new(FakeTimesheets { entries }),
        Arc::new(FakeCommissions { summary }),
        Arc::new(FakeSettings { settings }),
        Arc::clone(&ledger) as Arc<dyn PayrollLedger>,
        Arc::clone(&mailer) as Arc<dyn PayslipMailer>,
    );
    Harness {
        service,
        members,
        ledger,
        mailer,
    }
}

fn daily(entries: &[(NaiveDate, f64)]) -> Vec<TimesheetEntry> {
    entries
        .iter()
        .map(|(date, hours)| TimesheetEntry {
            date: *date,
            hours: *hours,
        })
        .collect()
}

#[tokio::test]
async fn non_staff_cannot_generate_payroll() {
    let clinic_id = ClinicId::new();
    let member_id = MemberId::new();
    let harness = harness(
        vec![hourly_employee_profile(clinic_id, member_id)],
        Vec::new(),
        None,
        Some(zero_rate_settings()),
        false,
    );

    let result = harness
        .service
        .generate_payroll(
            &practitioner(),
            clinic_id,
            member_id,
            date(2024, 6, 3),
            date(2024, 6, 9),
        )
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn missing_settings_is_a_validation_error() {
    let clinic_id = ClinicId::new();
    let member_id = MemberId::new();
    let harness = harness(
        vec![hourly_employee_profile(clinic_id, member_id)],
        daily(&[(date(2024, 6, 3), 8.0)]),
        None,
        None,
        false,
    );

    let result = harness
        .service
        .generate_payroll(&staff(), clinic_id, member_id, date(2024, 6, 3), date(2024, 6, 9))
        .await;
    match result {
        Err(AppError::Validation(message)) => {
            assert!(message.contains("site settings"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_member_is_not_found() {
    let clinic_id = ClinicId::new();
    let harness = harness(Vec::new(), Vec::new(), None, Some(zero_rate_settings()), false);

    let result = harness
        .service
        .member_for_payroll(&staff(), clinic_id, MemberId::new())
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn students_are_rejected_before_any_computation() {
    let clinic_id = ClinicId::new();
    let member_id = MemberId::new();
    let mut profile = hourly_employee_profile(clinic_id, member_id);
    if let Some(pay) = profile.pay.as_mut() {
        pay.role_type = RoleType::Student;
    }
    let harness = harness(vec![profile], Vec::new(), None, Some(zero_rate_settings()), false);

    let result = harness
        .service
        .generate_payroll(&staff(), clinic_id, member_id, date(2024, 6, 3), date(2024, 6, 9))
        .await;
    match result {
        Err(AppError::Validation(message)) => {
            assert!(message.contains("not eligible for payroll"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn hourly_week_over_forty_hours_splits_into_overtime() {
    let clinic_id = ClinicId::new();
    let member_id = MemberId::new();
    // Nine hours a day, Monday through Friday: 45 hours in one week.
    let entries = daily(&[
        (date(2024, 6, 3), 9.0),
        (date(2024, 6, 4), 9.0),
        (date(2024, 6, 5), 9.0),
        (date(2024, 6, 6), 9.0),
        (date(2024, 6, 7), 9.0),
    ]);
    let harness = harness(
        vec![hourly_employee_profile(clinic_id, member_id)],
        entries,
        None,
        Some(zero_rate_settings()),
        false,
    );

    let record = harness
        .service
        .generate_payroll(&staff(), clinic_id, member_id, date(2024, 6, 3), date(2024, 6, 9))
        .await
        .unwrap_or_else(|_| unreachable!());

    let EarningsDetail::Hourly(hourly) = record.earnings() else {
        unreachable!()
    };
    assert_eq!(hourly.regular_hours, 40.0);
    assert_eq!(hourly.overtime_hours, 5.0);
    assert_eq!(hourly.regular_pay, 1_200.0);
    assert_eq!(hourly.overtime_pay, 225.0);
    // Vacation at 4% of 1425.00.
    assert_eq!(hourly.vacation_pay, 57.0);
    assert_eq!(record.totals().total_earnings, 1_482.0);
}

#[tokio::test]
async fn partial_start_week_counts_earlier_hours_toward_overtime() {
    let clinic_id = ClinicId::new();
    let member_id = MemberId::new();
    // 38 hours Monday through Wednesday fall before the period, 10 more
    // inside it: the week's 8 overtime hours all land in this run.
    let entries = daily(&[
        (date(2024, 6, 3), 13.0),
        (date(2024, 6, 4), 13.0),
        (date(2024, 6, 5), 12.0),
        (date(2024, 6, 6), 6.0),
        (date(2024, 6, 7), 4.0),
    ]);
    let harness = harness(
        vec![hourly_employee_profile(clinic_id, member_id)],
        entries,
        None,
        Some(zero_rate_settings()),
        false,
    );

    let record = harness
        .service
        .generate_payroll(&staff(), clinic_id, member_id, date(2024, 6, 6), date(2024, 6, 9))
        .await
        .unwrap_or_else(|_| unreachable!());

    let EarningsDetail::Hourly(hourly) = record.earnings() else {
        unreachable!()
    };
    assert_eq!(hourly.overtime_hours, 8.0);
    assert_eq!(hourly.regular_hours, 2.0);
}

#[tokio::test]
async fn no_recorded_hours_is_a_validation_error() {
    let clinic_id = ClinicId::new();
    let member_id = MemberId::new();
    let harness = harness(
        vec![hourly_employee_profile(clinic_id, member_id)],
        Vec::new(),
        None,
        Some(zero_rate_settings()),
        false,
    );

    let result = harness
        .service
        .generate_payroll(&staff(), clinic_id, member_id, date(2024, 6, 3), date(2024, 6, 9))
        .await;
    match result {
        Err(AppError::Validation(message)) => {
            assert!(message.contains("no hours recorded"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn commission_employee_record_splits_gross_by_rate() {
    let clinic_id = ClinicId::new();
    let member_id = MemberId::new();
    let harness = harness(
        vec![commission_employee_profile(clinic_id, member_id)],
        Vec::new(),
        Some(CommissionSummary {
            adjusted_total: 1_000.0,
            tax_gst: 50.0,
            pos_fees: 12.5,
        }),
        Some(zero_rate_settings()),
        false,
    );

    let record = harness
        .service
        .generate_payroll(&staff(), clinic_id, member_id, date(2024, 6, 1), date(2024, 6, 15))
        .await
        .unwrap_or_else(|_| unreachable!());

    let EarningsDetail::Commission(commission) = record.earnings() else {
        unreachable!()
    };
    assert_eq!(commission.gross_income, 1_050.0);
    assert_eq!(commission.commission_deduction, 577.5);
    // Vacation at 4% of the 472.50 commission income.
    assert_eq!(commission.vacation_pay, 18.9);
    assert_eq!(record.ytd().earnings, 5_000.0 + record.totals().total_earnings);
}

#[tokio::test]
async fn missing_commission_activity_is_a_validation_error() {
    let clinic_id = ClinicId::new();
    let member_id = MemberId::new();
    let harness = harness(
        vec![commission_employee_profile(clinic_id, member_id)],
        Vec::new(),
        None,
        Some(zero_rate_settings()),
        false,
    );

    let result = harness
        .service
        .generate_payroll(&staff(), clinic_id, member_id, date(2024, 6, 1), date(2024, 6, 15))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn rent_applies_only_when_the_period_crosses_a_month_end() {
    let clinic_id = ClinicId::new();
    let member_id = MemberId::new();
    let mut profile = commission_employee_profile(clinic_id, member_id);
    profile.monthly_rent = Some(500.0);
    let harness = harness(
        vec![profile],
        Vec::new(),
        Some(CommissionSummary {
            adjusted_total: 1_000.0,
            tax_gst: 50.0,
            pos_fees: 0.0,
        }),
        Some(zero_rate_settings()),
        false,
    );

    let mid_month = harness
        .service
        .generate_payroll(&staff(), clinic_id, member_id, date(2024, 6, 1), date(2024, 6, 15))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(mid_month.rent(), 0.0);

    let month_end = harness
        .service
        .generate_payroll(&staff(), clinic_id, member_id, date(2024, 6, 16), date(2024, 6, 30))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(month_end.rent(), 500.0);
}

#[tokio::test]
async fn rent_only_period_still_generates_payroll() {
    let clinic_id = ClinicId::new();
    let member_id = MemberId::new();
    let mut profile = hourly_employee_profile(clinic_id, member_id);
    profile.monthly_rent = Some(500.0);
    // No recorded hours, but the period crosses June 30 so rent is owed.
    let harness = harness(vec![profile], Vec::new(), None, Some(zero_rate_settings()), false);

    let record = harness
        .service
        .generate_payroll(&staff(), clinic_id, member_id, date(2024, 6, 24), date(2024, 6, 30))
        .await
        .unwrap_or_else(|_| unreachable!());

    let EarningsDetail::Hourly(hourly) = record.earnings() else {
        unreachable!()
    };
    assert_eq!(hourly.regular_hours, 0.0);
    assert_eq!(hourly.regular_pay, 0.0);
    assert_eq!(record.rent(), 500.0);
    assert_eq!(record.totals().total_earnings, 0.0);
    assert_eq!(record.totals().net_payment, -500.0);
}

#[tokio::test]
async fn revenue_share_only_period_still_generates_payroll() {
    let clinic_id = ClinicId::new();
    let member_id = MemberId::new();
    let mut profile = commission_employee_profile(clinic_id, member_id);
    profile.revenue_share_income = 250.0;
    profile.revenue_share_deduction = 40.0;
    let harness = harness(vec![profile], Vec::new(), None, Some(zero_rate_settings()), false);

    let record = harness
        .service
        .generate_payroll(&staff(), clinic_id, member_id, date(2024, 6, 1), date(2024, 6, 15))
        .await
        .unwrap_or_else(|_| unreachable!());

    let EarningsDetail::Commission(commission) = record.earnings() else {
        unreachable!()
    };
    assert_eq!(commission.gross_income, 0.0);
    assert_eq!(commission.commission_deduction, 0.0);
    assert_eq!(record.totals().total_earnings, 250.0);
    assert_eq!(record.totals().total_deductions, 40.0);
    assert_eq!(record.totals().net_payment, 210.0);
}

#[tokio::test]
async fn send_payroll_updates_ytd_and_appends_to_the_ledger() {
    let clinic_id = ClinicId::new();
    let member_id = MemberId::new();
    let harness = harness(
        vec![commission_employee_profile(clinic_id, member_id)],
        Vec::new(),
        Some(CommissionSummary {
            adjusted_total: 1_000.0,
            tax_gst: 50.0,
            pos_fees: 12.5,
        }),
        Some(zero_rate_settings()),
        false,
    );

    let record = harness
        .service
        .generate_payroll(&staff(), clinic_id, member_id, date(2024, 6, 1), date(2024, 6, 15))
        .await
        .unwrap_or_else(|_| unreachable!());
    harness
        .service
        .send_payroll(&staff(), clinic_id, member_id, &record, "June first half")
        .await
        .unwrap_or_else(|_| unreachable!());

    let updated = harness.members.updated.lock().await;
    assert_eq!(updated.len(), 1);
    assert_eq!(
        updated[0].ytd_pay,
        5_000.0 + record.totals().total_earnings
    );

    let appended = harness.ledger.appended.lock().await;
    assert_eq!(appended.len(), 1);
    assert_eq!(appended[0].1, "June first half");

    let sent = harness.mailer.sent.lock().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains("Commission Deduction"));
}

#[tokio::test]
async fn a_failing_mailer_does_not_fail_send_payroll() {
    let clinic_id = ClinicId::new();
    let member_id = MemberId::new();
    let harness = harness(
        vec![commission_employee_profile(clinic_id, member_id)],
        Vec::new(),
        Some(CommissionSummary {
            adjusted_total: 1_000.0,
            tax_gst: 50.0,
            pos_fees: 12.5,
        }),
        Some(zero_rate_settings()),
        true,
    );

    let record = harness
        .service
        .generate_payroll(&staff(), clinic_id, member_id, date(2024, 6, 1), date(2024, 6, 15))
        .await
        .unwrap_or_else(|_| unreachable!());
    let result = harness
        .service
        .send_payroll(&staff(), clinic_id, member_id, &record, "")
        .await;
    assert!(result.is_ok());

    let appended = harness.ledger.appended.lock().await;
    assert_eq!(appended.len(), 1);
}

#[tokio::test]
async fn intervals_require_a_pay_assignment() {
    let clinic_id = ClinicId::new();
    let member_id = MemberId::new();
    let mut profile = hourly_employee_profile(clinic_id, member_id);
    profile.pay = None;
    let harness = harness(vec![profile], Vec::new(), None, Some(zero_rate_settings()), false);

    let result = harness
        .service
        .pay_intervals(&staff(), clinic_id, member_id, date(2024, 6, 10))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn intervals_come_from_the_member_schedule() {
    let clinic_id = ClinicId::new();
    let member_id = MemberId::new();
    let harness = harness(
        vec![hourly_employee_profile(clinic_id, member_id)],
        Vec::new(),
        None,
        Some(zero_rate_settings()),
        false,
    );

    let intervals = harness
        .service
        .pay_intervals(&staff(), clinic_id, member_id, date(2024, 6, 10))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(intervals[0].end_date, date(2024, 6, 9));
}

#[test]
fn overtime_split_never_looks_past_the_period_end() {
    // Hours on Thursday and Friday exist but the period ends Wednesday;
    // they are outside the fetched range and outside the split.
    let entries = daily(&[
        (date(2024, 6, 3), 14.0),
        (date(2024, 6, 4), 14.0),
        (date(2024, 6, 5), 14.0),
    ]);
    let (regular, overtime) = split_overtime(&entries, date(2024, 6, 3), date(2024, 6, 5));
    assert_eq!(regular, 40.0);
    assert_eq!(overtime, 2.0);
}

#[test]
fn month_end_detection_handles_interior_months() {
    assert!(contains_month_end(date(2024, 6, 16), date(2024, 6, 30)));
    assert!(contains_month_end(date(2024, 6, 20), date(2024, 7, 5)));
    assert!(!contains_month_end(date(2024, 6, 1), date(2024, 6, 15)));
}
