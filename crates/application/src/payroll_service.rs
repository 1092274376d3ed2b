use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, Duration, Months, NaiveDate};
use clinipay_core::{AppError, AppResult, ClinicId, MemberId, UserIdentity};
use clinipay_domain::{
    CommissionEarnings, ContributionRoom, EarningsDetail, HourlyEarnings, PayInterval, PayStub,
    PayrollRecord, PayrollRecordParts, SiteSettings, StatutoryDeductions, YtdAmounts, round_cents,
    tax,
};
use tracing::{info, warn};

use crate::payroll_ports::{
    CommissionSource, CommissionSummary, MemberProfile, MemberRepository, PayAssignment,
    PayrollLedger, PayslipMailer, PayslipMessage, SettingsRepository, TimesheetEntry,
    TimesheetSource, YtdFigures,
};

#[cfg(test)]
mod tests;

/// Weekly hours past which time is paid at the overtime rate.
const WEEKLY_OVERTIME_THRESHOLD: f64 = 40.0;

/// Application service for payroll generation and delivery.
///
/// Every operation takes the acting user and the clinic the request was
/// routed to; nothing payroll-related is read from ambient state.
#[derive(Clone)]
pub struct PayrollService {
    members: Arc<dyn MemberRepository>,
    timesheets: Arc<dyn TimesheetSource>,
    commissions: Arc<dyn CommissionSource>,
    settings: Arc<dyn SettingsRepository>,
    ledger: Arc<dyn PayrollLedger>,
    mailer: Arc<dyn PayslipMailer>,
}

impl PayrollService {
    /// Creates the service from its port implementations.
    #[must_use]
    pub fn new(
        members: Arc<dyn MemberRepository>,
        timesheets: Arc<dyn TimesheetSource>,
        commissions: Arc<dyn CommissionSource>,
        settings: Arc<dyn SettingsRepository>,
        ledger: Arc<dyn PayrollLedger>,
        mailer: Arc<dyn PayslipMailer>,
    ) -> Self {
        Self {
            members,
            timesheets,
            commissions,
            settings,
            ledger,
            mailer,
        }
    }

    /// Returns a member's payroll profile. Staff only.
    pub async fn member_for_payroll(
        &self,
        actor: &UserIdentity,
        clinic_id: ClinicId,
        member_id: MemberId,
    ) -> AppResult<MemberProfile> {
        require_staff(actor)?;
        self.require_member(clinic_id, member_id).await
    }

    /// Generates the selectable pay intervals for a member. Staff only.
    ///
    /// An empty list is a legal outcome, not an error; it means no period
    /// of the member's schedule has fully elapsed yet.
    pub async fn pay_intervals(
        &self,
        actor: &UserIdentity,
        clinic_id: ClinicId,
        member_id: MemberId,
        today: NaiveDate,
    ) -> AppResult<Vec<PayInterval>> {
        require_staff(actor)?;
        let member = self.require_member(clinic_id, member_id).await?;
        let pay = require_pay_assignment(&member)?;
        Ok(pay.schedule.intervals(today))
    }

    /// Computes a payroll record for a member and period. Staff only.
    ///
    /// The record is returned for review and editing; nothing is
    /// persisted until [`PayrollService::send_payroll`].
    pub async fn generate_payroll(
        &self,
        actor: &UserIdentity,
        clinic_id: ClinicId,
        member_id: MemberId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<PayrollRecord> {
        require_staff(actor)?;
        if start > end {
            return Err(AppError::Validation(
                "pay period start must not be after its end".to_owned(),
            ));
        }

        let member = self.require_member(clinic_id, member_id).await?;
        let pay = require_pay_assignment(&member)?.clone();
        if !pay.role_type.receives_payroll() {
            return Err(AppError::Validation(
                "students are not eligible for payroll generation".to_owned(),
            ));
        }

        let settings = self
            .settings
            .load()
            .await?
            .ok_or_else(|| AppError::Validation("site settings are not configured".to_owned()))?;
        settings.validate()?;

        let rent = if contains_month_end(start, end) {
            member.monthly_rent.unwrap_or(0.0)
        } else {
            0.0
        };
        // A period can owe rent or carry revenue share without any recorded
        // hours or commission activity; it still pays out, with zero base
        // earnings.
        let has_other_pay = rent > 0.0
            || member.revenue_share_income > 0.0
            || member.revenue_share_deduction > 0.0;

        let is_employee = pay.role_type.is_employee();
        let (earnings, taxable_income) = if pay.role_type.is_commission() {
            self.commission_earnings(&member, &pay, &settings, start, end, has_other_pay)
                .await?
        } else {
            self.hourly_earnings(&member, &pay, &settings, start, end, has_other_pay)
                .await?
        };

        let statutory = if is_employee {
            let room = ContributionRoom {
                cpp_ytd: member.ytd.cpp_contrib,
                ei_ytd: member.ytd.ei_contrib,
            };
            let period_days = (end - start).num_days() + 1;
            let deductions = tax::period_deductions(taxable_income, period_days, &settings, &room)?;
            Some(StatutoryDeductions {
                federal_tax: deductions.federal_tax,
                provincial_tax: deductions.provincial_tax,
                cpp: deductions.cpp,
                ei: deductions.ei,
                cpp_ytd_after: deductions.cpp_ytd_after,
                ei_ytd_after: deductions.ei_ytd_after,
            })
        } else {
            None
        };

        let mut record = PayrollRecord::new(PayrollRecordParts {
            user_name: member.display_name.clone(),
            role_type: pay.role_type,
            pay_period_start: start,
            pay_period_end: end,
            earnings,
            revenue_share_income: member.revenue_share_income,
            statutory,
            rent,
            revenue_share_deduction: member.revenue_share_deduction,
            ytd: YtdAmounts::default(),
        })?;

        let totals = record.totals();
        record.set_ytd(YtdAmounts {
            earnings: round_cents(member.ytd.ytd_pay + totals.total_earnings),
            deductions: round_cents(member.ytd.ytd_deduction + totals.total_deductions),
        });

        info!(member = %member_id, %start, %end, "generated payroll record");
        Ok(record)
    }

    /// Finalizes a reviewed record: updates the member's year-to-date
    /// figures, appends to the ledger and emails the payslip. Staff only.
    ///
    /// Payslip delivery is best-effort; a mail failure is logged and the
    /// payroll still counts as sent.
    pub async fn send_payroll(
        &self,
        actor: &UserIdentity,
        clinic_id: ClinicId,
        member_id: MemberId,
        record: &PayrollRecord,
        notes: &str,
    ) -> AppResult<()> {
        require_staff(actor)?;
        let member = self.require_member(clinic_id, member_id).await?;

        let totals = record.totals();
        let ytd = YtdFigures {
            ytd_pay: round_cents(member.ytd.ytd_pay + totals.total_earnings),
            ytd_deduction: round_cents(member.ytd.ytd_deduction + totals.total_deductions),
            cpp_contrib: record
                .statutory()
                .map_or(member.ytd.cpp_contrib, |statutory| statutory.cpp_ytd_after),
            ei_contrib: record
                .statutory()
                .map_or(member.ytd.ei_contrib, |statutory| statutory.ei_ytd_after),
        };
        self.members.update_ytd(clinic_id, member_id, ytd).await?;
        self.ledger
            .append(clinic_id, member_id, record, notes)
            .await?;

        match &member.email {
            Some(address) => {
                let message = payslip_message(address, record, notes);
                if let Err(error) = self.mailer.send_payslip(message).await {
                    warn!(member = %member_id, %error, "payslip email failed, payroll still sent");
                }
            }
            None => {
                info!(member = %member_id, "member has no email on file, skipping payslip");
            }
        }

        info!(member = %member_id, "payroll sent");
        Ok(())
    }

    async fn require_member(
        &self,
        clinic_id: ClinicId,
        member_id: MemberId,
    ) -> AppResult<MemberProfile> {
        self.members
            .find_member(clinic_id, member_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("member {member_id}")))
    }

    async fn hourly_earnings(
        &self,
        member: &MemberProfile,
        pay: &PayAssignment,
        settings: &SiteSettings,
        start: NaiveDate,
        end: NaiveDate,
        has_other_pay: bool,
    ) -> AppResult<(EarningsDetail, f64)> {
        let wage = pay.hourly_wage.ok_or_else(|| {
            AppError::Validation(format!(
                "no hourly wage configured for {}",
                member.display_name
            ))
        })?;

        // Fetch back to the Monday of the start week so a partial first
        // week can count its earlier hours toward the overtime threshold.
        // The range never extends past the period end.
        let entries = self
            .timesheets
            .daily_hours(member.clinic_id, member.member_id, monday_of(start), end)
            .await?;

        let (regular_hours, overtime_hours) = split_overtime(&entries, start, end);
        if regular_hours + overtime_hours <= 0.0 && !has_other_pay {
            return Err(AppError::Validation(format!(
                "no hours recorded for {} between {start} and {end}",
                member.display_name
            )));
        }

        let regular_pay = round_cents(regular_hours * wage);
        let overtime_pay = round_cents(overtime_hours * wage * settings.overtime_pay_rate);
        let vacation_pay = if pay.role_type.is_employee() {
            round_cents((regular_pay + overtime_pay) * settings.vacation_pay_rate)
        } else {
            0.0
        };

        let taxable = regular_pay + overtime_pay + vacation_pay;
        let earnings = EarningsDetail::Hourly(HourlyEarnings {
            hourly_wage: wage,
            regular_hours,
            overtime_hours,
            regular_pay,
            overtime_pay,
            vacation_pay,
        });
        Ok((earnings, taxable))
    }

    async fn commission_earnings(
        &self,
        member: &MemberProfile,
        pay: &PayAssignment,
        settings: &SiteSettings,
        start: NaiveDate,
        end: NaiveDate,
        has_other_pay: bool,
    ) -> AppResult<(EarningsDetail, f64)> {
        let rate = pay.commission_rate.ok_or_else(|| {
            AppError::Validation(format!(
                "no commission rate configured for {}",
                member.display_name
            ))
        })?;

        let summary = match self
            .commissions
            .commission_summary(member.clinic_id, member.member_id, start, end)
            .await?
        {
            Some(summary) => summary,
            None if has_other_pay => CommissionSummary {
                adjusted_total: 0.0,
                tax_gst: 0.0,
                pos_fees: 0.0,
            },
            None => {
                return Err(AppError::Validation(format!(
                    "no commission activity for {} between {start} and {end}",
                    member.display_name
                )));
            }
        };

        let gross_income = round_cents(summary.adjusted_total + summary.tax_gst);
        let commission_income = round_cents(gross_income * rate);
        let commission_deduction = round_cents(gross_income - commission_income);
        let vacation_pay = if pay.role_type.is_employee() {
            round_cents(commission_income * settings.vacation_pay_rate)
        } else {
            0.0
        };

        let taxable = commission_income + vacation_pay - summary.pos_fees;
        let earnings = EarningsDetail::Commission(CommissionEarnings {
            commission_rate: rate,
            adjusted_total: summary.adjusted_total,
            tax_gst: summary.tax_gst,
            gross_income,
            vacation_pay,
            pos_fees: summary.pos_fees,
            commission_deduction,
        });
        Ok((earnings, taxable))
    }
}

fn require_staff(actor: &UserIdentity) -> AppResult<()> {
    if actor.is_staff() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "payroll operations require staff access".to_owned(),
        ))
    }
}

fn require_pay_assignment(member: &MemberProfile) -> AppResult<&PayAssignment> {
    member.pay.as_ref().ok_or_else(|| {
        AppError::Validation(format!(
            "no pay assignment configured for {}",
            member.display_name
        ))
    })
}

fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Splits the period's hours into regular and overtime over Monday to
/// Sunday weeks.
///
/// Hours from before the period start still count toward each week's
/// threshold, and the whole week's overtime is allocated to this run.
/// Days after the period end are never consulted.
fn split_overtime(entries: &[TimesheetEntry], start: NaiveDate, end: NaiveDate) -> (f64, f64) {
    let mut weeks: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for entry in entries {
        if entry.date > end || entry.date < monday_of(start) {
            continue;
        }
        let bucket = weeks.entry(monday_of(entry.date)).or_insert((0.0, 0.0));
        bucket.0 += entry.hours;
        if entry.date >= start {
            bucket.1 += entry.hours;
        }
    }

    let mut regular = 0.0;
    let mut overtime = 0.0;
    for (week_total, period_hours) in weeks.values() {
        let week_overtime = (week_total - WEEKLY_OVERTIME_THRESHOLD).max(0.0);
        let run_overtime = week_overtime.min(*period_hours);
        overtime += run_overtime;
        regular += period_hours - run_overtime;
    }
    (regular, overtime)
}

/// Returns whether any day in the inclusive range is a month's last day.
fn contains_month_end(start: NaiveDate, end: NaiveDate) -> bool {
    let mut first = match NaiveDate::from_ymd_opt(start.year(), start.month(), 1) {
        Some(first) => first,
        None => return false,
    };
    while first <= end {
        let Some(last) = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
        else {
            return false;
        };
        if last >= start && last <= end {
            return true;
        }
        let Some(next) = first.checked_add_months(Months::new(1)) else {
            return false;
        };
        first = next;
    }
    false
}

fn payslip_message(address: &str, record: &PayrollRecord, notes: &str) -> PayslipMessage {
    let stub = PayStub::from_record(record);
    let mut body = format!(
        "Pay statement for {name}\nRole: {role}\nPeriod: {period}\n\nEarnings\n",
        name = stub.member_name,
        role = stub.role,
        period = stub.period,
    );
    for row in stub.earnings_rows.iter().filter(|row| !row.label.is_empty()) {
        body.push_str(&format!("  {}: {}\n", row.label, row.amount));
    }
    body.push_str("\nDeductions\n");
    for row in stub
        .deduction_rows
        .iter()
        .filter(|row| !row.label.is_empty())
    {
        body.push_str(&format!("  {}: {}\n", row.label, row.amount));
    }
    body.push_str(&format!(
        "\nTotal earnings: {}\nTotal deductions: {}\nNet payment: {}\n",
        stub.total_earnings, stub.total_deductions, stub.net_payment,
    ));
    if !notes.trim().is_empty() {
        body.push_str(&format!("\nNotes: {}\n", notes.trim()));
    }

    PayslipMessage {
        to: address.to_owned(),
        subject: format!("Pay statement, {}", stub.period),
        body,
    }
}
