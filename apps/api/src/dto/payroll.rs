use std::collections::BTreeMap;

use chrono::NaiveDate;
use clinipay_core::{AppError, AppResult, MemberId};
use clinipay_domain::{
    CommissionEarnings, DeductionField, EarningsDetail, EarningsField, HourlyEarnings, PayInterval,
    PaySchedule, PayrollRecord, PayrollRecordParts, RoleType, StatutoryDeductions, YtdAmounts,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use clinipay_application::MemberProfile;

/// Query selecting the clinic a member request is scoped to.
#[derive(Debug, Deserialize)]
pub struct MemberQuery {
    /// Owning clinic of the addressed member.
    pub clinic_id: Uuid,
}

/// Query for the pay interval listing.
#[derive(Debug, Deserialize)]
pub struct IntervalsQuery {
    /// Owning clinic of the addressed member.
    pub clinic_id: Uuid,
    /// Reference date for the listing; defaults to the current date.
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

/// One selectable pay period.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayIntervalResponse {
    /// Stable identifier for re-selecting the interval.
    pub id: String,
    /// First day of the period.
    pub start_date: NaiveDate,
    /// Last day of the period, inclusive.
    pub end_date: NaiveDate,
    /// Human-readable label shown in the period picker.
    pub label: String,
    /// Cadence the interval was generated from.
    pub frequency: String,
}

impl From<PayInterval> for PayIntervalResponse {
    fn from(value: PayInterval) -> Self {
        Self {
            id: value.id,
            start_date: value.start_date,
            end_date: value.end_date,
            label: value.label,
            frequency: value.frequency,
        }
    }
}

/// Member summary shown at the top of the payroll screen.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// Member identifier.
    pub member_id: MemberId,
    /// Display name.
    pub display_name: String,
    /// Payslip delivery address, when on file.
    pub email: Option<String>,
    /// Compensation role, absent when payroll is not configured.
    pub role_type: Option<String>,
    /// Base wage for hourly roles.
    pub hourly_wage: Option<f64>,
    /// Commission fraction for commission roles.
    pub commission_rate: Option<f64>,
    /// Cadence identifier for members on a standard cadence.
    pub pay_frequency: Option<String>,
    /// Custom monthly cutoff days, e.g. `["15", "end of month"]`.
    /// Empty for cadence schedules.
    pub payroll_dates: Vec<String>,
    /// Gross earnings paid year to date.
    pub ytd_pay: f64,
    /// Deductions withheld year to date.
    pub ytd_deduction: f64,
    /// Monthly rent charged at month end, when the member rents space.
    pub monthly_rent: Option<f64>,
}

impl From<MemberProfile> for UserResponse {
    fn from(value: MemberProfile) -> Self {
        let (pay_frequency, payroll_dates) = match value.pay.as_ref().map(|pay| &pay.schedule) {
            Some(PaySchedule::Cadence(frequency)) => {
                (Some(frequency.as_str().to_owned()), Vec::new())
            }
            Some(PaySchedule::CutoffDays(cutoffs)) => {
                (None, cutoffs.iter().map(ToString::to_string).collect())
            }
            None => (None, Vec::new()),
        };
        Self {
            member_id: value.member_id,
            display_name: value.display_name,
            email: value.email,
            role_type: value
                .pay
                .as_ref()
                .map(|pay| pay.role_type.as_str().to_owned()),
            hourly_wage: value.pay.as_ref().and_then(|pay| pay.hourly_wage),
            commission_rate: value.pay.as_ref().and_then(|pay| pay.commission_rate),
            pay_frequency,
            payroll_dates,
            ytd_pay: value.ytd.ytd_pay,
            ytd_deduction: value.ytd.ytd_deduction,
            monthly_rent: value.monthly_rent,
        }
    }
}

/// Body for generating a fresh payroll record.
#[derive(Debug, Deserialize)]
pub struct GeneratePayrollRequest {
    /// Owning clinic of the addressed member.
    pub clinic_id: Uuid,
    /// First day of the pay period.
    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,
    /// Last day of the pay period, inclusive.
    #[serde(rename = "endDate")]
    pub end_date: NaiveDate,
    /// Identifier of the picked interval, echoed back by clients.
    #[serde(default)]
    pub interval: Option<String>,
}

/// Body for finalizing and delivering a payroll record.
#[derive(Debug, Deserialize)]
pub struct SendPayrollRequest {
    /// Owning clinic of the addressed member.
    pub clinic_id: Uuid,
    /// Free-form staff notes carried into the ledger and payslip.
    #[serde(default)]
    pub notes: String,
    /// The record as reviewed and possibly edited by staff.
    #[serde(flatten)]
    pub record: PayrollRecordDto,
}

/// Derived totals on the wire.
#[derive(Debug, Serialize, Deserialize)]
pub struct PayTotalsDto {
    /// Sum of all earnings components.
    pub total_earnings: f64,
    /// Sum of all deduction components.
    pub total_deductions: f64,
    /// Earnings minus deductions.
    pub net_payment: f64,
}

/// Year-to-date figures on the wire.
#[derive(Debug, Serialize, Deserialize)]
pub struct YtdAmountsDto {
    /// Earnings year to date, including this period.
    pub earnings: f64,
    /// Deductions year to date, including this period.
    pub deductions: f64,
}

/// A payroll record in the keyed-map form the payroll screens consume.
///
/// The `earnings` and `deductions` objects carry only the keys legal for
/// the record's role; deserialization rejects any key that contradicts
/// the role tag instead of silently dropping it.
#[derive(Debug, Serialize, Deserialize)]
pub struct PayrollRecordDto {
    /// Display name of the member being paid.
    pub user_name: String,
    /// Compensation role, in its display form.
    pub role_type: String,
    /// First day of the pay period.
    pub pay_period_start: NaiveDate,
    /// Last day of the pay period, inclusive.
    pub pay_period_end: NaiveDate,
    /// Base wage, present for hourly roles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_wage: Option<f64>,
    /// Commission fraction, present for commission roles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<f64>,
    /// Hours paid at the base wage, present for hourly roles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regular_hours: Option<f64>,
    /// Hours paid at the overtime rate, present for hourly roles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overtime_hours: Option<f64>,
    /// Earnings amounts keyed by field name.
    pub earnings: BTreeMap<String, f64>,
    /// Deduction amounts keyed by field name.
    pub deductions: BTreeMap<String, f64>,
    /// Statutory year-to-date figures after this period.
    #[serde(default)]
    pub breakdown: BTreeMap<String, f64>,
    /// Derived totals.
    pub totals: PayTotalsDto,
    /// Year-to-date figures including this period.
    pub ytd_amounts: YtdAmountsDto,
}

const CPP_YTD_AFTER: &str = "cpp_ytd_after";
const EI_YTD_AFTER: &str = "ei_ytd_after";

impl From<&PayrollRecord> for PayrollRecordDto {
    fn from(record: &PayrollRecord) -> Self {
        let mut hourly_wage = None;
        let mut commission_rate = None;
        let mut regular_hours = None;
        let mut overtime_hours = None;
        let mut earnings = BTreeMap::new();
        let mut deductions = BTreeMap::new();
        let mut breakdown = BTreeMap::new();

        match record.earnings() {
            EarningsDetail::Hourly(hourly) => {
                hourly_wage = Some(hourly.hourly_wage);
                regular_hours = Some(hourly.regular_hours);
                overtime_hours = Some(hourly.overtime_hours);
                earnings.insert(EarningsField::RegularPay.key().to_owned(), hourly.regular_pay);
                earnings.insert(
                    EarningsField::OvertimePay.key().to_owned(),
                    hourly.overtime_pay,
                );
                earnings.insert(
                    EarningsField::VacationPay.key().to_owned(),
                    hourly.vacation_pay,
                );
            }
            EarningsDetail::Commission(commission) => {
                commission_rate = Some(commission.commission_rate);
                earnings.insert(
                    EarningsField::AdjustedTotal.key().to_owned(),
                    commission.adjusted_total,
                );
                earnings.insert(EarningsField::TaxGst.key().to_owned(), commission.tax_gst);
                earnings.insert(
                    EarningsField::VacationPay.key().to_owned(),
                    commission.vacation_pay,
                );
                deductions.insert(
                    DeductionField::CommissionDeduction.key().to_owned(),
                    commission.commission_deduction,
                );
                deductions.insert(DeductionField::PosFees.key().to_owned(), commission.pos_fees);
            }
        }
        earnings.insert(
            EarningsField::RevenueShareIncome.key().to_owned(),
            record.revenue_share_income(),
        );

        if let Some(statutory) = record.statutory() {
            deductions.insert(
                DeductionField::FederalTax.key().to_owned(),
                statutory.federal_tax,
            );
            deductions.insert(
                DeductionField::ProvincialTax.key().to_owned(),
                statutory.provincial_tax,
            );
            deductions.insert(DeductionField::Cpp.key().to_owned(), statutory.cpp);
            deductions.insert(DeductionField::Ei.key().to_owned(), statutory.ei);
            breakdown.insert(CPP_YTD_AFTER.to_owned(), statutory.cpp_ytd_after);
            breakdown.insert(EI_YTD_AFTER.to_owned(), statutory.ei_ytd_after);
        }
        deductions.insert(DeductionField::Rent.key().to_owned(), record.rent());
        deductions.insert(
            DeductionField::RevenueShareDeduction.key().to_owned(),
            record.revenue_share_deduction(),
        );

        let totals = record.totals();
        let ytd = record.ytd();
        Self {
            user_name: record.user_name().to_owned(),
            role_type: record.role_type().to_string(),
            pay_period_start: record.pay_period_start(),
            pay_period_end: record.pay_period_end(),
            hourly_wage,
            commission_rate,
            regular_hours,
            overtime_hours,
            earnings,
            deductions,
            breakdown,
            totals: PayTotalsDto {
                total_earnings: totals.total_earnings,
                total_deductions: totals.total_deductions,
                net_payment: totals.net_payment,
            },
            ytd_amounts: YtdAmountsDto {
                earnings: ytd.earnings,
                deductions: ytd.deductions,
            },
        }
    }
}

impl PayrollRecordDto {
    /// Rebuilds the typed record, rejecting keys that contradict the role.
    ///
    /// Totals are re-derived on the server side; whatever the client sent
    /// under `totals` is ignored.
    pub fn into_record(self) -> AppResult<PayrollRecord> {
        let role_type: RoleType = self.role_type.parse()?;

        for key in self.earnings.keys() {
            earnings_field_for_role(key, role_type)?;
        }
        for key in self.deductions.keys() {
            deduction_field_for_role(key, role_type)?;
        }

        let earning = |field: EarningsField| self.earnings.get(field.key()).copied().unwrap_or(0.0);
        let deduction =
            |field: DeductionField| self.deductions.get(field.key()).copied().unwrap_or(0.0);

        let earnings = if role_type.is_commission() {
            EarningsDetail::Commission(CommissionEarnings {
                commission_rate: self.commission_rate.ok_or_else(|| {
                    AppError::Validation(
                        "commission_rate is required for commission roles".to_owned(),
                    )
                })?,
                adjusted_total: earning(EarningsField::AdjustedTotal),
                tax_gst: earning(EarningsField::TaxGst),
                gross_income: 0.0,
                vacation_pay: earning(EarningsField::VacationPay),
                pos_fees: deduction(DeductionField::PosFees),
                commission_deduction: deduction(DeductionField::CommissionDeduction),
            })
        } else {
            EarningsDetail::Hourly(HourlyEarnings {
                hourly_wage: self.hourly_wage.ok_or_else(|| {
                    AppError::Validation("hourly_wage is required for hourly roles".to_owned())
                })?,
                regular_hours: self.regular_hours.unwrap_or(0.0),
                overtime_hours: self.overtime_hours.unwrap_or(0.0),
                regular_pay: earning(EarningsField::RegularPay),
                overtime_pay: earning(EarningsField::OvertimePay),
                vacation_pay: earning(EarningsField::VacationPay),
            })
        };

        let statutory = role_type.is_employee().then(|| StatutoryDeductions {
            federal_tax: deduction(DeductionField::FederalTax),
            provincial_tax: deduction(DeductionField::ProvincialTax),
            cpp: deduction(DeductionField::Cpp),
            ei: deduction(DeductionField::Ei),
            cpp_ytd_after: self.breakdown.get(CPP_YTD_AFTER).copied().unwrap_or(0.0),
            ei_ytd_after: self.breakdown.get(EI_YTD_AFTER).copied().unwrap_or(0.0),
        });

        PayrollRecord::new(PayrollRecordParts {
            user_name: self.user_name,
            role_type,
            pay_period_start: self.pay_period_start,
            pay_period_end: self.pay_period_end,
            earnings,
            revenue_share_income: earning(EarningsField::RevenueShareIncome),
            statutory,
            rent: deduction(DeductionField::Rent),
            revenue_share_deduction: deduction(DeductionField::RevenueShareDeduction),
            ytd: YtdAmounts {
                earnings: self.ytd_amounts.earnings,
                deductions: self.ytd_amounts.deductions,
            },
        })
    }
}

fn earnings_field_for_role(key: &str, role_type: RoleType) -> AppResult<EarningsField> {
    let field: EarningsField = key.parse()?;
    let legal = match field {
        EarningsField::RegularPay | EarningsField::OvertimePay => role_type.is_hourly(),
        EarningsField::AdjustedTotal | EarningsField::TaxGst => role_type.is_commission(),
        EarningsField::VacationPay | EarningsField::RevenueShareIncome => true,
    };
    if legal {
        Ok(field)
    } else {
        Err(AppError::Validation(format!(
            "earnings field {key} does not apply to a {role_type} record"
        )))
    }
}

fn deduction_field_for_role(key: &str, role_type: RoleType) -> AppResult<DeductionField> {
    let field: DeductionField = key.parse()?;
    let legal = match field {
        DeductionField::FederalTax
        | DeductionField::ProvincialTax
        | DeductionField::Cpp
        | DeductionField::Ei => role_type.is_employee(),
        DeductionField::CommissionDeduction | DeductionField::PosFees => role_type.is_commission(),
        DeductionField::Rent | DeductionField::RevenueShareDeduction => true,
    };
    if legal {
        Ok(field)
    } else {
        Err(AppError::Validation(format!(
            "deduction field {key} does not apply to a {role_type} record"
        )))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use clinipay_application::{MemberProfile, PayAssignment, YtdFigures};
    use clinipay_core::{ClinicId, MemberId};
    use clinipay_domain::{
        CommissionEarnings, EarningsDetail, PayFrequency, PaySchedule, PayrollCutoff,
        PayrollRecord, PayrollRecordParts, RoleType, StatutoryDeductions, YtdAmounts,
    };

    use super::{PayrollRecordDto, UserResponse};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap_or_else(|| unreachable!())
    }

    fn commission_record() -> PayrollRecord {
        PayrollRecord::new(PayrollRecordParts {
            user_name: "Dana Reid".to_owned(),
            role_type: RoleType::CommissionEmployee,
            pay_period_start: date(2024, 6, 1),
            pay_period_end: date(2024, 6, 15),
            earnings: EarningsDetail::Commission(CommissionEarnings {
                commission_rate: 0.45,
                adjusted_total: 1000.0,
                tax_gst: 50.0,
                gross_income: 0.0,
                vacation_pay: 18.9,
                pos_fees: 12.5,
                commission_deduction: 577.5,
            }),
            revenue_share_income: 0.0,
            statutory: Some(StatutoryDeductions {
                federal_tax: 40.0,
                provincial_tax: 20.0,
                cpp: 25.0,
                ei: 8.0,
                cpp_ytd_after: 325.0,
                ei_ytd_after: 96.0,
            }),
            rent: 0.0,
            revenue_share_deduction: 0.0,
            ytd: YtdAmounts {
                earnings: 5000.0,
                deductions: 900.0,
            },
        })
        .unwrap_or_else(|_| unreachable!())
    }

    fn member_profile(schedule: PaySchedule) -> MemberProfile {
        MemberProfile {
            member_id: MemberId::new(),
            clinic_id: ClinicId::new(),
            display_name: "Dana Reid".to_owned(),
            email: Some("dana@clinic.test".to_owned()),
            ytd: YtdFigures::default(),
            pay: Some(PayAssignment {
                role_type: RoleType::CommissionEmployee,
                hourly_wage: None,
                commission_rate: Some(0.45),
                schedule,
            }),
            monthly_rent: None,
            revenue_share_income: 0.0,
            revenue_share_deduction: 0.0,
        }
    }

    #[test]
    fn user_response_echoes_a_cadence_schedule() {
        let response =
            UserResponse::from(member_profile(PaySchedule::Cadence(PayFrequency::BiWeekly)));

        assert_eq!(response.pay_frequency.as_deref(), Some("bi-weekly"));
        assert!(response.payroll_dates.is_empty());
    }

    #[test]
    fn user_response_echoes_cutoff_days_with_the_month_end_sentinel() {
        let response = UserResponse::from(member_profile(PaySchedule::CutoffDays(vec![
            PayrollCutoff::DayOfMonth(15),
            PayrollCutoff::EndOfMonth,
        ])));

        assert_eq!(response.pay_frequency, None);
        assert_eq!(response.payroll_dates, vec!["15", "end of month"]);
    }

    #[test]
    fn record_survives_the_wire_round_trip() {
        let record = commission_record();
        let dto = PayrollRecordDto::from(&record);

        assert_eq!(dto.role_type, "Commission Employee");
        assert_eq!(dto.earnings.get("adjusted_total"), Some(&1000.0));
        assert_eq!(dto.deductions.get("commission_deduction"), Some(&577.5));
        assert_eq!(dto.breakdown.get("cpp_ytd_after"), Some(&325.0));
        assert_eq!(dto.totals.net_payment, 385.9);

        let rebuilt = dto.into_record().unwrap_or_else(|_| unreachable!());
        assert_eq!(rebuilt, record);
    }

    #[test]
    fn keys_contradicting_the_role_are_rejected() {
        let record = commission_record();
        let mut dto = PayrollRecordDto::from(&record);
        dto.earnings.insert("regular_pay".to_owned(), 100.0);

        assert!(dto.into_record().is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let record = commission_record();
        let mut dto = PayrollRecordDto::from(&record);
        dto.deductions.insert("parking".to_owned(), 10.0);

        assert!(dto.into_record().is_err());
    }

    #[test]
    fn commission_rate_is_required_for_commission_roles() {
        let record = commission_record();
        let mut dto = PayrollRecordDto::from(&record);
        dto.commission_rate = None;

        assert!(dto.into_record().is_err());
    }
}
