//! Payroll records with role-conditional earnings.
//!
//! A record carries exactly one earnings shape, decided by the member's
//! role. Amount fields are addressed through the [`PayrollField`] enums
//! rather than string paths, so an edit against a field the record does
//! not carry is a type-checked error path instead of a silent map insert.
//! Every successful write re-derives the totals, which keeps
//! `net_payment = total_earnings - total_deductions` true by construction.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::NaiveDate;
use clinipay_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::money::round_cents;
use crate::role::RoleType;

/// Earnings detail for members paid by the hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyEarnings {
    /// Base wage in dollars per hour. Never recalculated by edits.
    pub hourly_wage: f64,
    /// Hours paid at the base wage.
    pub regular_hours: f64,
    /// Hours paid at the overtime rate.
    pub overtime_hours: f64,
    /// Pay for regular hours.
    pub regular_pay: f64,
    /// Pay for overtime hours.
    pub overtime_pay: f64,
    /// Vacation pay accrued this period.
    pub vacation_pay: f64,
}

/// Earnings detail for members paid on commission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionEarnings {
    /// The member's share of gross income, as a fraction. Never
    /// recalculated by edits.
    pub commission_rate: f64,
    /// Billed services for the period, before GST.
    pub adjusted_total: f64,
    /// GST collected on the billed services.
    pub tax_gst: f64,
    /// Derived: `adjusted_total + tax_gst`. Maintained on every re-total.
    pub gross_income: f64,
    /// Vacation pay accrued this period.
    pub vacation_pay: f64,
    /// Point-of-sale processing fees passed through to the member.
    pub pos_fees: f64,
    /// The clinic's share of gross income.
    pub commission_deduction: f64,
}

/// The role-conditional earnings side of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EarningsDetail {
    /// Wage-based earnings.
    Hourly(HourlyEarnings),
    /// Commission-split earnings.
    Commission(CommissionEarnings),
}

/// Statutory withholdings, present exactly for employee roles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatutoryDeductions {
    /// Federal income tax withheld this period.
    pub federal_tax: f64,
    /// Provincial income tax withheld this period.
    pub provincial_tax: f64,
    /// Pension plan contribution this period.
    pub cpp: f64,
    /// Employment insurance premium this period.
    pub ei: f64,
    /// Pension contribution year to date after this period.
    pub cpp_ytd_after: f64,
    /// Insurance premium year to date after this period.
    pub ei_ytd_after: f64,
}

/// Derived totals. Always consistent with the component fields.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PayTotals {
    /// Sum of all earnings components.
    pub total_earnings: f64,
    /// Sum of all deduction components.
    pub total_deductions: f64,
    /// `total_earnings - total_deductions`.
    pub net_payment: f64,
}

/// Year-to-date figures carried for display. Never recomputed locally.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct YtdAmounts {
    /// Earnings year to date, including this period.
    pub earnings: f64,
    /// Deductions year to date, including this period.
    pub deductions: f64,
}

/// An addressable earnings amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EarningsField {
    /// Hourly only.
    RegularPay,
    /// Hourly only.
    OvertimePay,
    /// Both shapes.
    VacationPay,
    /// Commission only.
    AdjustedTotal,
    /// Commission only.
    TaxGst,
    /// Both shapes.
    RevenueShareIncome,
}

impl EarningsField {
    /// Returns the wire key for the field.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::RegularPay => "regular_pay",
            Self::OvertimePay => "overtime_pay",
            Self::VacationPay => "vacation_pay",
            Self::AdjustedTotal => "adjusted_total",
            Self::TaxGst => "tax_gst",
            Self::RevenueShareIncome => "revenue_share_income",
        }
    }
}

impl Display for EarningsField {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.key())
    }
}

impl FromStr for EarningsField {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "regular_pay" => Ok(Self::RegularPay),
            "overtime_pay" => Ok(Self::OvertimePay),
            "vacation_pay" => Ok(Self::VacationPay),
            "adjusted_total" => Ok(Self::AdjustedTotal),
            "tax_gst" => Ok(Self::TaxGst),
            "revenue_share_income" => Ok(Self::RevenueShareIncome),
            other => Err(AppError::Validation(format!(
                "unknown earnings field: {other}"
            ))),
        }
    }
}

/// An addressable deduction amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeductionField {
    /// Employees only.
    FederalTax,
    /// Employees only.
    ProvincialTax,
    /// Employees only.
    Cpp,
    /// Employees only.
    Ei,
    /// Commission only.
    CommissionDeduction,
    /// Commission only.
    PosFees,
    /// Any role with rent configured.
    Rent,
    /// Any role.
    RevenueShareDeduction,
}

impl DeductionField {
    /// Returns the wire key for the field.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::FederalTax => "federal_tax",
            Self::ProvincialTax => "provincial_tax",
            Self::Cpp => "cpp",
            Self::Ei => "ei",
            Self::CommissionDeduction => "commission_deduction",
            Self::PosFees => "pos_fees",
            Self::Rent => "rent",
            Self::RevenueShareDeduction => "revenue_share_deduction",
        }
    }
}

impl Display for DeductionField {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.key())
    }
}

impl FromStr for DeductionField {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "federal_tax" => Ok(Self::FederalTax),
            "provincial_tax" => Ok(Self::ProvincialTax),
            "cpp" => Ok(Self::Cpp),
            "ei" => Ok(Self::Ei),
            "commission_deduction" => Ok(Self::CommissionDeduction),
            "pos_fees" => Ok(Self::PosFees),
            "rent" => Ok(Self::Rent),
            "revenue_share_deduction" => Ok(Self::RevenueShareDeduction),
            other => Err(AppError::Validation(format!(
                "unknown deduction field: {other}"
            ))),
        }
    }
}

/// Either side of the pay stub, addressed as one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayrollField {
    /// An earnings amount.
    Earning(EarningsField),
    /// A deduction amount.
    Deduction(DeductionField),
}

impl Display for PayrollField {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Earning(field) => write!(formatter, "earnings.{field}"),
            Self::Deduction(field) => write!(formatter, "deductions.{field}"),
        }
    }
}

/// Inputs for assembling a payroll record.
#[derive(Debug, Clone)]
pub struct PayrollRecordParts {
    /// Display name of the member being paid.
    pub user_name: String,
    /// The member's compensation role.
    pub role_type: RoleType,
    /// First day of the pay period.
    pub pay_period_start: NaiveDate,
    /// Last day of the pay period, inclusive.
    pub pay_period_end: NaiveDate,
    /// Role-conditional earnings detail.
    pub earnings: EarningsDetail,
    /// Revenue share paid to the member this period.
    pub revenue_share_income: f64,
    /// Statutory withholdings; required for employees, absent otherwise.
    pub statutory: Option<StatutoryDeductions>,
    /// Rent charged this period, zero when none applies.
    pub rent: f64,
    /// Revenue share charged to the member this period.
    pub revenue_share_deduction: f64,
    /// Year-to-date figures including this period.
    pub ytd: YtdAmounts,
}

/// One member's payroll for one pay period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollRecord {
    user_name: String,
    role_type: RoleType,
    pay_period_start: NaiveDate,
    pay_period_end: NaiveDate,
    earnings: EarningsDetail,
    revenue_share_income: f64,
    statutory: Option<StatutoryDeductions>,
    rent: f64,
    revenue_share_deduction: f64,
    totals: PayTotals,
    ytd: YtdAmounts,
}

impl PayrollRecord {
    /// Assembles a record, checking that the earnings shape and the
    /// presence of statutory deductions agree with the role.
    pub fn new(parts: PayrollRecordParts) -> AppResult<Self> {
        if !parts.role_type.receives_payroll() {
            return Err(AppError::Validation(format!(
                "role {} cannot hold a payroll record",
                parts.role_type
            )));
        }
        if parts.pay_period_start > parts.pay_period_end {
            return Err(AppError::Validation(
                "pay period start must not be after its end".to_owned(),
            ));
        }

        let commission_detail = matches!(parts.earnings, EarningsDetail::Commission(_));
        if commission_detail != parts.role_type.is_commission() {
            return Err(AppError::Validation(format!(
                "earnings detail does not match role {}",
                parts.role_type
            )));
        }
        if parts.statutory.is_some() != parts.role_type.is_employee() {
            return Err(AppError::Validation(format!(
                "statutory deductions must be present exactly for employees, role is {}",
                parts.role_type
            )));
        }

        let mut record = Self {
            user_name: parts.user_name,
            role_type: parts.role_type,
            pay_period_start: parts.pay_period_start,
            pay_period_end: parts.pay_period_end,
            earnings: parts.earnings,
            revenue_share_income: parts.revenue_share_income,
            statutory: parts.statutory,
            rent: parts.rent,
            revenue_share_deduction: parts.revenue_share_deduction,
            totals: PayTotals::default(),
            ytd: parts.ytd,
        };
        record.recompute_totals();
        Ok(record)
    }

    /// Returns the member's display name.
    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Returns the member's compensation role.
    #[must_use]
    pub fn role_type(&self) -> RoleType {
        self.role_type
    }

    /// Returns the first day of the pay period.
    #[must_use]
    pub fn pay_period_start(&self) -> NaiveDate {
        self.pay_period_start
    }

    /// Returns the last day of the pay period.
    #[must_use]
    pub fn pay_period_end(&self) -> NaiveDate {
        self.pay_period_end
    }

    /// Returns the number of calendar days in the pay period, inclusive.
    #[must_use]
    pub fn period_days(&self) -> i64 {
        (self.pay_period_end - self.pay_period_start).num_days() + 1
    }

    /// Returns the earnings detail.
    #[must_use]
    pub fn earnings(&self) -> &EarningsDetail {
        &self.earnings
    }

    /// Returns the revenue share paid to the member this period.
    #[must_use]
    pub fn revenue_share_income(&self) -> f64 {
        self.revenue_share_income
    }

    /// Returns the statutory withholdings, present for employees.
    #[must_use]
    pub fn statutory(&self) -> Option<&StatutoryDeductions> {
        self.statutory.as_ref()
    }

    /// Returns the rent charged this period.
    #[must_use]
    pub fn rent(&self) -> f64 {
        self.rent
    }

    /// Returns the revenue share charged to the member this period.
    #[must_use]
    pub fn revenue_share_deduction(&self) -> f64 {
        self.revenue_share_deduction
    }

    /// Returns the derived totals.
    #[must_use]
    pub fn totals(&self) -> PayTotals {
        self.totals
    }

    /// Returns the year-to-date figures.
    #[must_use]
    pub fn ytd(&self) -> YtdAmounts {
        self.ytd
    }

    /// Replaces the year-to-date figures. They are carried for display
    /// and never derived from the record's own fields.
    pub fn set_ytd(&mut self, ytd: YtdAmounts) {
        self.ytd = ytd;
    }

    /// Reads an amount, `None` when the record does not carry the field.
    #[must_use]
    pub fn amount(&self, field: PayrollField) -> Option<f64> {
        match field {
            PayrollField::Earning(field) => match (field, &self.earnings) {
                (EarningsField::RegularPay, EarningsDetail::Hourly(hourly)) => {
                    Some(hourly.regular_pay)
                }
                (EarningsField::OvertimePay, EarningsDetail::Hourly(hourly)) => {
                    Some(hourly.overtime_pay)
                }
                (EarningsField::VacationPay, EarningsDetail::Hourly(hourly)) => {
                    Some(hourly.vacation_pay)
                }
                (EarningsField::VacationPay, EarningsDetail::Commission(commission)) => {
                    Some(commission.vacation_pay)
                }
                (EarningsField::AdjustedTotal, EarningsDetail::Commission(commission)) => {
                    Some(commission.adjusted_total)
                }
                (EarningsField::TaxGst, EarningsDetail::Commission(commission)) => {
                    Some(commission.tax_gst)
                }
                (EarningsField::RevenueShareIncome, _) => Some(self.revenue_share_income),
                _ => None,
            },
            PayrollField::Deduction(field) => match field {
                DeductionField::FederalTax => self.statutory.as_ref().map(|s| s.federal_tax),
                DeductionField::ProvincialTax => self.statutory.as_ref().map(|s| s.provincial_tax),
                DeductionField::Cpp => self.statutory.as_ref().map(|s| s.cpp),
                DeductionField::Ei => self.statutory.as_ref().map(|s| s.ei),
                DeductionField::CommissionDeduction => match &self.earnings {
                    EarningsDetail::Commission(commission) => Some(commission.commission_deduction),
                    EarningsDetail::Hourly(_) => None,
                },
                DeductionField::PosFees => match &self.earnings {
                    EarningsDetail::Commission(commission) => Some(commission.pos_fees),
                    EarningsDetail::Hourly(_) => None,
                },
                DeductionField::Rent => Some(self.rent),
                DeductionField::RevenueShareDeduction => Some(self.revenue_share_deduction),
            },
        }
    }

    /// Writes an amount and re-derives the totals.
    ///
    /// Fails when the field is not legal for this record's shape, leaving
    /// the record untouched. Rate fields, hours and YTD figures are not
    /// addressable and are never recalculated.
    pub fn set_amount(&mut self, field: PayrollField, value: f64) -> AppResult<()> {
        let illegal = || {
            AppError::Validation(format!(
                "field {field} is not present on a {} record",
                self.role_type
            ))
        };

        match field {
            PayrollField::Earning(earning) => match (earning, &mut self.earnings) {
                (EarningsField::RegularPay, EarningsDetail::Hourly(hourly)) => {
                    hourly.regular_pay = value;
                }
                (EarningsField::OvertimePay, EarningsDetail::Hourly(hourly)) => {
                    hourly.overtime_pay = value;
                }
                (EarningsField::VacationPay, EarningsDetail::Hourly(hourly)) => {
                    hourly.vacation_pay = value;
                }
                (EarningsField::VacationPay, EarningsDetail::Commission(commission)) => {
                    commission.vacation_pay = value;
                }
                (EarningsField::AdjustedTotal, EarningsDetail::Commission(commission)) => {
                    commission.adjusted_total = value;
                }
                (EarningsField::TaxGst, EarningsDetail::Commission(commission)) => {
                    commission.tax_gst = value;
                }
                (EarningsField::RevenueShareIncome, _) => {
                    self.revenue_share_income = value;
                }
                _ => return Err(illegal()),
            },
            PayrollField::Deduction(deduction) => match deduction {
                DeductionField::FederalTax => {
                    self.statutory.as_mut().ok_or_else(illegal)?.federal_tax = value;
                }
                DeductionField::ProvincialTax => {
                    self.statutory.as_mut().ok_or_else(illegal)?.provincial_tax = value;
                }
                DeductionField::Cpp => {
                    self.statutory.as_mut().ok_or_else(illegal)?.cpp = value;
                }
                DeductionField::Ei => {
                    self.statutory.as_mut().ok_or_else(illegal)?.ei = value;
                }
                DeductionField::CommissionDeduction => match &mut self.earnings {
                    EarningsDetail::Commission(commission) => {
                        commission.commission_deduction = value;
                    }
                    EarningsDetail::Hourly(_) => return Err(illegal()),
                },
                DeductionField::PosFees => match &mut self.earnings {
                    EarningsDetail::Commission(commission) => commission.pos_fees = value,
                    EarningsDetail::Hourly(_) => return Err(illegal()),
                },
                DeductionField::Rent => self.rent = value,
                DeductionField::RevenueShareDeduction => self.revenue_share_deduction = value,
            },
        }

        self.recompute_totals();
        Ok(())
    }

    /// Re-derives `gross_income` and the totals from the component fields.
    fn recompute_totals(&mut self) {
        let earnings_total = match &mut self.earnings {
            EarningsDetail::Hourly(hourly) => {
                hourly.regular_pay + hourly.overtime_pay + hourly.vacation_pay
            }
            EarningsDetail::Commission(commission) => {
                commission.gross_income = round_cents(commission.adjusted_total + commission.tax_gst);
                commission.adjusted_total + commission.tax_gst + commission.vacation_pay
            }
        } + self.revenue_share_income;

        let mut deductions_total = self.rent + self.revenue_share_deduction;
        if let Some(statutory) = &self.statutory {
            deductions_total +=
                statutory.federal_tax + statutory.provincial_tax + statutory.cpp + statutory.ei;
        }
        if let EarningsDetail::Commission(commission) = &self.earnings {
            deductions_total += commission.commission_deduction + commission.pos_fees;
        }

        self.totals = PayTotals {
            total_earnings: round_cents(earnings_total),
            total_deductions: round_cents(deductions_total),
            net_payment: round_cents(earnings_total - deductions_total),
        };
    }
}
