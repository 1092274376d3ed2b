//! Pay stub presentation derived from a payroll record.
//!
//! The stub is a fixed six-row grid per side. Which labels occupy which
//! rows depends on the role: commission stubs use a three-column
//! earnings table (description, rate, amount) while hourly stubs add an
//! hours column. All amounts are pre-formatted currency strings; the
//! stub never recomputes anything.

use crate::money::format_currency;
use crate::record::{EarningsDetail, PayrollRecord};

/// Rows rendered on each side of the stub.
const BODY_ROWS: usize = 6;

/// One earnings line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EarningsRow {
    /// Row description, empty for filler rows.
    pub label: String,
    /// Hours column, used only on four-column stubs.
    pub quantity: String,
    /// Rate column: a wage, an overtime wage or a commission percentage.
    pub rate: String,
    /// Formatted dollar amount.
    pub amount: String,
}

/// One deduction line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeductionRow {
    /// Row description, empty for filler rows.
    pub label: String,
    /// Formatted dollar amount.
    pub amount: String,
}

/// A fully laid out pay stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayStub {
    /// Member display name.
    pub member_name: String,
    /// Role shown in the stub header.
    pub role: String,
    /// Pay period label, e.g. `Jun 1, 2024 - Jun 15, 2024`.
    pub period: String,
    /// Earnings table width: 3 for commission, 4 for hourly.
    pub earnings_columns: usize,
    /// The six earnings rows, in render order.
    pub earnings_rows: Vec<EarningsRow>,
    /// The six deduction rows, in render order.
    pub deduction_rows: Vec<DeductionRow>,
    /// Formatted earnings total.
    pub total_earnings: String,
    /// Formatted deductions total.
    pub total_deductions: String,
    /// Formatted net payment.
    pub net_payment: String,
    /// Formatted year-to-date earnings.
    pub ytd_earnings: String,
    /// Formatted year-to-date deductions.
    pub ytd_deductions: String,
}

impl PayStub {
    /// Lays out the stub for a record.
    #[must_use]
    pub fn from_record(record: &PayrollRecord) -> Self {
        let totals = record.totals();
        let ytd = record.ytd();
        Self {
            member_name: record.user_name().to_owned(),
            role: record.role_type().to_string(),
            period: format!(
                "{} - {}",
                record.pay_period_start().format("%b %-d, %Y"),
                record.pay_period_end().format("%b %-d, %Y")
            ),
            earnings_columns: if record.role_type().is_commission() {
                3
            } else {
                4
            },
            earnings_rows: earnings_rows(record),
            deduction_rows: deduction_rows(record),
            total_earnings: format_currency(totals.total_earnings),
            total_deductions: format_currency(totals.total_deductions),
            net_payment: format_currency(totals.net_payment),
            ytd_earnings: format_currency(ytd.earnings),
            ytd_deductions: format_currency(ytd.deductions),
        }
    }
}

fn pad<T: Default>(mut rows: Vec<T>) -> Vec<T> {
    while rows.len() < BODY_ROWS {
        rows.push(T::default());
    }
    rows.truncate(BODY_ROWS);
    rows
}

fn earnings_rows(record: &PayrollRecord) -> Vec<EarningsRow> {
    let mut rows = Vec::with_capacity(BODY_ROWS);
    match record.earnings() {
        EarningsDetail::Commission(commission) => {
            rows.push(EarningsRow {
                label: "Adjusted Total".to_owned(),
                quantity: String::new(),
                rate: format!("{:.1}%", commission.commission_rate * 100.0),
                amount: format_currency(commission.adjusted_total),
            });
            rows.push(EarningsRow {
                label: "GST".to_owned(),
                quantity: String::new(),
                rate: "-".to_owned(),
                amount: format_currency(commission.tax_gst),
            });
            if commission.vacation_pay > 0.0 {
                rows.push(EarningsRow {
                    label: "Vacation Pay".to_owned(),
                    quantity: String::new(),
                    rate: "-".to_owned(),
                    amount: format_currency(commission.vacation_pay),
                });
            }
        }
        EarningsDetail::Hourly(hourly) => {
            rows.push(EarningsRow {
                label: "Regular Pay".to_owned(),
                quantity: format!("{:.2}", hourly.regular_hours),
                rate: format_currency(hourly.hourly_wage),
                amount: format_currency(hourly.regular_pay),
            });
            if hourly.overtime_hours > 0.0 || hourly.overtime_pay > 0.0 {
                let rate = if hourly.overtime_hours > 0.0 {
                    format_currency(hourly.overtime_pay / hourly.overtime_hours)
                } else {
                    String::new()
                };
                rows.push(EarningsRow {
                    label: "Overtime Pay".to_owned(),
                    quantity: format!("{:.2}", hourly.overtime_hours),
                    rate,
                    amount: format_currency(hourly.overtime_pay),
                });
            }
            if hourly.vacation_pay > 0.0 {
                rows.push(EarningsRow {
                    label: "Vacation Pay".to_owned(),
                    quantity: String::new(),
                    rate: String::new(),
                    amount: format_currency(hourly.vacation_pay),
                });
            }
        }
    }

    if record.revenue_share_income() > 0.0 {
        rows.push(EarningsRow {
            label: "Revenue Share Income".to_owned(),
            quantity: String::new(),
            rate: String::new(),
            amount: format_currency(record.revenue_share_income()),
        });
    }
    pad(rows)
}

fn deduction_rows(record: &PayrollRecord) -> Vec<DeductionRow> {
    let mut rows = Vec::with_capacity(BODY_ROWS);

    if let EarningsDetail::Commission(commission) = record.earnings() {
        rows.push(DeductionRow {
            label: "Commission Deduction".to_owned(),
            amount: format_currency(commission.commission_deduction),
        });
        rows.push(DeductionRow {
            label: "POS Fees".to_owned(),
            amount: format_currency(commission.pos_fees),
        });
    }

    if let Some(statutory) = record.statutory() {
        rows.push(DeductionRow {
            label: "Federal Tax".to_owned(),
            amount: format_currency(statutory.federal_tax),
        });
        rows.push(DeductionRow {
            label: "Provincial Tax".to_owned(),
            amount: format_currency(statutory.provincial_tax),
        });
        rows.push(DeductionRow {
            label: "CPP".to_owned(),
            amount: format_currency(statutory.cpp),
        });
        rows.push(DeductionRow {
            label: "EI".to_owned(),
            amount: format_currency(statutory.ei),
        });
    }

    // Rent and revenue share take the last two rows, displacing CPP and
    // EI on a full commission-employee stub.
    let mut tail = Vec::new();
    if record.rent() > 0.0 {
        tail.push(DeductionRow {
            label: "Rent".to_owned(),
            amount: format_currency(record.rent()),
        });
    }
    if record.revenue_share_deduction() > 0.0 {
        tail.push(DeductionRow {
            label: "Revenue Share Deduction".to_owned(),
            amount: format_currency(record.revenue_share_deduction()),
        });
    }
    rows.truncate(BODY_ROWS - tail.len());
    rows.extend(tail);
    pad(rows)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::record::{
        CommissionEarnings, EarningsDetail, HourlyEarnings, PayrollRecord, PayrollRecordParts,
        StatutoryDeductions, YtdAmounts,
    };
    use crate::role::RoleType;

    use super::PayStub;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap_or_else(|| unreachable!())
    }

    fn commission_employee() -> PayrollRecord {
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

    fn hourly_contractor() -> PayrollRecord {
        PayrollRecord::new(PayrollRecordParts {
            user_name: "Sam Ota".to_owned(),
            role_type: RoleType::HourlyContractor,
            pay_period_start: date(2024, 6, 3),
            pay_period_end: date(2024, 6, 9),
            earnings: EarningsDetail::Hourly(HourlyEarnings {
                hourly_wage: 30.0,
                regular_hours: 40.0,
                overtime_hours: 2.0,
                regular_pay: 1200.0,
                overtime_pay: 90.0,
                vacation_pay: 0.0,
            }),
            revenue_share_income: 0.0,
            statutory: None,
            rent: 500.0,
            revenue_share_deduction: 0.0,
            ytd: YtdAmounts::default(),
        })
        .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn commission_stub_uses_three_columns_in_render_order() {
        let stub = PayStub::from_record(&commission_employee());

        assert_eq!(stub.earnings_columns, 3);
        assert_eq!(stub.earnings_rows[0].label, "Adjusted Total");
        assert_eq!(stub.earnings_rows[0].rate, "45.0%");
        assert_eq!(stub.earnings_rows[1].label, "GST");
        assert_eq!(stub.earnings_rows[2].label, "Vacation Pay");
        assert_eq!(stub.earnings_rows[3].label, "");
    }

    #[test]
    fn hourly_stub_uses_four_columns_and_never_shows_gst() {
        let stub = PayStub::from_record(&hourly_contractor());

        assert_eq!(stub.earnings_columns, 4);
        assert_eq!(stub.earnings_rows[0].label, "Regular Pay");
        assert_eq!(stub.earnings_rows[0].quantity, "40.00");
        assert_eq!(stub.earnings_rows[1].label, "Overtime Pay");
        assert_eq!(stub.earnings_rows[1].rate, "$45.00");
        assert!(stub.earnings_rows.iter().all(|row| row.label != "GST"));
    }

    #[test]
    fn contractor_stub_hides_statutory_rows() {
        let stub = PayStub::from_record(&hourly_contractor());

        assert_eq!(stub.deduction_rows[0].label, "Rent");
        assert!(
            stub.deduction_rows
                .iter()
                .all(|row| row.label != "Federal Tax" && row.label != "CPP")
        );
    }

    #[test]
    fn rent_displaces_cpp_on_a_full_commission_employee_stub() {
        let mut record = commission_employee();
        record
            .set_amount(
                crate::record::PayrollField::Deduction(crate::record::DeductionField::Rent),
                500.0,
            )
            .unwrap_or_else(|_| unreachable!());

        let stub = PayStub::from_record(&record);
        let labels: Vec<&str> = stub
            .deduction_rows
            .iter()
            .map(|row| row.label.as_str())
            .collect();
        assert_eq!(
            labels,
            vec![
                "Commission Deduction",
                "POS Fees",
                "Federal Tax",
                "Provincial Tax",
                "CPP",
                "Rent"
            ]
        );
    }

    #[test]
    fn stub_shows_every_row_per_side() {
        let stub = PayStub::from_record(&commission_employee());
        assert_eq!(stub.earnings_rows.len(), 6);
        assert_eq!(stub.deduction_rows.len(), 6);
    }

    #[test]
    fn totals_come_from_the_record_verbatim() {
        let stub = PayStub::from_record(&commission_employee());
        assert_eq!(stub.total_earnings, "$1,068.90");
        assert_eq!(stub.net_payment, "$385.90");
        assert_eq!(stub.ytd_earnings, "$5,000.00");
    }
}
