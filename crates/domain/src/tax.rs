//! Progressive tax and statutory contribution arithmetic.
//!
//! Period amounts are annualized over 365 days, taxed through the
//! bracket schedules, then pro-rated back to the period. CPP and EI are
//! computed against the member's remaining year-to-date room so a
//! contribution can never overshoot its annual cap.

use clinipay_core::{AppError, AppResult};

use crate::money::round_cents;
use crate::settings::{SiteSettings, TaxBracket};

/// The member's statutory contributions so far this year.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContributionRoom {
    /// Pension contributions year to date, before this period.
    pub cpp_ytd: f64,
    /// Insurance premiums year to date, before this period.
    pub ei_ytd: f64,
}

/// Statutory withholdings computed for one pay period.
#[derive(Debug, Clone, Copy)]
pub struct PeriodDeductions {
    /// Federal income tax for the period.
    pub federal_tax: f64,
    /// Provincial income tax for the period.
    pub provincial_tax: f64,
    /// Pension contribution for the period, capped by remaining room.
    pub cpp: f64,
    /// Insurance premium for the period, capped by remaining room.
    pub ei: f64,
    /// Sum of the four components.
    pub total: f64,
    /// Pension contributions year to date after this period.
    pub cpp_ytd_after: f64,
    /// Insurance premiums year to date after this period.
    pub ei_ytd_after: f64,
}

/// Computes annual tax by walking the marginal brackets.
///
/// Income above the last bracket's maximum is not taxed further; the
/// schedule is expected to cover the incomes the clinic pays.
#[must_use]
pub fn progressive_tax(annual_income: f64, brackets: &[TaxBracket]) -> f64 {
    let mut tax = 0.0;
    for bracket in brackets {
        if annual_income <= bracket.min_income {
            break;
        }
        let taxable = annual_income.min(bracket.max_income) - bracket.min_income;
        tax += taxable * bracket.tax_rate;
    }
    tax
}

/// Computes the statutory withholdings for one pay period.
///
/// `taxable_income` is the period's taxable earnings and `period_days`
/// the inclusive calendar length of the period.
pub fn period_deductions(
    taxable_income: f64,
    period_days: i64,
    settings: &SiteSettings,
    room: &ContributionRoom,
) -> AppResult<PeriodDeductions> {
    if period_days <= 0 {
        return Err(AppError::Validation(
            "pay period must span at least one day".to_owned(),
        ));
    }

    let fraction = period_days as f64 / 365.0;
    let annual_income = taxable_income / fraction;

    let federal_tax = round_cents(progressive_tax(annual_income, &settings.federal_tax_brackets) * fraction);
    let provincial_tax =
        round_cents(progressive_tax(annual_income, &settings.provincial_tax_brackets) * fraction);

    let period_exemption = settings.cpp_exemption * fraction;
    let pensionable = (taxable_income - period_exemption).max(0.0);
    let cpp_room = (settings.cpp_cap - room.cpp_ytd).max(0.0);
    let cpp = round_cents((pensionable * settings.cpp).min(cpp_room));

    let ei_room = (settings.ei_cap - room.ei_ytd).max(0.0);
    let ei = round_cents((taxable_income * settings.ei_ee).min(ei_room));

    Ok(PeriodDeductions {
        federal_tax,
        provincial_tax,
        cpp,
        ei,
        total: round_cents(federal_tax + provincial_tax + cpp + ei),
        cpp_ytd_after: round_cents(room.cpp_ytd + cpp),
        ei_ytd_after: round_cents(room.ei_ytd + ei),
    })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::settings::{SiteSettings, TaxBracket};

    use super::{ContributionRoom, period_deductions, progressive_tax};

    fn bracket(rate: f64, min: f64, max: f64) -> TaxBracket {
        TaxBracket {
            tax_rate: rate,
            min_income: min,
            max_income: max,
        }
    }

    fn settings() -> SiteSettings {
        SiteSettings {
            id: Some(Uuid::nil()),
            federal_tax_brackets: vec![bracket(0.10, 0.0, 1_000_000.0)],
            provincial_tax_brackets: vec![bracket(0.0, 0.0, 1_000_000.0)],
            cpp: 0.05,
            cpp_exemption: 3_650.0,
            cpp_cap: 1_000.0,
            ei_ee: 0.016,
            ei_er: 0.022,
            ei_cap: 500.0,
            vacation_pay_rate: 0.04,
            overtime_pay_rate: 1.5,
        }
    }

    #[test]
    fn tax_is_marginal_across_brackets() {
        let brackets = vec![bracket(0.15, 0.0, 50_000.0), bracket(0.20, 50_000.0, 100_000.0)];
        let tax = progressive_tax(60_000.0, &brackets);
        assert!((tax - 9_500.0).abs() < 0.001);
    }

    #[test]
    fn income_below_a_bracket_stops_the_walk() {
        let brackets = vec![bracket(0.15, 0.0, 50_000.0), bracket(0.20, 50_000.0, 100_000.0)];
        let tax = progressive_tax(30_000.0, &brackets);
        assert!((tax - 4_500.0).abs() < 0.001);
    }

    #[test]
    fn period_tax_annualizes_and_prorates_back() {
        let deductions = period_deductions(1_000.0, 7, &settings(), &ContributionRoom::default())
            .unwrap_or_else(|_| unreachable!());
        // 10% flat: annualizing and pro-rating cancel out.
        assert!((deductions.federal_tax - 100.0).abs() < 0.001);
        assert_eq!(deductions.provincial_tax, 0.0);
    }

    #[test]
    fn cpp_respects_the_prorated_exemption() {
        let deductions = period_deductions(1_000.0, 7, &settings(), &ContributionRoom::default())
            .unwrap_or_else(|_| unreachable!());
        // Exemption over 7 days is 70.00, pensionable 930.00 at 5%.
        assert!((deductions.cpp - 46.5).abs() < 0.001);
    }

    #[test]
    fn cpp_is_capped_by_remaining_room() {
        let room = ContributionRoom {
            cpp_ytd: 980.0,
            ei_ytd: 0.0,
        };
        let deductions = period_deductions(1_000.0, 7, &settings(), &room)
            .unwrap_or_else(|_| unreachable!());
        assert!((deductions.cpp - 20.0).abs() < 0.001);
        assert!((deductions.cpp_ytd_after - 1_000.0).abs() < 0.001);
    }

    #[test]
    fn ei_is_capped_by_remaining_room() {
        let room = ContributionRoom {
            cpp_ytd: 0.0,
            ei_ytd: 495.0,
        };
        let deductions = period_deductions(10_000.0, 14, &settings(), &room)
            .unwrap_or_else(|_| unreachable!());
        assert!((deductions.ei - 5.0).abs() < 0.001);
        assert!((deductions.ei_ytd_after - 500.0).abs() < 0.001);
    }

    #[test]
    fn a_zero_day_period_is_rejected() {
        let result = period_deductions(1_000.0, 0, &settings(), &ContributionRoom::default());
        assert!(result.is_err());
    }
}
