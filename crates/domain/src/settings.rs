//! Clinic-wide payroll settings and the tax bracket schedule editor.
//!
//! Bracket schedules are edited through [`BracketScheduleEditor`], which
//! keeps the brackets chained while staff type: changing one bracket's
//! maximum immediately becomes the next bracket's minimum, and a minimum
//! can never be dragged below its predecessor's maximum. Validation runs
//! once on save and reports the first offending bracket by its 1-based
//! position.

use clinipay_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One complete tax bracket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Marginal rate applied within the bracket, as a fraction.
    pub tax_rate: f64,
    /// Lower income bound, inclusive.
    pub min_income: f64,
    /// Upper income bound, exclusive.
    pub max_income: f64,
}

/// A bracket as it exists mid-edit, before validation.
///
/// `tax_rate` and `max_income` stay unset while the staff member is
/// typing; `min_income` always has a value because it chains from the
/// previous bracket.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BracketDraft {
    /// Marginal rate, unset until entered.
    pub tax_rate: Option<f64>,
    /// Lower income bound, chained from the predecessor.
    pub min_income: f64,
    /// Upper income bound, unset until entered.
    pub max_income: Option<f64>,
}

/// Interactive editor for one bracket schedule.
#[derive(Debug, Clone, Default)]
pub struct BracketScheduleEditor {
    drafts: Vec<BracketDraft>,
}

impl BracketScheduleEditor {
    /// Creates an empty editor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the editor from an existing schedule.
    #[must_use]
    pub fn from_brackets(brackets: &[TaxBracket]) -> Self {
        Self {
            drafts: brackets
                .iter()
                .map(|bracket| BracketDraft {
                    tax_rate: Some(bracket.tax_rate),
                    min_income: bracket.min_income,
                    max_income: Some(bracket.max_income),
                })
                .collect(),
        }
    }

    /// Returns the drafts in schedule order.
    #[must_use]
    pub fn drafts(&self) -> &[BracketDraft] {
        &self.drafts
    }

    /// Appends a bracket whose minimum chains from the previous maximum.
    pub fn add_bracket(&mut self) {
        let min_income = self
            .drafts
            .last()
            .and_then(|draft| draft.max_income)
            .unwrap_or(0.0);
        self.drafts.push(BracketDraft {
            tax_rate: None,
            min_income,
            max_income: None,
        });
    }

    /// Sets a bracket's marginal rate.
    pub fn set_tax_rate(&mut self, index: usize, value: f64) {
        if let Some(draft) = self.drafts.get_mut(index) {
            draft.tax_rate = Some(value);
        }
    }

    /// Sets a bracket's maximum and chains it into the next minimum.
    pub fn set_max_income(&mut self, index: usize, value: f64) {
        if let Some(draft) = self.drafts.get_mut(index) {
            draft.max_income = Some(value);
        }
        if let Some(next) = self.drafts.get_mut(index + 1) {
            next.min_income = value;
        }
    }

    /// Sets a bracket's minimum, ignoring values below the predecessor's
    /// maximum. The first bracket is freely editable.
    pub fn set_min_income(&mut self, index: usize, value: f64) {
        if index > 0 {
            let floor = self
                .drafts
                .get(index - 1)
                .and_then(|previous| previous.max_income);
            if let Some(floor) = floor
                && value < floor
            {
                return;
            }
        }
        if let Some(draft) = self.drafts.get_mut(index) {
            draft.min_income = value;
        }
    }

    /// Removes a bracket and re-chains the new successor's minimum to the
    /// new predecessor's maximum.
    pub fn remove(&mut self, index: usize) {
        if index >= self.drafts.len() {
            return;
        }
        self.drafts.remove(index);
        if index > 0
            && let Some(floor) = self.drafts.get(index - 1).and_then(|draft| draft.max_income)
            && let Some(successor) = self.drafts.get_mut(index)
        {
            successor.min_income = floor;
        }
    }

    /// Validates and produces the final schedule.
    ///
    /// The first failure aborts with a message naming the 1-based bracket
    /// position and the broken rule. `schedule_name` identifies the
    /// schedule in the message, e.g. `"federal"`.
    pub fn finish(&self, schedule_name: &str) -> AppResult<Vec<TaxBracket>> {
        let mut brackets = Vec::with_capacity(self.drafts.len());
        for (index, draft) in self.drafts.iter().enumerate() {
            let position = index + 1;
            let (Some(tax_rate), Some(max_income)) = (draft.tax_rate, draft.max_income) else {
                return Err(AppError::Validation(format!(
                    "{schedule_name} tax bracket {position}: all fields are required"
                )));
            };

            let bracket = TaxBracket {
                tax_rate,
                min_income: draft.min_income,
                max_income,
            };
            check_bracket(&bracket, brackets.last(), schedule_name, position)?;
            brackets.push(bracket);
        }
        Ok(brackets)
    }
}

fn check_bracket(
    bracket: &TaxBracket,
    previous: Option<&TaxBracket>,
    schedule_name: &str,
    position: usize,
) -> AppResult<()> {
    if bracket.max_income <= bracket.min_income {
        return Err(AppError::Validation(format!(
            "{schedule_name} tax bracket {position}: maximum income must be greater than minimum income"
        )));
    }
    if let Some(previous) = previous
        && bracket.min_income < previous.max_income
    {
        return Err(AppError::Validation(format!(
            "{schedule_name} tax bracket {position}: minimum income must be at least the previous bracket's maximum"
        )));
    }
    Ok(())
}

/// Validates a stored bracket schedule with the same rules the editor
/// applies on save.
pub fn validate_bracket_sequence(brackets: &[TaxBracket], schedule_name: &str) -> AppResult<()> {
    let mut previous: Option<&TaxBracket> = None;
    for (index, bracket) in brackets.iter().enumerate() {
        check_bracket(bracket, previous, schedule_name, index + 1)?;
        previous = Some(bracket);
    }
    Ok(())
}

/// Clinic-wide payroll configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSettings {
    /// Storage identifier, absent until first saved.
    pub id: Option<Uuid>,
    /// Federal income tax schedule.
    pub federal_tax_brackets: Vec<TaxBracket>,
    /// Provincial income tax schedule.
    pub provincial_tax_brackets: Vec<TaxBracket>,
    /// Pension contribution rate, as a fraction.
    pub cpp: f64,
    /// Annual pension basic exemption in dollars.
    pub cpp_exemption: f64,
    /// Annual maximum pension contribution in dollars.
    pub cpp_cap: f64,
    /// Employee insurance premium rate, as a fraction.
    pub ei_ee: f64,
    /// Employer insurance premium rate, as a fraction.
    pub ei_er: f64,
    /// Annual maximum employee insurance premium in dollars.
    pub ei_cap: f64,
    /// Vacation pay accrual rate, as a fraction of earnings.
    pub vacation_pay_rate: f64,
    /// Overtime wage multiplier, e.g. `1.5`.
    pub overtime_pay_rate: f64,
}

impl SiteSettings {
    /// Validates the whole configuration before it may be saved.
    pub fn validate(&self) -> AppResult<()> {
        validate_bracket_sequence(&self.federal_tax_brackets, "federal")?;
        validate_bracket_sequence(&self.provincial_tax_brackets, "provincial")?;

        for (name, value) in [
            ("cpp", self.cpp),
            ("cpp_exemption", self.cpp_exemption),
            ("cpp_cap", self.cpp_cap),
            ("ei_ee", self.ei_ee),
            ("ei_er", self.ei_er),
            ("ei_cap", self.ei_cap),
            ("vacation_pay_rate", self.vacation_pay_rate),
            ("overtime_pay_rate", self.overtime_pay_rate),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::Validation(format!(
                    "{name} must be a non-negative number"
                )));
            }
        }

        if self.cpp_cap <= self.cpp_exemption {
            return Err(AppError::Validation(
                "CPP maximum pensionable earnings must exceed the basic exemption".to_owned(),
            ));
        }
        Ok(())
    }
}
