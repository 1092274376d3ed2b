use clinipay_core::{AppError, AppResult};
use clinipay_domain::{SiteSettings, TaxBracket};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One tax bracket on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxBracketDto {
    /// Marginal rate applied within the bracket, as a fraction.
    pub tax_rate: f64,
    /// Lower income bound, inclusive.
    pub min_income: f64,
    /// Upper income bound, exclusive.
    pub max_income: f64,
}

impl From<TaxBracket> for TaxBracketDto {
    fn from(value: TaxBracket) -> Self {
        Self {
            tax_rate: value.tax_rate,
            min_income: value.min_income,
            max_income: value.max_income,
        }
    }
}

impl From<TaxBracketDto> for TaxBracket {
    fn from(value: TaxBracketDto) -> Self {
        Self {
            tax_rate: value.tax_rate,
            min_income: value.min_income,
            max_income: value.max_income,
        }
    }
}

/// Clinic-wide payroll settings on the wire.
///
/// Scalars arrive as optional so a missing field can be reported by name
/// instead of failing deserialization of the whole body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSettingsDto {
    /// Storage identifier, absent until first saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// Federal income tax schedule.
    pub federal_tax_brackets: Vec<TaxBracketDto>,
    /// Provincial income tax schedule.
    pub provincial_tax_brackets: Vec<TaxBracketDto>,
    /// Pension contribution rate, as a fraction.
    #[serde(default)]
    pub cpp: Option<f64>,
    /// Annual pension basic exemption in dollars.
    #[serde(default)]
    pub cpp_exemption: Option<f64>,
    /// Annual maximum pension contribution in dollars.
    #[serde(default)]
    pub cpp_cap: Option<f64>,
    /// Employee insurance premium rate, as a fraction.
    #[serde(default)]
    pub ei_ee: Option<f64>,
    /// Employer insurance premium rate, as a fraction.
    #[serde(default)]
    pub ei_er: Option<f64>,
    /// Annual maximum employee insurance premium in dollars.
    #[serde(default)]
    pub ei_cap: Option<f64>,
    /// Vacation pay accrual rate, as a fraction of earnings.
    #[serde(default)]
    pub vacation_pay_rate: Option<f64>,
    /// Overtime wage multiplier.
    #[serde(default)]
    pub overtime_pay_rate: Option<f64>,
}

impl From<SiteSettings> for SiteSettingsDto {
    fn from(value: SiteSettings) -> Self {
        Self {
            id: value.id,
            federal_tax_brackets: value
                .federal_tax_brackets
                .into_iter()
                .map(TaxBracketDto::from)
                .collect(),
            provincial_tax_brackets: value
                .provincial_tax_brackets
                .into_iter()
                .map(TaxBracketDto::from)
                .collect(),
            cpp: Some(value.cpp),
            cpp_exemption: Some(value.cpp_exemption),
            cpp_cap: Some(value.cpp_cap),
            ei_ee: Some(value.ei_ee),
            ei_er: Some(value.ei_er),
            ei_cap: Some(value.ei_cap),
            vacation_pay_rate: Some(value.vacation_pay_rate),
            overtime_pay_rate: Some(value.overtime_pay_rate),
        }
    }
}

impl SiteSettingsDto {
    /// Converts to the domain type, naming the first missing scalar.
    pub fn into_settings(self) -> AppResult<SiteSettings> {
        Ok(SiteSettings {
            id: self.id,
            federal_tax_brackets: self
                .federal_tax_brackets
                .into_iter()
                .map(TaxBracket::from)
                .collect(),
            provincial_tax_brackets: self
                .provincial_tax_brackets
                .into_iter()
                .map(TaxBracket::from)
                .collect(),
            cpp: required(self.cpp, "cpp")?,
            cpp_exemption: required(self.cpp_exemption, "cpp_exemption")?,
            cpp_cap: required(self.cpp_cap, "cpp_cap")?,
            ei_ee: required(self.ei_ee, "ei_ee")?,
            ei_er: required(self.ei_er, "ei_er")?,
            ei_cap: required(self.ei_cap, "ei_cap")?,
            vacation_pay_rate: required(self.vacation_pay_rate, "vacation_pay_rate")?,
            overtime_pay_rate: required(self.overtime_pay_rate, "overtime_pay_rate")?,
        })
    }
}

fn required(value: Option<f64>, name: &str) -> AppResult<f64> {
    value.ok_or_else(|| AppError::Validation(format!("{name} is required")))
}
