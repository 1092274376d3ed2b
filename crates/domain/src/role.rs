//! Compensation role classification for clinic members.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use clinipay_core::AppError;
use serde::{Deserialize, Serialize};

/// How a clinic member is compensated.
///
/// The role decides which earnings shape a payroll record carries and
/// whether statutory deductions apply. Students are tracked as members
/// but never receive payroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RoleType {
    /// Paid an hourly wage with statutory deductions withheld.
    HourlyEmployee,
    /// Paid a commission split with statutory deductions withheld.
    CommissionEmployee,
    /// Paid an hourly wage and responsible for their own remittances.
    HourlyContractor,
    /// Paid a commission split and responsible for their own remittances.
    CommissionContractor,
    /// Tracked for scheduling only, never paid through payroll.
    Student,
}

impl RoleType {
    /// Returns the display form used on stubs and on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HourlyEmployee => "Hourly Employee",
            Self::CommissionEmployee => "Commission Employee",
            Self::HourlyContractor => "Hourly Contractor",
            Self::CommissionContractor => "Commission Contractor",
            Self::Student => "Student",
        }
    }

    /// Returns whether the role is paid on commission.
    #[must_use]
    pub fn is_commission(&self) -> bool {
        matches!(self, Self::CommissionEmployee | Self::CommissionContractor)
    }

    /// Returns whether the role is paid by the hour.
    #[must_use]
    pub fn is_hourly(&self) -> bool {
        matches!(self, Self::HourlyEmployee | Self::HourlyContractor)
    }

    /// Returns whether statutory deductions are withheld for the role.
    #[must_use]
    pub fn is_employee(&self) -> bool {
        matches!(self, Self::HourlyEmployee | Self::CommissionEmployee)
    }

    /// Returns whether the role handles its own remittances.
    #[must_use]
    pub fn is_contractor(&self) -> bool {
        matches!(self, Self::HourlyContractor | Self::CommissionContractor)
    }

    /// Returns whether payroll can be generated for the role.
    #[must_use]
    pub fn receives_payroll(&self) -> bool {
        !matches!(self, Self::Student)
    }
}

impl Display for RoleType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for RoleType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "Hourly Employee" | "HourlyEmployee" => Ok(Self::HourlyEmployee),
            "Commission Employee" | "CommissionEmployee" => Ok(Self::CommissionEmployee),
            "Hourly Contractor" | "HourlyContractor" => Ok(Self::HourlyContractor),
            "Commission Contractor" | "CommissionContractor" => Ok(Self::CommissionContractor),
            "Student" => Ok(Self::Student),
            other => Err(AppError::Validation(format!("unknown role type: {other}"))),
        }
    }
}

impl TryFrom<String> for RoleType {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RoleType> for String {
    fn from(value: RoleType) -> Self {
        value.as_str().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::RoleType;

    #[test]
    fn parses_spaced_and_compact_forms() {
        let spaced: RoleType = "Commission Employee"
            .parse()
            .unwrap_or_else(|_| unreachable!());
        let compact: RoleType = "CommissionEmployee"
            .parse()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(spaced, compact);
    }

    #[test]
    fn rejects_unknown_role() {
        assert!("Locum".parse::<RoleType>().is_err());
    }

    #[test]
    fn students_never_receive_payroll() {
        assert!(!RoleType::Student.receives_payroll());
        assert!(RoleType::HourlyContractor.receives_payroll());
    }

    #[test]
    fn employee_and_contractor_partition_paid_roles() {
        for role in [
            RoleType::HourlyEmployee,
            RoleType::CommissionEmployee,
            RoleType::HourlyContractor,
            RoleType::CommissionContractor,
        ] {
            assert_ne!(role.is_employee(), role.is_contractor());
            assert_ne!(role.is_hourly(), role.is_commission());
        }
    }
}
