//! Pay schedules and pay interval generation.
//!
//! A member's pay assignment carries either a standard cadence or a list
//! of monthly cutoff days. Interval generation is pure: it takes today's
//! date and returns the elapsed periods, most recent first. All dates are
//! calendar dates (`NaiveDate`), so a `YYYY-MM-DD` wire value can never
//! shift across a timezone boundary.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{Datelike, Duration, Months, NaiveDate};
use clinipay_core::AppError;
use serde::{Deserialize, Serialize};

/// How many periods back interval generation looks.
const LOOKBACK_PERIODS: u32 = 12;

/// Standard payroll cadences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayFrequency {
    /// Monday through Sunday weeks.
    Weekly,
    /// Fourteen-day periods aligned to Monday.
    BiWeekly,
    /// The 1st through the 15th, then the 16th through month end.
    SemiMonthly,
    /// Full calendar months.
    Monthly,
}

impl PayFrequency {
    /// Returns the wire identifier for the cadence.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::BiWeekly => "bi-weekly",
            Self::SemiMonthly => "semi-monthly",
            Self::Monthly => "monthly",
        }
    }
}

impl FromStr for PayFrequency {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "bi-weekly" | "biweekly" => Ok(Self::BiWeekly),
            "semi-monthly" | "semimonthly" => Ok(Self::SemiMonthly),
            "monthly" => Ok(Self::Monthly),
            other => Err(AppError::Validation(format!(
                "unknown pay frequency: {other}"
            ))),
        }
    }
}

/// One cutoff inside a custom monthly schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayrollCutoff {
    /// A fixed day of the month, clamped to the month's length.
    DayOfMonth(u8),
    /// The last calendar day of the month.
    EndOfMonth,
}

impl PayrollCutoff {
    /// Resolves the cutoff to a concrete day within the given month.
    #[must_use]
    fn resolve(&self, last_day: u32) -> u32 {
        match self {
            Self::DayOfMonth(day) => u32::from(*day).min(last_day),
            Self::EndOfMonth => last_day,
        }
    }
}

impl Display for PayrollCutoff {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DayOfMonth(day) => write!(formatter, "{day}"),
            Self::EndOfMonth => formatter.write_str("end of month"),
        }
    }
}

impl FromStr for PayrollCutoff {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("end of month") {
            return Ok(Self::EndOfMonth);
        }

        let day: u8 = trimmed
            .parse()
            .map_err(|_| AppError::Validation(format!("invalid payroll cutoff: {trimmed}")))?;
        if !(1..=31).contains(&day) {
            return Err(AppError::Validation(format!(
                "payroll cutoff day out of range: {day}"
            )));
        }

        Ok(Self::DayOfMonth(day))
    }
}

/// A member's pay period policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaySchedule {
    /// One of the standard cadences.
    Cadence(PayFrequency),
    /// Custom monthly cutoff days.
    CutoffDays(Vec<PayrollCutoff>),
}

impl PaySchedule {
    /// Generates the elapsed pay intervals as of `today`, most recent first.
    #[must_use]
    pub fn intervals(&self, today: NaiveDate) -> Vec<PayInterval> {
        pay_intervals(self, today)
    }
}

/// One selectable pay period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayInterval {
    /// Stable identifier unique within a generated list.
    pub id: String,
    /// First day of the period.
    pub start_date: NaiveDate,
    /// Last day of the period, inclusive.
    pub end_date: NaiveDate,
    /// Human-readable label shown in the interval picker.
    pub label: String,
    /// Cadence identifier, `"custom"` for cutoff schedules.
    pub frequency: String,
}

/// Generates the elapsed pay intervals for a schedule, most recent first.
///
/// Only fully elapsed periods are included (`end_date <= today`). An empty
/// result is legal; callers surface it as an explicit empty state.
#[must_use]
pub fn pay_intervals(schedule: &PaySchedule, today: NaiveDate) -> Vec<PayInterval> {
    let mut intervals = match schedule {
        PaySchedule::Cadence(PayFrequency::Weekly) => week_aligned_intervals(today, 7),
        PaySchedule::Cadence(PayFrequency::BiWeekly) => week_aligned_intervals(today, 14),
        PaySchedule::Cadence(PayFrequency::SemiMonthly) => semi_monthly_intervals(today),
        PaySchedule::Cadence(PayFrequency::Monthly) => monthly_intervals(today),
        PaySchedule::CutoffDays(cutoffs) => cutoff_intervals(cutoffs, today),
    };
    intervals.sort_by(|a, b| b.end_date.cmp(&a.end_date));
    intervals
}

fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

fn week_aligned_intervals(today: NaiveDate, span_days: i64) -> Vec<PayInterval> {
    let mut intervals = Vec::new();
    // One extra step replaces the in-progress period that gets filtered
    // out, so the emitted count stays at LOOKBACK_PERIODS.
    for periods_back in 0..=LOOKBACK_PERIODS {
        if intervals.len() == LOOKBACK_PERIODS as usize {
            break;
        }
        let anchor = today - Duration::days(span_days * i64::from(periods_back));
        let start = monday_of(anchor);
        let end = start + Duration::days(span_days - 1);
        if end > today {
            continue;
        }

        let (label, frequency) = if span_days == 7 {
            (
                format!(
                    "Week of {} - {}",
                    start.format("%b %-d"),
                    end.format("%b %-d, %Y")
                ),
                PayFrequency::Weekly,
            )
        } else {
            (
                format!(
                    "{} - {} (Bi-weekly)",
                    start.format("%b %-d"),
                    end.format("%b %-d, %Y")
                ),
                PayFrequency::BiWeekly,
            )
        };
        intervals.push(PayInterval {
            id: format!("{}-{start}", frequency.as_str()),
            start_date: start,
            end_date: end,
            label,
            frequency: frequency.as_str().to_owned(),
        });
    }
    intervals
}

fn first_of_month_back(today: NaiveDate, months_back: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(today.year(), today.month(), 1)?
        .checked_sub_months(Months::new(months_back))
}

fn last_day_of_month(first: NaiveDate) -> Option<NaiveDate> {
    first.checked_add_months(Months::new(1))?.pred_opt()
}

fn semi_monthly_intervals(today: NaiveDate) -> Vec<PayInterval> {
    let mut intervals = Vec::new();
    for months_back in 0..LOOKBACK_PERIODS {
        let Some(first) = first_of_month_back(today, months_back) else {
            continue;
        };
        let Some(last) = last_day_of_month(first) else {
            continue;
        };
        let (Some(mid_end), Some(second_start)) = (first.with_day(15), first.with_day(16)) else {
            continue;
        };

        for (start, end) in [(second_start, last), (first, mid_end)] {
            if end > today {
                continue;
            }
            intervals.push(PayInterval {
                id: format!("semi-monthly-{start}"),
                start_date: start,
                end_date: end,
                label: format!(
                    "{} - {} (Semi-monthly)",
                    start.format("%b %-d"),
                    end.format("%b %-d, %Y")
                ),
                frequency: PayFrequency::SemiMonthly.as_str().to_owned(),
            });
        }
    }
    intervals
}

fn monthly_intervals(today: NaiveDate) -> Vec<PayInterval> {
    let mut intervals = Vec::new();
    for months_back in 0..=LOOKBACK_PERIODS {
        if intervals.len() == LOOKBACK_PERIODS as usize {
            break;
        }
        let Some(first) = first_of_month_back(today, months_back) else {
            continue;
        };
        let Some(last) = last_day_of_month(first) else {
            continue;
        };
        if last > today {
            continue;
        }

        intervals.push(PayInterval {
            id: format!("monthly-{first}"),
            start_date: first,
            end_date: last,
            label: format!("{} (Monthly)", first.format("%B %Y")),
            frequency: PayFrequency::Monthly.as_str().to_owned(),
        });
    }
    intervals
}

fn cutoff_intervals(cutoffs: &[PayrollCutoff], today: NaiveDate) -> Vec<PayInterval> {
    let mut intervals = Vec::new();
    for months_back in 0..LOOKBACK_PERIODS {
        let Some(first) = first_of_month_back(today, months_back) else {
            continue;
        };
        let Some(last) = last_day_of_month(first) else {
            continue;
        };

        let mut days: Vec<u32> = cutoffs
            .iter()
            .map(|cutoff| cutoff.resolve(last.day()))
            .collect();
        days.sort_unstable();
        days.dedup();

        let mut segment_start = first;
        for day in days {
            let Some(end) = first.with_day(day) else {
                continue;
            };
            if end < segment_start {
                continue;
            }
            if end <= today {
                intervals.push(PayInterval {
                    id: format!("custom-{segment_start}"),
                    start_date: segment_start,
                    end_date: end,
                    label: format!(
                        "{} - {}",
                        segment_start.format("%B %-d"),
                        end.format("%B %-d, %Y")
                    ),
                    frequency: "custom".to_owned(),
                });
            }
            segment_start = end + Duration::days(1);
        }
    }
    intervals
}
