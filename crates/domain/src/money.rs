//! Money helpers shared by every payroll computation.
//!
//! All monetary amounts are plain dollar values rounded to the cent with
//! half-up rounding, which matches how amounts travel on the wire and how
//! clinic administrators enter them.

/// Rounds a dollar amount to the nearest cent, half-up.
#[must_use]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Formats a dollar amount as `$1,234.56`.
///
/// Negative amounts render with the sign before the dollar symbol.
#[must_use]
pub fn format_currency(amount: f64) -> String {
    let rounded = round_cents(amount);
    let negative = rounded < 0.0;
    let cents = (rounded.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (position, digit) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position).is_multiple_of(3) {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}${grouped}.{fraction:02}")
}

/// Parses a user-entered currency string leniently.
///
/// Dollar signs, commas and surrounding whitespace are ignored. Empty or
/// non-numeric input parses as zero so a cleared form field never aborts
/// an edit.
#[must_use]
pub fn parse_currency(input: &str) -> f64 {
    let cleaned: String = input
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.' || *ch == '-')
        .collect();
    cleaned.parse::<f64>().unwrap_or(0.0)
}
