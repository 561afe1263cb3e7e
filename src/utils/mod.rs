//! Utility functions for formatting and input parsing
//!
//! This module provides centralized formatting of monetary values for the
//! terminal (Croatian locale) and the flexible date parsing used by the CLI.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

/// Currency symbol appended after the amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencySymbol {
    /// Append " €"
    EUR,
    /// Append " $"
    USD,
}

/// Core formatting function.
///
/// Formats a Decimal value using Croatian locale conventions:
/// - Thousands separator: `.` (period)
/// - Decimal separator: `,` (comma)
///
/// Values are rounded half away from zero to two decimals first.
///
/// # Examples
/// ```
/// use autotax::utils::{format_currency, CurrencySymbol};
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_currency(dec!(1234.56), CurrencySymbol::EUR), "1.234,56 €");
/// assert_eq!(format_currency(dec!(-0.5), CurrencySymbol::USD), "-0,50 $");
/// ```
pub fn format_currency(value: Decimal, symbol: CurrencySymbol) -> String {
    let rounded = crate::money::round2(value);
    let is_negative = rounded < Decimal::ZERO;

    let formatted = format!("{:.2}", rounded.abs());
    let (integer_part, decimal_part) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    // Add thousands separators (.) to integer part
    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec!['.', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative { "-" } else { "" };
    let suffix = match symbol {
        CurrencySymbol::EUR => " €",
        CurrencySymbol::USD => " $",
    };

    format!("{}{},{}{}", sign, with_separators, decimal_part, suffix)
}

// ============ Convenience functions ============

/// Format as euros: "1.234,56 €"
///
/// # Examples
/// ```
/// use autotax::utils::format_eur;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_eur(dec!(1234.56)), "1.234,56 €");
/// assert_eq!(format_eur(dec!(-500)), "-500,00 €");
/// ```
pub fn format_eur(value: Decimal) -> String {
    format_currency(value, CurrencySymbol::EUR)
}

/// Format as dollars: "1.500,00 $"
pub fn format_usd(value: Decimal) -> String {
    format_currency(value, CurrencySymbol::USD)
}

/// Format a fraction as a whole percentage: 0.18 -> "18%"
pub fn format_percent(fraction: Decimal) -> String {
    format!("{}%", (fraction * Decimal::ONE_HUNDRED).normalize())
}

/// Parse a filing date.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS` and the
/// Croatian `DD.MM.YYYY` (with or without the trailing dot). Only the date
/// part is kept.
pub fn parse_filing_date(s: &str) -> Result<NaiveDate, String> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt.date());
        }
    }

    let croatian = s.strip_suffix('.').unwrap_or(s);
    if let Ok(date) = NaiveDate::parse_from_str(croatian, "%d.%m.%Y") {
        return Ok(date);
    }

    Err(format!(
        "Invalid date '{}'. Use YYYY-MM-DD or DD.MM.YYYY.",
        s
    ))
}
