use chrono::{Datelike, NaiveDate};

/// JOPPD report label: two-digit year followed by the three-digit day of year.
///
/// ```
/// use autotax::tax::derive_period_code;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
/// assert_eq!(derive_period_code(date), "24032");
/// ```
pub fn derive_period_code(date: NaiveDate) -> String {
    format!("{:02}{:03}", date.year().rem_euclid(100), date.ordinal())
}
