//! Actual/365 Fixed day count convention.

use rust_decimal::Decimal;

use super::DayCount;
use crate::types::Date;

/// Actual/365 Fixed day count convention.
///
/// The day count is the actual number of days between dates; the year basis
/// is always 365 days, ignoring leap years. The workspace default for curve
/// time axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Act365Fixed;

impl DayCount for Act365Fixed {
    fn name(&self) -> &'static str {
        "ACT/365F"
    }

    fn year_fraction(&self, start: Date, end: Date) -> Decimal {
        Decimal::from(start.days_between(&end)) / Decimal::from(365)
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        start.days_between(&end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_act365_one_year() {
        let dc = Act365Fixed;
        let start = Date::from_ymd(2026, 1, 1).unwrap();
        let end = Date::from_ymd(2027, 1, 1).unwrap();
        assert_eq!(dc.year_fraction(start, end), dec!(1));
    }

    #[test]
    fn test_act365_leap_year_exceeds_one() {
        let dc = Act365Fixed;
        let start = Date::from_ymd(2024, 1, 1).unwrap();
        let end = Date::from_ymd(2025, 1, 1).unwrap();
        // 366 actual days over a fixed 365 basis
        assert!(dc.year_fraction(start, end) > Decimal::ONE);
    }
}
