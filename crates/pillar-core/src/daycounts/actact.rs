//! Actual/Actual ISDA day count convention.

use rust_decimal::Decimal;

use super::DayCount;
use crate::types::Date;

/// Actual/Actual ISDA day count convention.
///
/// Splits the period at year boundaries: days falling in a leap year accrue
/// over 366, days in a non-leap year over 365.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActActIsda;

impl DayCount for ActActIsda {
    fn name(&self) -> &'static str {
        "ACT/ACT ISDA"
    }

    fn year_fraction(&self, start: Date, end: Date) -> Decimal {
        if start == end {
            return Decimal::ZERO;
        }
        if start > end {
            return -self.year_fraction(end, start);
        }

        let mut total = Decimal::ZERO;
        for year in start.year()..=end.year() {
            let year_start = Date::from_ymd(year, 1, 1).expect("Jan 1 is always valid");
            let year_end = Date::from_ymd(year + 1, 1, 1).expect("Jan 1 is always valid");

            let seg_start = if start > year_start { start } else { year_start };
            let seg_end = if end < year_end { end } else { year_end };

            let days = seg_start.days_between(&seg_end);
            if days <= 0 {
                continue;
            }
            let basis = if year_start.is_leap_year() { 366 } else { 365 };
            total += Decimal::from(days) / Decimal::from(basis);
        }
        total
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        start.days_between(&end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal_macros::dec;

    #[test]
    fn test_single_year() {
        let dc = ActActIsda;
        let start = Date::from_ymd(2026, 1, 1).unwrap();
        let end = Date::from_ymd(2027, 1, 1).unwrap();
        assert_eq!(dc.year_fraction(start, end), dec!(1));
    }

    #[test]
    fn test_spans_leap_boundary() {
        let dc = ActActIsda;
        let start = Date::from_ymd(2023, 7, 1).unwrap();
        let end = Date::from_ymd(2024, 7, 1).unwrap();

        // 184 days in 2023 over 365, 182 days in 2024 over 366
        let expected = 184.0 / 365.0 + 182.0 / 366.0;
        let got = dc.year_fraction(start, end).to_f64().unwrap();
        assert!((got - expected).abs() < 1e-12);
    }

    #[test]
    fn test_negative() {
        let dc = ActActIsda;
        let start = Date::from_ymd(2026, 7, 1).unwrap();
        let end = Date::from_ymd(2026, 1, 1).unwrap();
        assert!(dc.year_fraction(start, end) < Decimal::ZERO);
    }
}
