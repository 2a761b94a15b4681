//! 30E/360 (Eurobond Basis) day count convention.

use rust_decimal::Decimal;

use super::DayCount;
use crate::types::Date;

/// 30E/360 day count convention (Eurobond Basis).
///
/// Day-of-month values of 31 are truncated to 30 on both dates; months are
/// assumed to have 30 days and the year basis is 360. Standard for EUR fixed
/// swap legs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Thirty360E;

impl DayCount for Thirty360E {
    fn name(&self) -> &'static str {
        "30E/360"
    }

    fn year_fraction(&self, start: Date, end: Date) -> Decimal {
        Decimal::from(self.day_count(start, end)) / Decimal::from(360)
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        let d1 = i64::from(start.day().min(30));
        let d2 = i64::from(end.day().min(30));

        360 * i64::from(end.year() - start.year())
            + 30 * (i64::from(end.month()) - i64::from(start.month()))
            + (d2 - d1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_half_year() {
        let dc = Thirty360E;
        let start = Date::from_ymd(2026, 1, 15).unwrap();
        let end = Date::from_ymd(2026, 7, 15).unwrap();
        assert_eq!(dc.day_count(start, end), 180);
        assert_eq!(dc.year_fraction(start, end), dec!(0.5));
    }

    #[test]
    fn test_31st_truncation() {
        let dc = Thirty360E;
        let start = Date::from_ymd(2026, 1, 31).unwrap();
        let end = Date::from_ymd(2026, 7, 31).unwrap();
        // Both 31sts count as 30
        assert_eq!(dc.day_count(start, end), 180);
    }

    #[test]
    fn test_february_not_adjusted() {
        let dc = Thirty360E;
        let start = Date::from_ymd(2026, 2, 28).unwrap();
        let end = Date::from_ymd(2026, 3, 28).unwrap();
        assert_eq!(dc.day_count(start, end), 30);
    }
}
