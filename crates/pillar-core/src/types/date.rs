//! Date type for financial calculations.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// A calendar date.
///
/// Newtype wrapper around `chrono::NaiveDate` providing the date arithmetic
/// the curve engine needs. All schedule generation and holiday adjustment
/// happens upstream; by the time dates reach this workspace they are final,
/// so no calendar logic lives here.
///
/// # Example
///
/// ```rust
/// use pillar_core::types::Date;
///
/// let date = Date::from_ymd(2026, 6, 15).unwrap();
/// let later = date.add_months(6).unwrap();
/// assert_eq!(later.year(), 2026);
/// assert_eq!(later.month(), 12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Date(NaiveDate);

impl Date {
    /// Creates a new date from year, month, and day.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if the date is invalid.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> CoreResult<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Date)
            .ok_or_else(|| CoreError::invalid_date(format!("{year}-{month:02}-{day:02}")))
    }

    /// Creates a date from an ISO 8601 string (YYYY-MM-DD).
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if the string is not a valid date.
    pub fn parse(s: &str) -> CoreResult<Self> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Date)
            .map_err(|_| CoreError::invalid_date(format!("Cannot parse: {s}")))
    }

    /// Returns the year component.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Returns the month component (1-12).
    #[must_use]
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Returns the day component (1-31).
    #[must_use]
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Checks if the year is a leap year.
    #[must_use]
    pub fn is_leap_year(&self) -> bool {
        self.0.leap_year()
    }

    /// Returns the number of days in the date's month.
    #[must_use]
    pub fn days_in_month(&self) -> u32 {
        days_in_month(self.year(), self.month())
    }

    /// Adds a number of days to the date.
    #[must_use]
    pub fn add_days(&self, days: i64) -> Self {
        Date(self.0 + chrono::Duration::days(days))
    }

    /// Adds a number of months to the date.
    ///
    /// If the resulting day would be invalid (e.g., Jan 31 + 1 month),
    /// it rolls back to the last valid day of the month.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if the result is out of range.
    pub fn add_months(&self, months: i32) -> CoreResult<Self> {
        let total_months = self.year() * 12 + self.month() as i32 - 1 + months;
        let new_year = total_months.div_euclid(12);
        let new_month = (total_months.rem_euclid(12) + 1) as u32;

        let max_day = days_in_month(new_year, new_month);
        let new_day = self.day().min(max_day);

        Self::from_ymd(new_year, new_month, new_day)
    }

    /// Adds a number of years to the date.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if the result is invalid.
    pub fn add_years(&self, years: i32) -> CoreResult<Self> {
        self.add_months(years * 12)
    }

    /// Calculates the number of calendar days between two dates.
    ///
    /// Positive when `other` is after `self`.
    #[must_use]
    pub fn days_between(&self, other: &Date) -> i64 {
        (other.0 - self.0).num_days()
    }

    /// Returns the underlying `NaiveDate`.
    #[must_use]
    pub fn as_naive_date(&self) -> NaiveDate {
        self.0
    }

    /// Returns the day of week.
    #[must_use]
    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    /// Checks if the date is a weekend (Saturday or Sunday).
    #[must_use]
    pub fn is_weekend(&self) -> bool {
        matches!(self.weekday(), Weekday::Sat | Weekday::Sun)
    }
}

/// Number of days in a given year/month.
fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if NaiveDate::from_ymd_opt(year, 1, 1).is_some_and(|d| d.leap_year()) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Date(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ymd() {
        let date = Date::from_ymd(2026, 2, 28).unwrap();
        assert_eq!(date.year(), 2026);
        assert_eq!(date.month(), 2);
        assert_eq!(date.day(), 28);

        assert!(Date::from_ymd(2026, 2, 30).is_err());
        assert!(Date::from_ymd(2026, 13, 1).is_err());
    }

    #[test]
    fn test_parse() {
        let date = Date::parse("2026-08-05").unwrap();
        assert_eq!(date, Date::from_ymd(2026, 8, 5).unwrap());

        assert!(Date::parse("not a date").is_err());
    }

    #[test]
    fn test_add_months_end_of_month() {
        let jan31 = Date::from_ymd(2026, 1, 31).unwrap();
        let feb = jan31.add_months(1).unwrap();
        assert_eq!(feb, Date::from_ymd(2026, 2, 28).unwrap());

        // Leap year February
        let feb_leap = Date::from_ymd(2024, 1, 31).unwrap().add_months(1).unwrap();
        assert_eq!(feb_leap, Date::from_ymd(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_add_months_negative() {
        let mar = Date::from_ymd(2026, 3, 15).unwrap();
        assert_eq!(mar.add_months(-3).unwrap(), Date::from_ymd(2025, 12, 15).unwrap());
    }

    #[test]
    fn test_days_between() {
        let start = Date::from_ymd(2026, 1, 1).unwrap();
        let end = Date::from_ymd(2026, 4, 1).unwrap();
        assert_eq!(start.days_between(&end), 90);
        assert_eq!(end.days_between(&start), -90);
    }

    #[test]
    fn test_ordering() {
        let a = Date::from_ymd(2026, 1, 1).unwrap();
        let b = Date::from_ymd(2026, 6, 1).unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_display() {
        let date = Date::from_ymd(2026, 8, 5).unwrap();
        assert_eq!(date.to_string(), "2026-08-05");
    }
}
