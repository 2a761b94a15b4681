//! Tenor specification for market instruments and curve pillars.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// A market tenor: a whole number of days, weeks, months, or years.
///
/// Tenors identify instrument maturities in quote conventions ("3M deposit",
/// "10Y swap"). Conversion to concrete dates happens via
/// [`Tenor::add_to`]; conversion to an approximate year fraction via
/// [`Tenor::years`] is used only for ordering and display, never for accrual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tenor {
    /// A number of calendar days.
    Days(u32),
    /// A number of weeks.
    Weeks(u32),
    /// A number of months.
    Months(u32),
    /// A number of years.
    Years(u32),
}

impl Tenor {
    /// Approximate length in years, for ordering and display.
    #[must_use]
    pub fn years(&self) -> f64 {
        match self {
            Tenor::Days(d) => f64::from(*d) / 365.0,
            Tenor::Weeks(w) => f64::from(*w) * 7.0 / 365.0,
            Tenor::Months(m) => f64::from(*m) / 12.0,
            Tenor::Years(y) => f64::from(*y),
        }
    }

    /// Adds this tenor to a date.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDate` if the result is out of range.
    pub fn add_to(&self, date: super::Date) -> CoreResult<super::Date> {
        match self {
            Tenor::Days(d) => Ok(date.add_days(i64::from(*d))),
            Tenor::Weeks(w) => Ok(date.add_days(i64::from(*w) * 7)),
            Tenor::Months(m) => date.add_months(*m as i32),
            Tenor::Years(y) => date.add_years(*y as i32),
        }
    }

    /// Parses a tenor from a string like "3M", "2W", "10Y", "1D".
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTenor` if the string is malformed.
    pub fn parse(s: &str) -> CoreResult<Self> {
        let s = s.trim().to_uppercase();
        let (num, unit) = s.split_at(s.len().saturating_sub(1));
        let n: u32 = num
            .parse()
            .map_err(|_| CoreError::invalid_tenor(s.clone()))?;
        match unit {
            "D" => Ok(Tenor::Days(n)),
            "W" => Ok(Tenor::Weeks(n)),
            "M" => Ok(Tenor::Months(n)),
            "Y" => Ok(Tenor::Years(n)),
            _ => Err(CoreError::invalid_tenor(s)),
        }
    }
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tenor::Days(d) => write!(f, "{d}D"),
            Tenor::Weeks(w) => write!(f, "{w}W"),
            Tenor::Months(m) => write!(f, "{m}M"),
            Tenor::Years(y) => write!(f, "{y}Y"),
        }
    }
}
