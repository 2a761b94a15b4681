//! Day count conventions.
//!
//! Day count conventions determine how year fractions between two dates are
//! computed. The curve engine uses them in two places: accrual factors on
//! instrument legs, and the time axis of a curve (converting dates to node
//! x-values).
//!
//! # Supported Conventions
//!
//! - [`Act360`]: Actual/360 - money market convention
//! - [`Act365Fixed`]: Actual/365 Fixed - GBP markets, curve time axes
//! - [`ActActIsda`]: Actual/Actual ISDA - year-based split
//! - [`Thirty360E`]: 30E/360 - Eurobond/EUR fixed leg convention
//!
//! # Usage
//!
//! ```rust
//! use pillar_core::daycounts::{DayCount, DayCountConvention};
//! use pillar_core::types::Date;
//!
//! let dc = DayCountConvention::Act360;
//! let start = Date::from_ymd(2026, 1, 15).unwrap();
//! let end = Date::from_ymd(2026, 7, 15).unwrap();
//!
//! let tau = dc.year_fraction_f64(start, end);
//! assert!(tau > 0.49 && tau < 0.51);
//! ```

mod act360;
mod act365;
mod actact;
mod thirty360;

pub use act360::Act360;
pub use act365::Act365Fixed;
pub use actact::ActActIsda;
pub use thirty360::Thirty360E;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Date;

/// Trait for day count conventions.
///
/// Year fractions are computed in `Decimal` so conventions with exact
/// rational bases (30E/360 and friends) stay exact; callers that feed the
/// numeric engine use [`DayCountConvention::year_fraction_f64`].
pub trait DayCount: Send + Sync {
    /// Returns the conventional name (e.g. "ACT/360").
    fn name(&self) -> &'static str;

    /// Calculates the year fraction between two dates.
    ///
    /// Can be negative if `end < start`.
    fn year_fraction(&self, start: Date, end: Date) -> Decimal;

    /// Calculates the day count between two dates according to the
    /// convention (actual days for ACT conventions, adjusted days for
    /// 30/360 conventions).
    fn day_count(&self, start: Date, end: Date) -> i64;
}

/// Enumeration of the supported day count conventions.
///
/// This is the form carried in curve definitions and instrument legs;
/// [`DayCountConvention::to_day_count`] produces the implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayCountConvention {
    /// Actual/360 - money market instruments, EUR/USD floating legs
    Act360,
    /// Actual/365 Fixed - GBP markets, curve time axes
    Act365Fixed,
    /// Actual/Actual ISDA - year-based calculation for swaps
    ActActIsda,
    /// 30E/360 (Eurobond Basis) - EUR fixed legs
    Thirty360E,
}

impl DayCountConvention {
    /// Creates a boxed day count implementation.
    #[must_use]
    pub fn to_day_count(&self) -> Box<dyn DayCount> {
        match self {
            DayCountConvention::Act360 => Box::new(Act360),
            DayCountConvention::Act365Fixed => Box::new(Act365Fixed),
            DayCountConvention::ActActIsda => Box::new(ActActIsda),
            DayCountConvention::Thirty360E => Box::new(Thirty360E),
        }
    }

    /// Returns the conventional name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            DayCountConvention::Act360 => "ACT/360",
            DayCountConvention::Act365Fixed => "ACT/365F",
            DayCountConvention::ActActIsda => "ACT/ACT ISDA",
            DayCountConvention::Thirty360E => "30E/360",
        }
    }

    /// Year fraction as `f64`, the form the numeric engine consumes.
    #[must_use]
    pub fn year_fraction_f64(&self, start: Date, end: Date) -> f64 {
        self.to_day_count()
            .year_fraction(start, end)
            .to_f64()
            .unwrap_or(0.0)
    }
}

impl fmt::Display for DayCountConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
