//! Rate indices for the multi-curve framework.

use pillar_core::{Currency, Tenor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A floating rate index, the key of a forward curve.
///
/// The engine distinguishes only two families: term (Ibor-style) indices
/// fixing in advance for a tenor, and overnight indices compounded in
/// arrears. Everything convention-specific (fixing lags, calendars) is
/// resolved upstream before instruments reach the calibrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateIndex {
    /// A term rate index such as EURIBOR-3M.
    Ibor {
        /// Currency of the index.
        currency: Currency,
        /// Tenor of the underlying deposit.
        tenor: Tenor,
    },
    /// An overnight index such as ESTR or SOFR.
    Overnight {
        /// Currency of the index.
        currency: Currency,
    },
}

impl RateIndex {
    /// EUR EURIBOR 3M.
    #[must_use]
    pub fn euribor_3m() -> Self {
        RateIndex::Ibor {
            currency: Currency::EUR,
            tenor: Tenor::Months(3),
        }
    }

    /// EUR EURIBOR 6M.
    #[must_use]
    pub fn euribor_6m() -> Self {
        RateIndex::Ibor {
            currency: Currency::EUR,
            tenor: Tenor::Months(6),
        }
    }

    /// EUR overnight (ESTR).
    #[must_use]
    pub fn eur_overnight() -> Self {
        RateIndex::Overnight {
            currency: Currency::EUR,
        }
    }

    /// USD overnight (SOFR).
    #[must_use]
    pub fn usd_overnight() -> Self {
        RateIndex::Overnight {
            currency: Currency::USD,
        }
    }

    /// GBP overnight (SONIA).
    #[must_use]
    pub fn gbp_overnight() -> Self {
        RateIndex::Overnight {
            currency: Currency::GBP,
        }
    }

    /// Returns the index currency.
    #[must_use]
    pub fn currency(&self) -> Currency {
        match self {
            RateIndex::Ibor { currency, .. } | RateIndex::Overnight { currency } => *currency,
        }
    }

    /// Returns the term tenor for Ibor-style indices.
    #[must_use]
    pub fn tenor(&self) -> Option<Tenor> {
        match self {
            RateIndex::Ibor { tenor, .. } => Some(*tenor),
            RateIndex::Overnight { .. } => None,
        }
    }
}

impl fmt::Display for RateIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateIndex::Ibor { currency, tenor } => write!(f, "{currency}-IBOR-{tenor}"),
            RateIndex::Overnight { currency } => write!(f, "{currency}-ON"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(RateIndex::euribor_3m().to_string(), "EUR-IBOR-3M");
        assert_eq!(RateIndex::usd_overnight().to_string(), "USD-ON");
    }

    #[test]
    fn test_accessors() {
        assert_eq!(RateIndex::euribor_6m().currency(), Currency::EUR);
        assert_eq!(RateIndex::euribor_6m().tenor(), Some(Tenor::Months(6)));
        assert_eq!(RateIndex::gbp_overnight().tenor(), None);
    }
}
