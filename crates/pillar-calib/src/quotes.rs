//! Market quote identifiers and lookup.

use std::collections::HashMap;
use std::fmt;

use pillar_core::Date;
use serde::{Deserialize, Serialize};

use crate::error::{CalibError, CalibResult};

/// Identifier of one market quote (e.g. "EUR-OIS-5Y").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuoteId(String);

impl QuoteId {
    /// Creates a quote id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for QuoteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A fully materialized snapshot of market quotes as of a valuation date.
///
/// The calibrator never touches I/O; quotes are loaded upstream and handed
/// in complete. A missing lookup is a configuration error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketQuotes {
    valuation_date: Date,
    values: HashMap<QuoteId, f64>,
}

impl MarketQuotes {
    /// Creates an empty quote set.
    #[must_use]
    pub fn new(valuation_date: Date) -> Self {
        Self {
            valuation_date,
            values: HashMap::new(),
        }
    }

    /// Adds a quote.
    #[must_use]
    pub fn with(mut self, id: impl Into<QuoteId>, value: f64) -> Self {
        self.values.insert(id.into(), value);
        self
    }

    /// Inserts a quote.
    pub fn insert(&mut self, id: QuoteId, value: f64) {
        self.values.insert(id, value);
    }

    /// Returns the valuation date of the snapshot.
    #[must_use]
    pub fn valuation_date(&self) -> Date {
        self.valuation_date
    }

    /// Looks up a quote value.
    ///
    /// # Errors
    ///
    /// Returns `CalibError::MissingQuote` if the id is not present.
    pub fn value(&self, id: &QuoteId) -> CalibResult<f64> {
        self.values
            .get(id)
            .copied()
            .ok_or_else(|| CalibError::MissingQuote { id: id.clone() })
    }

    /// Returns a copy with one quote shifted by `amount` (for
    /// bump-and-recalibrate checks and scenario definitions).
    ///
    /// # Errors
    ///
    /// Returns `CalibError::MissingQuote` if the id is not present.
    pub fn bumped(&self, id: &QuoteId, amount: f64) -> CalibResult<Self> {
        let base = self.value(id)?;
        let mut next = self.clone();
        next.values.insert(id.clone(), base + amount);
        Ok(next)
    }

    /// Number of quotes in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the snapshot holds no quotes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
