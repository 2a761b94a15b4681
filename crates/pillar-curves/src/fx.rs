//! FX spot rates.

use std::collections::HashMap;

use pillar_core::{Currency, CurrencyPair};

use crate::error::{CurveError, CurveResult};

/// A matrix of FX spot rates as of the valuation date.
///
/// Rates are stored per quoted pair; the inverse pair is derived. A lookup
/// that neither direction can satisfy is an error, never defaulted.
#[derive(Debug, Clone, Default)]
pub struct FxMatrix {
    rates: HashMap<CurrencyPair, f64>,
}

impl FxMatrix {
    /// Creates an empty FX matrix (single-currency calibrations).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a spot rate for a pair: one unit of `base` costs `rate` units
    /// of `quote`.
    #[must_use]
    pub fn with_rate(mut self, pair: CurrencyPair, rate: f64) -> Self {
        self.rates.insert(pair, rate);
        self
    }

    /// Returns the spot rate converting one unit of `base` into `quote`.
    ///
    /// # Errors
    ///
    /// Returns `CurveError::MissingFxRate` if neither the pair nor its
    /// inverse is present.
    pub fn rate(&self, base: Currency, quote: Currency) -> CurveResult<f64> {
        if base == quote {
            return Ok(1.0);
        }
        let pair = CurrencyPair::new(base, quote);
        if let Some(&r) = self.rates.get(&pair) {
            return Ok(r);
        }
        if let Some(&r) = self.rates.get(&pair.inverse()) {
            return Ok(1.0 / r);
        }
        Err(CurveError::MissingFxRate { pair })
    }

    /// Converts an amount from one currency to another.
    ///
    /// # Errors
    ///
    /// Same as [`FxMatrix::rate`].
    pub fn convert(&self, amount: f64, from: Currency, to: Currency) -> CurveResult<f64> {
        Ok(amount * self.rate(from, to)?)
    }
}
