//! Point and parameter sensitivity representations.
//!
//! Pricers produce [`PointSensitivities`]: raw derivatives of a present
//! value with respect to individual discount-factor observations on named
//! curves. The [`RatesProvider`](crate::provider::RatesProvider) converts
//! those into [`CurrencyParameterSensitivities`]: derivatives with respect
//! to curve node values, the space the calibrator and risk reports work in.
//!
//! Forward-rate sensitivities are decomposed by the pricer into the two
//! discount-factor observations that define the forward, so a single point
//! representation covers both discounting and projection legs.

use pillar_core::{Currency, Date};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::curve::CurveName;
use crate::error::{CurveError, CurveResult};
use crate::index::RateIndex;

/// Identity of a curve inside a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurveKey {
    /// The discount curve of a currency.
    Discount(Currency),
    /// The forward curve of a rate index.
    Forward(RateIndex),
}

impl fmt::Display for CurveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveKey::Discount(ccy) => write!(f, "{ccy} discount"),
            CurveKey::Forward(index) => write!(f, "{index} forward"),
        }
    }
}

/// One raw sensitivity: d(PV)/d(discount factor at `date` on curve `key`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSensitivity {
    /// Curve the observation sits on.
    pub key: CurveKey,
    /// Date of the discount-factor observation.
    pub date: Date,
    /// Currency of the differentiated present value.
    pub currency: Currency,
    /// Sensitivity value.
    pub value: f64,
}

/// An accumulate-then-freeze collection of point sensitivities.
///
/// Pricers push into a mutable instance during a single accumulation pass
/// and hand the frozen result on; there is no builder hierarchy behind it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSensitivities {
    sensitivities: Vec<PointSensitivity>,
}

impl PointSensitivities {
    /// Creates an empty collection.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates a collection from raw points.
    #[must_use]
    pub fn of(sensitivities: Vec<PointSensitivity>) -> Self {
        Self { sensitivities }
    }

    /// Adds one point sensitivity.
    pub fn push(&mut self, sensitivity: PointSensitivity) {
        self.sensitivities.push(sensitivity);
    }

    /// Returns the points.
    #[must_use]
    pub fn points(&self) -> &[PointSensitivity] {
        &self.sensitivities
    }

    /// Returns true if there are no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sensitivities.is_empty()
    }

    /// Merges another collection into this one.
    #[must_use]
    pub fn combined_with(mut self, other: Self) -> Self {
        self.sensitivities.extend(other.sensitivities);
        self
    }

    /// Scales every point by a factor.
    #[must_use]
    pub fn multiplied_by(mut self, factor: f64) -> Self {
        for s in &mut self.sensitivities {
            s.value *= factor;
        }
        self
    }
}

/// Sensitivity of a value to every node of one curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSensitivity {
    /// The curve the sensitivities refer to.
    pub curve: CurveName,
    /// Currency of the differentiated value.
    pub currency: Currency,
    /// One entry per curve node, in node order.
    pub sensitivities: Vec<f64>,
}

impl ParameterSensitivity {
    /// Creates a parameter sensitivity block.
    #[must_use]
    pub fn new(curve: CurveName, currency: Currency, sensitivities: Vec<f64>) -> Self {
        Self {
            curve,
            currency,
            sensitivities,
        }
    }

    /// Sum of all node sensitivities (the parallel-shift equivalent).
    #[must_use]
    pub fn total(&self) -> f64 {
        self.sensitivities.iter().sum()
    }
}

/// Parameter sensitivities across several curves, ordered by curve name.
///
/// The ordered per-curve blocks are the exchange format between the
/// provider, the calibrator, and downstream risk; serializable as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrencyParameterSensitivities {
    sensitivities: Vec<ParameterSensitivity>,
}

impl CurrencyParameterSensitivities {
    /// Creates an empty collection.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a collection holding one block.
    #[must_use]
    pub fn of(sensitivity: ParameterSensitivity) -> Self {
        Self {
            sensitivities: vec![sensitivity],
        }
    }

    /// Returns the blocks in (curve, currency) order.
    #[must_use]
    pub fn blocks(&self) -> &[ParameterSensitivity] {
        &self.sensitivities
    }

    /// Finds the block for a curve, if present.
    #[must_use]
    pub fn find(&self, curve: &CurveName) -> Option<&ParameterSensitivity> {
        self.sensitivities.iter().find(|s| &s.curve == curve)
    }

    /// Merges a block into the collection, adding element-wise where a block
    /// for the same curve and currency already exists.
    ///
    /// # Errors
    ///
    /// Returns `CurveError::SizeMismatch` if an existing block for the same
    /// curve has a different node count.
    pub fn add(&mut self, block: ParameterSensitivity) -> CurveResult<()> {
        if let Some(existing) = self
            .sensitivities
            .iter_mut()
            .find(|s| s.curve == block.curve && s.currency == block.currency)
        {
            if existing.sensitivities.len() != block.sensitivities.len() {
                return Err(CurveError::size_mismatch(
                    block.curve.as_str(),
                    existing.sensitivities.len(),
                    block.sensitivities.len(),
                ));
            }
            for (a, b) in existing.sensitivities.iter_mut().zip(block.sensitivities) {
                *a += b;
            }
        } else {
            self.sensitivities.push(block);
            self.sensitivities
                .sort_by(|a, b| (&a.curve, a.currency).cmp(&(&b.curve, b.currency)));
        }
        Ok(())
    }

    /// Merges all blocks of another collection into this one.
    ///
    /// # Errors
    ///
    /// Same as [`CurrencyParameterSensitivities::add`].
    pub fn combined_with(mut self, other: Self) -> CurveResult<Self> {
        for block in other.sensitivities {
            self.add(block)?;
        }
        Ok(self)
    }

    /// Scales every block by a factor.
    #[must_use]
    pub fn multiplied_by(mut self, factor: f64) -> Self {
        for block in &mut self.sensitivities {
            for v in &mut block.sensitivities {
                *v *= factor;
            }
        }
        self
    }
}
