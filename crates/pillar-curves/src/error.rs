//! Error types for curve operations.

use pillar_core::CurrencyPair;
use thiserror::Error;

/// A specialized Result type for curve operations.
pub type CurveResult<T> = Result<T, CurveError>;

/// Error types for curve construction and evaluation.
#[derive(Error, Debug, Clone)]
pub enum CurveError {
    /// Curve definition is structurally invalid (mismatched lengths,
    /// non-increasing x-values, bad node data).
    #[error("Invalid curve definition for '{curve}': {reason}")]
    InvalidDefinition {
        /// Name of the offending curve.
        curve: String,
        /// Description of the problem.
        reason: String,
    },

    /// Query point is outside the node range and the side's extrapolation
    /// policy forbids extrapolation.
    #[error("x = {x:.6} outside [{min:.6}, {max:.6}] on curve '{curve}' (extrapolation disabled)")]
    OutOfRange {
        /// The query point.
        x: f64,
        /// Minimum node x.
        min: f64,
        /// Maximum node x.
        max: f64,
        /// Name of the curve queried.
        curve: String,
    },

    /// A required curve is missing from the provider.
    #[error("Curve not found: {name}")]
    CurveNotFound {
        /// Identity of the missing curve.
        name: String,
    },

    /// A required FX rate is missing from the provider.
    #[error("Missing FX rate for {pair}")]
    MissingFxRate {
        /// The missing currency pair.
        pair: CurrencyPair,
    },

    /// Replacement node values have the wrong length.
    #[error("Size mismatch on curve '{curve}': expected {expected} values, got {got}")]
    SizeMismatch {
        /// Name of the curve.
        curve: String,
        /// Expected number of values.
        expected: usize,
        /// Provided number of values.
        got: usize,
    },

    /// An underlying mathematical operation failed.
    #[error(transparent)]
    Math(#[from] pillar_math::MathError),
}

impl CurveError {
    /// Creates an invalid definition error.
    #[must_use]
    pub fn invalid_definition(curve: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            curve: curve.into(),
            reason: reason.into(),
        }
    }

    /// Creates a curve not found error.
    #[must_use]
    pub fn curve_not_found(name: impl Into<String>) -> Self {
        Self::CurveNotFound { name: name.into() }
    }

    /// Creates a size mismatch error.
    #[must_use]
    pub fn size_mismatch(curve: impl Into<String>, expected: usize, got: usize) -> Self {
        Self::SizeMismatch {
            curve: curve.into(),
            expected,
            got,
        }
    }
}
