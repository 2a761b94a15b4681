//! Error types for smile calibration.

use thiserror::Error;

/// A specialized Result type for smile calibration.
pub type VolResult<T> = Result<T, VolError>;

/// Errors that can occur during smile calibration.
#[derive(Error, Debug, Clone)]
pub enum VolError {
    /// A smile node has fewer usable volatility points than free parameters.
    #[error(
        "Insufficient smile data at expiry {expiry}, tenor {tenor}: \
         {points} usable points for {parameters} free parameters"
    )]
    InsufficientSmileData {
        /// Node expiry in years.
        expiry: f64,
        /// Node tenor in years.
        tenor: f64,
        /// Usable (non-NaN) volatility points.
        points: usize,
        /// Free parameters of the fit.
        parameters: usize,
    },

    /// A SABR parameter is outside its domain.
    #[error("Invalid SABR parameter {name} = {value}: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
        /// Domain description.
        reason: &'static str,
    },

    /// Invalid market input (non-positive forward, strike, or expiry).
    #[error("Invalid smile input: {reason}")]
    InvalidInput {
        /// Description of the invalid input.
        reason: String,
    },

    /// The least-squares fit failed to converge.
    #[error(
        "Smile fit at expiry {expiry}, tenor {tenor} did not converge \
         after {iterations} iterations (rms: {rms:.3e})"
    )]
    FitDidNotConverge {
        /// Node expiry in years.
        expiry: f64,
        /// Node tenor in years.
        tenor: f64,
        /// Iterations used.
        iterations: usize,
        /// Final root-mean-square residual.
        rms: f64,
    },

    /// An underlying mathematical error.
    #[error(transparent)]
    Math(#[from] pillar_math::MathError),
}

impl VolError {
    /// Creates an invalid parameter error.
    #[must_use]
    pub fn invalid_parameter(name: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value,
            reason,
        }
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}
