//! Error types for calibration.

use thiserror::Error;

use crate::quotes::QuoteId;

/// A specialized Result type for calibration operations.
pub type CalibResult<T> = Result<T, CalibError>;

/// Error types for curve calibration.
///
/// Configuration errors (`CyclicDependency`, `GroupSizeMismatch`,
/// `MissingQuote`) are detected before any numeric iteration; numeric errors
/// (`SingularJacobian`, `DidNotConverge`) carry enough state to diagnose a
/// failed solve without re-running instrumented.
#[derive(Error, Debug, Clone)]
pub enum CalibError {
    /// The curve-group dependency graph has a cycle.
    #[error("Cyclic curve-group dependency involving '{group}'")]
    CyclicDependency {
        /// A group on the cycle.
        group: String,
    },

    /// A group's instrument count does not match its node count.
    #[error("Group '{group}' is not square: {instruments} instruments vs {parameters} curve parameters")]
    GroupSizeMismatch {
        /// The offending group.
        group: String,
        /// Number of calibration instruments.
        instruments: usize,
        /// Number of curve node parameters.
        parameters: usize,
    },

    /// A quote id could not be resolved against the market quotes.
    #[error("Missing market quote: {id}")]
    MissingQuote {
        /// The unresolved quote id.
        id: QuoteId,
    },

    /// The Jacobian of a group is singular.
    ///
    /// Duplicate nodes or degenerate instruments produce this; it is never
    /// regularized away, since that would yield an arbitrary curve.
    #[error("Singular Jacobian in group '{group}' at iteration {iteration}")]
    SingularJacobian {
        /// The offending group.
        group: String,
        /// Newton iteration at which the solve failed.
        iteration: usize,
    },

    /// Newton iteration exhausted `max_iterations` without converging.
    #[error(
        "Calibration of group '{group}' did not converge after {iterations} iterations \
         (max scaled residual: {max_residual:.3e})"
    )]
    DidNotConverge {
        /// The offending group.
        group: String,
        /// Iterations performed.
        iterations: usize,
        /// Largest scaled residual at the final iterate.
        max_residual: f64,
        /// The full residual vector at the final iterate.
        residuals: Vec<f64>,
    },

    /// Instrument resolution produced an invalid date or schedule.
    #[error("Invalid instrument '{context}': {reason}")]
    InvalidInstrument {
        /// Which node/instrument failed.
        context: String,
        /// Description of the problem.
        reason: String,
    },

    /// A curve-level error during evaluation or construction.
    #[error(transparent)]
    Curve(#[from] pillar_curves::CurveError),

    /// An underlying mathematical error.
    #[error(transparent)]
    Math(#[from] pillar_math::MathError),
}

impl CalibError {
    /// Creates a cyclic dependency error.
    #[must_use]
    pub fn cyclic_dependency(group: impl Into<String>) -> Self {
        Self::CyclicDependency {
            group: group.into(),
        }
    }

    /// Creates a group size mismatch error.
    #[must_use]
    pub fn group_size_mismatch(
        group: impl Into<String>,
        instruments: usize,
        parameters: usize,
    ) -> Self {
        Self::GroupSizeMismatch {
            group: group.into(),
            instruments,
            parameters,
        }
    }

    /// Creates an invalid instrument error.
    #[must_use]
    pub fn invalid_instrument(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInstrument {
            context: context.into(),
            reason: reason.into(),
        }
    }
}
