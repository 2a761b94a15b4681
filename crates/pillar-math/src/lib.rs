//! # Pillar Math
//!
//! Numerical utilities for the Pillar curve calibration engine:
//!
//! - **Interpolation**: linear, log-linear, and natural cubic spline
//!   interpolators that expose analytic sensitivities of the interpolated
//!   value to each node value (the building block of curve Jacobians)
//! - **Extrapolation**: explicit per-side policy (error, flat, linear)
//! - **Linear algebra**: tridiagonal solve, LU factorization with partial
//!   pivoting retained for repeated direct and transposed solves
//! - **Least squares**: damped Gauss-Newton (Levenberg-Marquardt) over
//!   residual closures

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]

pub mod error;
pub mod extrapolation;
pub mod interpolation;
pub mod leastsq;
pub mod linear_algebra;

pub use error::{MathError, MathResult};
pub use extrapolation::Extrapolation;
pub use interpolation::{InterpolationMethod, Interpolator};
