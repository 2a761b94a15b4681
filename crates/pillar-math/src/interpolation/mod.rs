//! Interpolation methods for curve construction.
//!
//! Every interpolator exposes, besides the interpolated value and its first
//! derivative in x, the *node weights*: the partial derivative of the
//! interpolated value with respect to each node's y-value, holding the other
//! nodes fixed. Those weights are the innermost factor of every curve
//! Jacobian the calibrator builds, so they are analytic, not bumped.
//!
//! # Available Methods
//!
//! - [`LinearInterpolator`]: piecewise linear on node values
//! - [`LogLinearInterpolator`]: linear on the logarithm of node values
//!   (discount-factor curves; guarantees positive values)
//! - [`CubicSplineInterpolator`]: natural cubic spline, C2 continuous
//!
//! # Choosing a method
//!
//! | Method | Smoothness | Typical use |
//! |--------|------------|-------------|
//! | Linear | C0 | zero-rate curves, robust calibration |
//! | Log-Linear | C0 (on log) | discount-factor curves |
//! | Cubic Spline | C2 | smooth zero-rate curves |

mod cubic_spline;
mod linear;
mod log_linear;

pub use cubic_spline::CubicSplineInterpolator;
pub use linear::LinearInterpolator;
pub use log_linear::LogLinearInterpolator;

use serde::{Deserialize, Serialize};

use crate::error::MathResult;

/// Trait for interpolation methods.
///
/// Implementations are constructed over a fixed set of strictly increasing
/// x-values; queries outside `[min_x, max_x]` extend the boundary segment
/// (callers layer an explicit extrapolation policy on top and normally do
/// not query outside the range directly).
pub trait Interpolator: Send + Sync {
    /// Returns the number of nodes.
    fn len(&self) -> usize;

    /// Returns true if there are no nodes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the interpolated value at x.
    fn value(&self, x: f64) -> f64;

    /// Returns the first derivative dv/dx at x.
    fn first_derivative(&self, x: f64) -> f64;

    /// Returns the sensitivity of `value(x)` to each node y-value.
    ///
    /// The returned vector has length [`Interpolator::len`]. For piecewise
    /// linear interpolation these are the barycentric weights of the two
    /// bracketing nodes and zero elsewhere.
    fn node_weights(&self, x: f64) -> Vec<f64>;

    /// Returns the sensitivity of `first_derivative(x)` to each node y-value.
    fn derivative_node_weights(&self, x: f64) -> Vec<f64>;

    /// Returns the minimum x value in the data.
    fn min_x(&self) -> f64;

    /// Returns the maximum x value in the data.
    fn max_x(&self) -> f64;
}

/// Enumeration of the supported interpolation methods.
///
/// This is the form carried in curve definitions; [`InterpolationMethod::build`]
/// produces the implementation for a concrete node set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InterpolationMethod {
    /// Piecewise linear interpolation.
    #[default]
    Linear,
    /// Linear interpolation of log values.
    LogLinear,
    /// Natural cubic spline interpolation.
    CubicSpline,
}

impl InterpolationMethod {
    /// Builds an interpolator over the given nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if there are too few points, the x-values are not
    /// strictly increasing, the lengths differ, or (log-linear only) a
    /// y-value is not positive.
    pub fn build(&self, xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Box<dyn Interpolator>> {
        match self {
            InterpolationMethod::Linear => {
                Ok(Box::new(LinearInterpolator::new(xs, ys)?))
            }
            InterpolationMethod::LogLinear => {
                Ok(Box::new(LogLinearInterpolator::new(xs, ys)?))
            }
            InterpolationMethod::CubicSpline => {
                Ok(Box::new(CubicSplineInterpolator::new(xs, ys)?))
            }
        }
    }

    /// Returns the method name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            InterpolationMethod::Linear => "Linear",
            InterpolationMethod::LogLinear => "LogLinear",
            InterpolationMethod::CubicSpline => "CubicSpline",
        }
    }
}

/// Validates interpolator construction inputs shared by all methods.
pub(crate) fn validate_nodes(xs: &[f64], ys: &[f64], min_points: usize) -> MathResult<()> {
    use crate::error::MathError;

    if xs.len() < min_points {
        return Err(MathError::insufficient_data(min_points, xs.len()));
    }
    if xs.len() != ys.len() {
        return Err(MathError::invalid_input(format!(
            "xs and ys must have same length: {} vs {}",
            xs.len(),
            ys.len()
        )));
    }
    for i in 1..xs.len() {
        if xs[i] <= xs[i - 1] {
            return Err(MathError::invalid_input(
                "x values must be strictly increasing",
            ));
        }
    }
    Ok(())
}

/// Finds the index i such that xs[i] <= x < xs[i+1], clamped to valid segments.
pub(crate) fn find_segment(xs: &[f64], x: f64) -> usize {
    match xs.binary_search_by(|probe| probe.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Equal)) {
        Ok(i) => i.min(xs.len() - 2),
        Err(i) => i.saturating_sub(1).min(xs.len() - 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_all_interpolators_reproduce_nodes() {
        let xs = vec![0.5, 1.0, 2.0, 3.0, 5.0];
        let ys = vec![0.02, 0.025, 0.03, 0.035, 0.04];

        for method in [
            InterpolationMethod::Linear,
            InterpolationMethod::LogLinear,
            InterpolationMethod::CubicSpline,
        ] {
            let interp = method.build(xs.clone(), ys.clone()).unwrap();
            for (x, y) in xs.iter().zip(ys.iter()) {
                assert_relative_eq!(interp.value(*x), *y, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_node_weights_match_bumped_values() {
        let xs = vec![0.5, 1.0, 2.0, 3.0, 5.0];
        let ys = vec![0.02, 0.025, 0.03, 0.035, 0.04];
        let h = 1e-7;

        for method in [
            InterpolationMethod::Linear,
            InterpolationMethod::LogLinear,
            InterpolationMethod::CubicSpline,
        ] {
            for x in [0.7, 1.5, 2.5, 4.2] {
                let interp = method.build(xs.clone(), ys.clone()).unwrap();
                let weights = interp.node_weights(x);
                assert_eq!(weights.len(), ys.len());

                for j in 0..ys.len() {
                    let mut up = ys.clone();
                    up[j] += h;
                    let mut down = ys.clone();
                    down[j] -= h;
                    let v_up = method.build(xs.clone(), up).unwrap().value(x);
                    let v_down = method.build(xs.clone(), down).unwrap().value(x);
                    let fd = (v_up - v_down) / (2.0 * h);
                    assert_relative_eq!(weights[j], fd, epsilon = 1e-5, max_relative = 1e-4);
                }
            }
        }
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let xs = vec![0.5, 1.0, 2.0, 3.0, 5.0];
        let ys = vec![0.02, 0.025, 0.03, 0.035, 0.04];
        let h = 1e-6;

        for method in [
            InterpolationMethod::Linear,
            InterpolationMethod::LogLinear,
            InterpolationMethod::CubicSpline,
        ] {
            let interp = method.build(xs.clone(), ys.clone()).unwrap();
            for x in [0.75, 1.5, 2.5, 4.0] {
                let fd = (interp.value(x + h) - interp.value(x - h)) / (2.0 * h);
                assert_relative_eq!(interp.first_derivative(x), fd, epsilon = 1e-5);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_linear_value_within_node_hull(
            y0 in 0.001f64..0.10,
            y1 in 0.001f64..0.10,
            t in 0.0f64..1.0,
        ) {
            let interp = LinearInterpolator::new(vec![1.0, 2.0], vec![y0, y1]).unwrap();
            let x = 1.0 + t;
            let v = interp.value(x);
            let lo = y0.min(y1) - 1e-12;
            let hi = y0.max(y1) + 1e-12;
            prop_assert!(v >= lo && v <= hi);
        }

        #[test]
        fn prop_node_weights_sum_to_one_for_linear(
            t in 0.0f64..1.0,
        ) {
            let interp =
                LinearInterpolator::new(vec![0.0, 1.0, 2.0], vec![0.01, 0.02, 0.015]).unwrap();
            let weights = interp.node_weights(t * 2.0);
            let sum: f64 = weights.iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-12);
        }
    }
}
