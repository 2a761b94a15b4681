//! Log-linear interpolation.
//!
//! Interpolates the logarithm of values. Used for discount-factor curves:
//! interpolated values stay positive and forward rates are piecewise
//! constant between nodes.

use crate::error::{MathError, MathResult};
use crate::interpolation::{find_segment, validate_nodes, Interpolator};

/// Log-linear interpolation between data points.
///
/// The interpolation formula is `y(x) = exp(lerp(x, ln(y)))`.
///
/// # Example
///
/// ```rust
/// use pillar_math::interpolation::{Interpolator, LogLinearInterpolator};
///
/// let interp = LogLinearInterpolator::new(
///     vec![0.0, 1.0, 2.0],
///     vec![1.0, 0.97, 0.94],
/// ).unwrap();
/// assert!(interp.value(1.5) > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct LogLinearInterpolator {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Precomputed ln(y) values.
    log_ys: Vec<f64>,
}

impl LogLinearInterpolator {
    /// Creates a new log-linear interpolator.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than 2 points, lengths differ,
    /// x-values are not strictly increasing, or any y-value is non-positive.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        validate_nodes(&xs, &ys, 2)?;

        let mut log_ys = Vec::with_capacity(ys.len());
        for (i, &y) in ys.iter().enumerate() {
            if y <= 0.0 {
                return Err(MathError::invalid_input(format!(
                    "y[{i}] = {y} is not positive; log-linear requires positive values"
                )));
            }
            log_ys.push(y.ln());
        }

        Ok(Self { xs, ys, log_ys })
    }

    /// Linear interpolation in log space and the local weight t.
    fn log_value_at(&self, x: f64) -> (usize, f64, f64) {
        let i = find_segment(&self.xs, x);
        let t = (x - self.xs[i]) / (self.xs[i + 1] - self.xs[i]);
        let log_v = self.log_ys[i] + t * (self.log_ys[i + 1] - self.log_ys[i]);
        (i, t, log_v)
    }
}

impl Interpolator for LogLinearInterpolator {
    fn len(&self) -> usize {
        self.xs.len()
    }

    fn value(&self, x: f64) -> f64 {
        let (_, _, log_v) = self.log_value_at(x);
        log_v.exp()
    }

    fn first_derivative(&self, x: f64) -> f64 {
        let (i, _, log_v) = self.log_value_at(x);
        let slope = (self.log_ys[i + 1] - self.log_ys[i]) / (self.xs[i + 1] - self.xs[i]);
        log_v.exp() * slope
    }

    fn node_weights(&self, x: f64) -> Vec<f64> {
        // v = exp((1-t) ln y_i + t ln y_{i+1})
        // dv/dy_i = v (1-t) / y_i,  dv/dy_{i+1} = v t / y_{i+1}
        let (i, t, log_v) = self.log_value_at(x);
        let v = log_v.exp();

        let mut weights = vec![0.0; self.xs.len()];
        weights[i] = v * (1.0 - t) / self.ys[i];
        weights[i + 1] = v * t / self.ys[i + 1];
        weights
    }

    fn derivative_node_weights(&self, x: f64) -> Vec<f64> {
        // v' = v * s with s = (ln y_{i+1} - ln y_i)/h
        // dv'/dy_j = (dv/dy_j) s + v ds/dy_j
        let (i, t, log_v) = self.log_value_at(x);
        let v = log_v.exp();
        let h = self.xs[i + 1] - self.xs[i];
        let s = (self.log_ys[i + 1] - self.log_ys[i]) / h;

        let mut weights = vec![0.0; self.xs.len()];
        weights[i] = v * (1.0 - t) / self.ys[i] * s + v * (-1.0 / (h * self.ys[i]));
        weights[i + 1] = v * t / self.ys[i + 1] * s + v * (1.0 / (h * self.ys[i + 1]));
        weights
    }

    fn min_x(&self) -> f64 {
        self.xs[0]
    }

    fn max_x(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_geometric_midpoint() {
        let interp =
            LogLinearInterpolator::new(vec![0.0, 1.0], vec![1.0, 0.81]).unwrap();
        // Log-linear midpoint is the geometric mean
        assert_relative_eq!(interp.value(0.5), 0.9, epsilon = 1e-12);
    }

    #[test]
    fn test_positivity() {
        let interp = LogLinearInterpolator::new(
            vec![0.0, 1.0, 5.0, 30.0],
            vec![1.0, 0.97, 0.85, 0.40],
        )
        .unwrap();
        for i in 0..300 {
            let x = f64::from(i) * 0.1;
            assert!(interp.value(x) > 0.0);
        }
    }

    #[test]
    fn test_rejects_non_positive() {
        assert!(LogLinearInterpolator::new(vec![0.0, 1.0], vec![1.0, 0.0]).is_err());
        assert!(LogLinearInterpolator::new(vec![0.0, 1.0], vec![-1.0, 0.5]).is_err());
    }

    #[test]
    fn test_derivative_sign() {
        let interp = LogLinearInterpolator::new(
            vec![0.0, 1.0, 2.0],
            vec![1.0, 0.97, 0.94],
        )
        .unwrap();
        // Decreasing discount factors: derivative negative everywhere
        assert!(interp.first_derivative(0.5) < 0.0);
        assert!(interp.first_derivative(1.5) < 0.0);
    }
}
