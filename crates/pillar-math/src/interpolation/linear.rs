//! Linear interpolation.

use crate::error::MathResult;
use crate::interpolation::{find_segment, validate_nodes, Interpolator};

/// Linear interpolation between data points.
///
/// The simplest interpolation, connecting consecutive nodes with straight
/// lines. Queries outside the node range extend the boundary segment.
///
/// # Example
///
/// ```rust
/// use pillar_math::interpolation::{Interpolator, LinearInterpolator};
///
/// let interp = LinearInterpolator::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 4.0]).unwrap();
/// assert_eq!(interp.value(1.5), 2.5);
/// ```
#[derive(Debug, Clone)]
pub struct LinearInterpolator {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl LinearInterpolator {
    /// Creates a new linear interpolator.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than 2 points, lengths differ,
    /// or x-values are not strictly increasing.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        validate_nodes(&xs, &ys, 2)?;
        Ok(Self { xs, ys })
    }
}

impl Interpolator for LinearInterpolator {
    fn len(&self) -> usize {
        self.xs.len()
    }

    fn value(&self, x: f64) -> f64 {
        let i = find_segment(&self.xs, x);
        let t = (x - self.xs[i]) / (self.xs[i + 1] - self.xs[i]);
        self.ys[i] + t * (self.ys[i + 1] - self.ys[i])
    }

    fn first_derivative(&self, x: f64) -> f64 {
        let i = find_segment(&self.xs, x);
        (self.ys[i + 1] - self.ys[i]) / (self.xs[i + 1] - self.xs[i])
    }

    fn node_weights(&self, x: f64) -> Vec<f64> {
        let i = find_segment(&self.xs, x);
        let t = (x - self.xs[i]) / (self.xs[i + 1] - self.xs[i]);

        let mut weights = vec![0.0; self.xs.len()];
        weights[i] = 1.0 - t;
        weights[i + 1] = t;
        weights
    }

    fn derivative_node_weights(&self, x: f64) -> Vec<f64> {
        let i = find_segment(&self.xs, x);
        let h = self.xs[i + 1] - self.xs[i];

        let mut weights = vec![0.0; self.xs.len()];
        weights[i] = -1.0 / h;
        weights[i + 1] = 1.0 / h;
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
    fn test_midpoints() {
        let interp =
            LinearInterpolator::new(vec![0.0, 1.0, 2.0], vec![0.0, 2.0, 4.0]).unwrap();
        assert_relative_eq!(interp.value(0.5), 1.0);
        assert_relative_eq!(interp.value(1.5), 3.0);
    }

    #[test]
    fn test_boundary_extension() {
        let interp =
            LinearInterpolator::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0]).unwrap();
        // Boundary segment extends with its own slope
        assert_relative_eq!(interp.value(3.0), 3.0);
        assert_relative_eq!(interp.value(-1.0), -1.0);
    }

    #[test]
    fn test_node_weights_interior() {
        let interp =
            LinearInterpolator::new(vec![0.0, 1.0, 2.0], vec![0.01, 0.02, 0.03]).unwrap();
        let w = interp.node_weights(0.25);
        assert_relative_eq!(w[0], 0.75);
        assert_relative_eq!(w[1], 0.25);
        assert_relative_eq!(w[2], 0.0);
    }

    #[test]
    fn test_node_weights_at_node() {
        let interp =
            LinearInterpolator::new(vec![0.0, 1.0, 2.0], vec![0.01, 0.02, 0.03]).unwrap();
        let w = interp.node_weights(1.0);
        // At a node the full weight sits on that node
        assert_relative_eq!(w[1], 1.0);
        assert_relative_eq!(w[0] + w[2], 0.0);
    }

    #[test]
    fn test_invalid_construction() {
        assert!(LinearInterpolator::new(vec![0.0], vec![1.0]).is_err());
        assert!(LinearInterpolator::new(vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(LinearInterpolator::new(vec![1.0, 0.0], vec![1.0, 2.0]).is_err());
        assert!(LinearInterpolator::new(vec![1.0, 1.0], vec![1.0, 2.0]).is_err());
    }
}
