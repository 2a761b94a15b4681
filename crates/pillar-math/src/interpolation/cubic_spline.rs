//! Natural cubic spline interpolation.

use crate::error::MathResult;
use crate::interpolation::{find_segment, validate_nodes, Interpolator};
use crate::linear_algebra::solve_tridiagonal;

/// Natural cubic spline interpolation.
///
/// Piecewise cubic polynomials through the nodes with continuous first and
/// second derivatives; "natural" means the second derivative is zero at the
/// endpoints.
///
/// The spline's second derivatives solve a tridiagonal linear system in the
/// node y-values, so the sensitivity of the interpolated value to each node
/// is itself available analytically; the full d(second derivative)/d(node)
/// matrix is precomputed at construction by solving the same tridiagonal
/// system once per node.
#[derive(Debug, Clone)]
pub struct CubicSplineInterpolator {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at each node.
    m: Vec<f64>,
    /// dm[i][j] = d(m[i]) / d(ys[j]); rows 0 and n-1 are zero (natural).
    dm_dy: Vec<Vec<f64>>,
}

impl CubicSplineInterpolator {
    /// Creates a natural cubic spline interpolator.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than 3 points, lengths differ,
    /// or x-values are not strictly increasing.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        validate_nodes(&xs, &ys, 3)?;

        let n = xs.len();
        let h: Vec<f64> = (0..n - 1).map(|i| xs[i + 1] - xs[i]).collect();

        // Interior tridiagonal system for second derivatives:
        //   h[i-1] m[i-1] + 2(h[i-1]+h[i]) m[i] + h[i] m[i+1] = rhs[i]
        // with m[0] = m[n-1] = 0.
        let dim = n - 2;
        let sub: Vec<f64> = (1..dim).map(|k| h[k]).collect();
        let diag: Vec<f64> = (0..dim).map(|k| 2.0 * (h[k] + h[k + 1])).collect();
        let sup: Vec<f64> = (0..dim - 1).map(|k| h[k + 1]).collect();

        let rhs: Vec<f64> = (1..n - 1)
            .map(|i| 6.0 * ((ys[i + 1] - ys[i]) / h[i] - (ys[i] - ys[i - 1]) / h[i - 1]))
            .collect();

        let interior = solve_tridiagonal(&sub, &diag, &sup, &rhs)?;

        let mut m = vec![0.0; n];
        m[1..n - 1].copy_from_slice(&interior);

        // Sensitivity of the second derivatives to each node value: the rhs
        // is linear in y, so one tridiagonal solve per node column.
        let mut dm_dy = vec![vec![0.0; n]; n];
        for j in 0..n {
            let rhs_col: Vec<f64> = (1..n - 1)
                .map(|i| {
                    let mut d = 0.0;
                    if j == i + 1 {
                        d += 6.0 / h[i];
                    }
                    if j == i {
                        d -= 6.0 / h[i] + 6.0 / h[i - 1];
                    }
                    if j + 1 == i {
                        d += 6.0 / h[i - 1];
                    }
                    d
                })
                .collect();

            let col = solve_tridiagonal(&sub, &diag, &sup, &rhs_col)?;
            for (i, v) in col.iter().enumerate() {
                dm_dy[i + 1][j] = *v;
            }
        }

        Ok(Self { xs, ys, m, dm_dy })
    }

    /// Segment index and the local coefficients (h, a, b) at x.
    fn segment_at(&self, x: f64) -> (usize, f64, f64, f64) {
        let i = find_segment(&self.xs, x);
        let h = self.xs[i + 1] - self.xs[i];
        let a = (self.xs[i + 1] - x) / h;
        let b = (x - self.xs[i]) / h;
        (i, h, a, b)
    }
}

impl Interpolator for CubicSplineInterpolator {
    fn len(&self) -> usize {
        self.xs.len()
    }

    fn value(&self, x: f64) -> f64 {
        let (i, h, a, b) = self.segment_at(x);
        a * self.ys[i]
            + b * self.ys[i + 1]
            + ((a * a * a - a) * self.m[i] + (b * b * b - b) * self.m[i + 1]) * (h * h) / 6.0
    }

    fn first_derivative(&self, x: f64) -> f64 {
        let (i, h, a, b) = self.segment_at(x);
        (self.ys[i + 1] - self.ys[i]) / h
            + (-(3.0 * a * a - 1.0) * self.m[i] + (3.0 * b * b - 1.0) * self.m[i + 1]) * h / 6.0
    }

    fn node_weights(&self, x: f64) -> Vec<f64> {
        let (i, h, a, b) = self.segment_at(x);
        let ca = (a * a * a - a) * (h * h) / 6.0;
        let cb = (b * b * b - b) * (h * h) / 6.0;

        let mut weights = vec![0.0; self.xs.len()];
        for (j, w) in weights.iter_mut().enumerate() {
            *w = ca * self.dm_dy[i][j] + cb * self.dm_dy[i + 1][j];
        }
        weights[i] += a;
        weights[i + 1] += b;
        weights
    }

    fn derivative_node_weights(&self, x: f64) -> Vec<f64> {
        let (i, h, a, b) = self.segment_at(x);
        let ca = -(3.0 * a * a - 1.0) * h / 6.0;
        let cb = (3.0 * b * b - 1.0) * h / 6.0;

        let mut weights = vec![0.0; self.xs.len()];
        for (j, w) in weights.iter_mut().enumerate() {
            *w = ca * self.dm_dy[i][j] + cb * self.dm_dy[i + 1][j];
        }
        weights[i] -= 1.0 / h;
        weights[i + 1] += 1.0 / h;
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
    fn test_through_points() {
        let xs = vec![0.0, 1.0, 2.0, 3.0];
        let ys = vec![0.0, 1.0, 4.0, 9.0];

        let spline = CubicSplineInterpolator::new(xs.clone(), ys.clone()).unwrap();
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_relative_eq!(spline.value(*x), *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_natural_boundary() {
        let xs = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = vec![0.0, 1.0, 0.0, 1.0, 0.0];

        let spline = CubicSplineInterpolator::new(xs, ys).unwrap();
        // Natural boundary: zero second derivative at the ends
        assert_relative_eq!(spline.m[0], 0.0);
        assert_relative_eq!(spline.m[4], 0.0);
    }

    #[test]
    fn test_c1_continuity_at_nodes() {
        let xs = vec![0.0, 1.0, 2.0, 3.0, 5.0];
        let ys = vec![0.02, 0.025, 0.022, 0.03, 0.028];
        let spline = CubicSplineInterpolator::new(xs, ys).unwrap();

        let eps = 1e-9;
        for node in [1.0, 2.0, 3.0] {
            let left = spline.first_derivative(node - eps);
            let right = spline.first_derivative(node + eps);
            assert_relative_eq!(left, right, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_node_weight_consistency() {
        // Weights applied to node values must reconstruct the value exactly,
        // because the spline is linear in its node values.
        let xs = vec![0.5, 1.0, 2.0, 3.0, 5.0];
        let ys = vec![0.02, 0.025, 0.03, 0.035, 0.04];
        let spline = CubicSplineInterpolator::new(xs, ys.clone()).unwrap();

        for x in [0.7, 1.5, 2.5, 4.2] {
            let w = spline.node_weights(x);
            let reconstructed: f64 = w.iter().zip(ys.iter()).map(|(wi, yi)| wi * yi).sum();
            assert_relative_eq!(reconstructed, spline.value(x), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_insufficient_points() {
        assert!(CubicSplineInterpolator::new(vec![0.0, 1.0], vec![0.0, 1.0]).is_err());
    }
}
