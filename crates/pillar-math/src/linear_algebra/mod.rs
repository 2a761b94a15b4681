//! Linear algebra utilities.
//!
//! Provides the direct solvers the calibration engine needs: a tridiagonal
//! solve for spline construction, and an LU factorization with partial
//! pivoting that is retained after calibration so the same Jacobian can be
//! re-solved (directly and transposed) for market-quote sensitivities.

use crate::error::{MathError, MathResult};
use nalgebra::{DMatrix, DVector};

/// Pivot magnitude below which a matrix is treated as singular.
const SINGULARITY_TOLERANCE: f64 = 1e-13;

/// Solves a tridiagonal system of equations with the Thomas algorithm.
///
/// # Arguments
///
/// * `sub` - Lower diagonal (length n-1)
/// * `diag` - Main diagonal (length n)
/// * `sup` - Upper diagonal (length n-1)
/// * `rhs` - Right-hand side (length n)
///
/// # Errors
///
/// Returns `MathError::SingularMatrix` on a vanishing pivot and
/// `MathError::DimensionMismatch` on inconsistent lengths.
pub fn solve_tridiagonal(
    sub: &[f64],
    diag: &[f64],
    sup: &[f64],
    rhs: &[f64],
) -> MathResult<Vec<f64>> {
    let n = diag.len();
    if n == 0 {
        return Ok(vec![]);
    }
    if sub.len() != n - 1 || sup.len() != n - 1 || rhs.len() != n {
        return Err(MathError::dimension_mismatch(n, rhs.len()));
    }

    if diag[0].abs() < SINGULARITY_TOLERANCE {
        return Err(MathError::singular_matrix(0));
    }

    // Forward elimination
    let mut sup_prime = vec![0.0; n];
    let mut rhs_prime = vec![0.0; n];

    if n > 1 {
        sup_prime[0] = sup[0] / diag[0];
    }
    rhs_prime[0] = rhs[0] / diag[0];

    for i in 1..n {
        let denom = diag[i] - sub[i - 1] * sup_prime[i - 1];
        if denom.abs() < SINGULARITY_TOLERANCE {
            return Err(MathError::singular_matrix(i));
        }
        if i < n - 1 {
            sup_prime[i] = sup[i] / denom;
        }
        rhs_prime[i] = (rhs[i] - sub[i - 1] * rhs_prime[i - 1]) / denom;
    }

    // Back substitution
    let mut x = vec![0.0; n];
    x[n - 1] = rhs_prime[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = rhs_prime[i] - sup_prime[i] * x[i + 1];
    }

    Ok(x)
}

/// An LU factorization with partial pivoting, P·A = L·U.
///
/// The factors are stored combined (L strictly below the diagonal with an
/// implicit unit diagonal, U on and above it). The factorization is computed
/// once per calibration group and reused for every subsequent solve,
/// including the transposed solves that re-express node sensitivities in
/// market-quote space.
#[derive(Debug, Clone)]
pub struct LuDecomposition {
    /// Combined L/U factors.
    lu: DMatrix<f64>,
    /// Row permutation: row i of the factorization is row perm[i] of A.
    perm: Vec<usize>,
}

impl LuDecomposition {
    /// Factorizes a square matrix.
    ///
    /// # Errors
    ///
    /// Returns `MathError::SingularMatrix` if a pivot vanishes (duplicate
    /// nodes or degenerate instruments produce exactly this) and
    /// `MathError::DimensionMismatch` for non-square input.
    pub fn new(a: &DMatrix<f64>) -> MathResult<Self> {
        let n = a.nrows();
        if n != a.ncols() {
            return Err(MathError::dimension_mismatch(n, a.ncols()));
        }

        let mut lu = a.clone();
        let mut perm: Vec<usize> = (0..n).collect();

        for k in 0..n {
            // Partial pivoting: largest magnitude in column k at or below row k
            let mut pivot_row = k;
            for i in k + 1..n {
                if lu[(i, k)].abs() > lu[(pivot_row, k)].abs() {
                    pivot_row = i;
                }
            }
            if lu[(pivot_row, k)].abs() < SINGULARITY_TOLERANCE {
                return Err(MathError::singular_matrix(k));
            }
            if pivot_row != k {
                lu.swap_rows(k, pivot_row);
                perm.swap(k, pivot_row);
            }

            for i in k + 1..n {
                let factor = lu[(i, k)] / lu[(k, k)];
                lu[(i, k)] = factor;
                for j in k + 1..n {
                    let delta = factor * lu[(k, j)];
                    lu[(i, j)] -= delta;
                }
            }
        }

        Ok(Self { lu, perm })
    }

    /// Returns the dimension of the factorized matrix.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.lu.nrows()
    }

    /// Solves A·x = b.
    ///
    /// # Errors
    ///
    /// Returns `MathError::DimensionMismatch` if `b` has the wrong length.
    pub fn solve(&self, b: &DVector<f64>) -> MathResult<DVector<f64>> {
        let n = self.dim();
        if b.len() != n {
            return Err(MathError::dimension_mismatch(n, b.len()));
        }

        // Forward substitution L·y = P·b (unit diagonal)
        let mut y = DVector::zeros(n);
        for i in 0..n {
            let mut sum = b[self.perm[i]];
            for j in 0..i {
                sum -= self.lu[(i, j)] * y[j];
            }
            y[i] = sum;
        }

        // Back substitution U·x = y
        let mut x = DVector::zeros(n);
        for i in (0..n).rev() {
            let mut sum = y[i];
            for j in i + 1..n {
                sum -= self.lu[(i, j)] * x[j];
            }
            x[i] = sum / self.lu[(i, i)];
        }

        Ok(x)
    }

    /// Solves Aᵀ·x = b, reusing the factors of A.
    ///
    /// With P·A = L·U this is Uᵀ·z = b, Lᵀ·w = z, x = Pᵀ·w.
    ///
    /// # Errors
    ///
    /// Returns `MathError::DimensionMismatch` if `b` has the wrong length.
    pub fn solve_transposed(&self, b: &DVector<f64>) -> MathResult<DVector<f64>> {
        let n = self.dim();
        if b.len() != n {
            return Err(MathError::dimension_mismatch(n, b.len()));
        }

        // Forward substitution Uᵀ·z = b (Uᵀ is lower triangular)
        let mut z = DVector::zeros(n);
        for i in 0..n {
            let mut sum = b[i];
            for j in 0..i {
                sum -= self.lu[(j, i)] * z[j];
            }
            z[i] = sum / self.lu[(i, i)];
        }

        // Back substitution Lᵀ·w = z (Lᵀ is upper triangular, unit diagonal)
        let mut w = DVector::zeros(n);
        for i in (0..n).rev() {
            let mut sum = z[i];
            for j in i + 1..n {
                sum -= self.lu[(j, i)] * w[j];
            }
            w[i] = sum;
        }

        // Undo the row permutation
        let mut x = DVector::zeros(n);
        for i in 0..n {
            x[self.perm[i]] = w[i];
        }

        Ok(x)
    }
}

/// Solves a dense linear system A·x = b with a one-shot factorization.
///
/// # Errors
///
/// Propagates singularity and dimension errors from [`LuDecomposition`].
pub fn solve_linear_system(a: &DMatrix<f64>, b: &DVector<f64>) -> MathResult<DVector<f64>> {
    LuDecomposition::new(a)?.solve(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tridiagonal_simple() {
        let sub = vec![1.0, 1.0];
        let diag = vec![2.0, 2.0, 2.0];
        let sup = vec![1.0, 1.0];
        let rhs = vec![1.0, 2.0, 3.0];

        let x = solve_tridiagonal(&sub, &diag, &sup, &rhs).unwrap();

        assert_relative_eq!(diag[0] * x[0] + sup[0] * x[1], rhs[0], epsilon = 1e-12);
        assert_relative_eq!(
            sub[0] * x[0] + diag[1] * x[1] + sup[1] * x[2],
            rhs[1],
            epsilon = 1e-12
        );
        assert_relative_eq!(sub[1] * x[1] + diag[2] * x[2], rhs[2], epsilon = 1e-12);
    }

    #[test]
    fn test_tridiagonal_single_equation() {
        let x = solve_tridiagonal(&[], &[4.0], &[], &[8.0]).unwrap();
        assert_relative_eq!(x[0], 2.0);
    }

    #[test]
    fn test_lu_solve() {
        let a = DMatrix::from_row_slice(3, 3, &[2.0, 1.0, 1.0, 4.0, 3.0, 3.0, 8.0, 7.0, 9.0]);
        let b = DVector::from_vec(vec![4.0, 10.0, 24.0]);

        let lu = LuDecomposition::new(&a).unwrap();
        let x = lu.solve(&b).unwrap();

        let residual = &a * &x - &b;
        assert!(residual.amax() < 1e-12);
    }

    #[test]
    fn test_lu_solve_transposed() {
        let a = DMatrix::from_row_slice(3, 3, &[2.0, 1.0, 1.0, 4.0, 3.0, 3.0, 8.0, 7.0, 9.0]);
        let b = DVector::from_vec(vec![1.0, -2.0, 3.0]);

        let lu = LuDecomposition::new(&a).unwrap();
        let x = lu.solve_transposed(&b).unwrap();

        let residual = a.transpose() * &x - &b;
        assert!(residual.amax() < 1e-12);
    }

    #[test]
    fn test_lu_pivoting_required() {
        // Zero in the (0,0) position forces a row swap
        let a = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 0.0]);
        let b = DVector::from_vec(vec![3.0, 5.0]);

        let x = solve_linear_system(&a, &b).unwrap();
        assert_relative_eq!(x[0], 5.0);
        assert_relative_eq!(x[1], 3.0);
    }

    #[test]
    fn test_lu_singular() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        let result = LuDecomposition::new(&a);
        assert!(matches!(result, Err(MathError::SingularMatrix { .. })));
    }

    #[test]
    fn test_lu_rejects_non_square() {
        let a = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert!(LuDecomposition::new(&a).is_err());
    }
}
