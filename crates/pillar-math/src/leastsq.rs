//! Damped Gauss-Newton (Levenberg-Marquardt) least squares.
//!
//! Minimizes `Σ rᵢ(p)²` over parameters `p`, with optional box bounds.
//! Used by the smile calibrator, where the residuals are model-minus-market
//! volatilities at each quoted strike.

use nalgebra::{DMatrix, DVector};

use crate::error::{MathError, MathResult};
use crate::linear_algebra::LuDecomposition;

/// Configuration for the Levenberg-Marquardt solver.
#[derive(Debug, Clone, Copy)]
pub struct LeastSquaresConfig {
    /// Maximum number of iterations.
    pub max_iterations: usize,
    /// Convergence threshold on the root-mean-square residual.
    pub tolerance: f64,
    /// Initial damping parameter.
    pub initial_lambda: f64,
    /// Multiplicative damping adjustment factor.
    pub lambda_factor: f64,
    /// Minimum damping value.
    pub min_lambda: f64,
    /// Maximum damping value.
    pub max_lambda: f64,
}

impl Default for LeastSquaresConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-10,
            initial_lambda: 1e-3,
            lambda_factor: 10.0,
            min_lambda: 1e-12,
            max_lambda: 1e10,
        }
    }
}

/// Result of a least-squares fit.
#[derive(Debug, Clone)]
pub struct LeastSquaresResult {
    /// Fitted parameters.
    pub parameters: Vec<f64>,
    /// Final residual vector.
    pub residuals: Vec<f64>,
    /// Final root-mean-square residual.
    pub rms: f64,
    /// Number of iterations used.
    pub iterations: usize,
    /// Whether the fit converged within tolerance.
    pub converged: bool,
}

/// Fits parameters by Levenberg-Marquardt.
///
/// # Arguments
///
/// * `residual_fn` - Residual vector at a parameter point
/// * `jacobian_fn` - Jacobian (rows = residuals, columns = parameters)
/// * `initial` - Starting parameter values
/// * `lower`, `upper` - Box bounds, applied after every step
/// * `config` - Solver configuration
///
/// # Errors
///
/// Returns an error if the problem is under-determined (fewer residuals
/// than parameters), a residual/Jacobian evaluation fails, or the damped
/// normal equations are singular at every damping level.
pub fn levenberg_marquardt<R, J>(
    residual_fn: R,
    jacobian_fn: J,
    initial: &[f64],
    lower: &[f64],
    upper: &[f64],
    config: &LeastSquaresConfig,
) -> MathResult<LeastSquaresResult>
where
    R: Fn(&[f64]) -> MathResult<Vec<f64>>,
    J: Fn(&[f64]) -> MathResult<Vec<Vec<f64>>>,
{
    let n = initial.len();
    if lower.len() != n || upper.len() != n {
        return Err(MathError::dimension_mismatch(n, lower.len().min(upper.len())));
    }

    let mut params: Vec<f64> = initial
        .iter()
        .zip(lower.iter().zip(upper.iter()))
        .map(|(&p, (&lo, &hi))| p.clamp(lo, hi))
        .collect();

    let mut residuals = residual_fn(&params)?;
    let m = residuals.len();
    if m < n {
        return Err(MathError::insufficient_data(n, m));
    }

    let mut cost: f64 = residuals.iter().map(|r| r * r).sum();
    let mut lambda = config.initial_lambda;

    for iteration in 0..config.max_iterations {
        let rms = (cost / m as f64).sqrt();
        if rms < config.tolerance {
            return Ok(LeastSquaresResult {
                parameters: params,
                residuals,
                rms,
                iterations: iteration,
                converged: true,
            });
        }

        let jac = jacobian_fn(&params)?;
        if jac.len() != m {
            return Err(MathError::dimension_mismatch(m, jac.len()));
        }

        // Normal equations: (JᵀJ + λ diag(JᵀJ)) δ = -Jᵀ r
        let mut jtj: DMatrix<f64> = DMatrix::zeros(n, n);
        let mut jtr = DVector::zeros(n);
        for (row, &r) in jac.iter().zip(residuals.iter()) {
            if row.len() != n {
                return Err(MathError::dimension_mismatch(n, row.len()));
            }
            for i in 0..n {
                jtr[i] += row[i] * r;
                for k in 0..n {
                    jtj[(i, k)] += row[i] * row[k];
                }
            }
        }

        let mut stepped = false;
        while lambda <= config.max_lambda {
            let mut damped = jtj.clone();
            for i in 0..n {
                let d = jtj[(i, i)].max(1e-12);
                damped[(i, i)] += lambda * d;
            }

            let delta = match LuDecomposition::new(&damped).and_then(|lu| lu.solve(&jtr)) {
                Ok(d) => d,
                Err(_) => {
                    lambda *= config.lambda_factor;
                    continue;
                }
            };

            let trial: Vec<f64> = params
                .iter()
                .enumerate()
                .map(|(i, &p)| (p - delta[i]).clamp(lower[i], upper[i]))
                .collect();

            let trial_residuals = residual_fn(&trial)?;
            let trial_cost: f64 = trial_residuals.iter().map(|r| r * r).sum();

            if trial_cost < cost {
                params = trial;
                residuals = trial_residuals;
                cost = trial_cost;
                lambda = (lambda / config.lambda_factor).max(config.min_lambda);
                stepped = true;
                break;
            }
            lambda *= config.lambda_factor;
        }

        if !stepped {
            // Damping maxed out without improvement: local minimum
            let rms = (cost / m as f64).sqrt();
            return Ok(LeastSquaresResult {
                parameters: params,
                residuals,
                rms,
                iterations: iteration + 1,
                converged: rms < config.tolerance,
            });
        }
    }

    let rms = (cost / m as f64).sqrt();
    Ok(LeastSquaresResult {
        parameters: params,
        residuals,
        rms,
        iterations: config.max_iterations,
        converged: rms < config.tolerance,
    })
}

/// Central-difference Jacobian of a residual function.
///
/// # Errors
///
/// Propagates residual evaluation errors.
pub fn numerical_jacobian<R>(
    residual_fn: &R,
    params: &[f64],
    step: f64,
) -> MathResult<Vec<Vec<f64>>>
where
    R: Fn(&[f64]) -> MathResult<Vec<f64>>,
{
    let base = residual_fn(params)?;
    let m = base.len();
    let n = params.len();

    let mut jac = vec![vec![0.0; n]; m];
    for j in 0..n {
        let mut up = params.to_vec();
        up[j] += step;
        let mut down = params.to_vec();
        down[j] -= step;

        let r_up = residual_fn(&up)?;
        let r_down = residual_fn(&down)?;
        if r_up.len() != m || r_down.len() != m {
            return Err(MathError::dimension_mismatch(m, r_up.len()));
        }

        for i in 0..m {
            jac[i][j] = (r_up[i] - r_down[i]) / (2.0 * step);
        }
    }

    Ok(jac)
}
