//! SABR parameters and the Hagan implied volatility approximation.
//!
//! SABR models the forward as a CEV process with stochastic volatility:
//!
//! ```text
//! dF = sigma * F^beta * dW1
//! dsigma = nu * sigma * dW2
//! dW1 . dW2 = rho dt
//! ```
//!
//! The Hagan et al. (2002) formula gives a closed-form approximation of the
//! Black lognormal implied volatility as a function of strike.

use serde::{Deserialize, Serialize};

use crate::error::{VolError, VolResult};

/// Threshold below which z/x(z) switches to its Taylor expansion.
const SMALL_Z: f64 = 1e-6;

/// The SABR parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SabrParams {
    /// ATM volatility scale, > 0.
    pub alpha: f64,
    /// CEV exponent, in [0, 1]; held fixed during calibration.
    pub beta: f64,
    /// Spot-vol correlation, in (-1, 1).
    pub rho: f64,
    /// Volatility of volatility, >= 0.
    pub nu: f64,
}

impl SabrParams {
    /// Creates a validated parameter set.
    ///
    /// # Errors
    ///
    /// Returns `VolError::InvalidParameter` for out-of-domain values.
    pub fn new(alpha: f64, beta: f64, rho: f64, nu: f64) -> VolResult<Self> {
        if !(alpha > 0.0) {
            return Err(VolError::invalid_parameter("alpha", alpha, "must be > 0"));
        }
        if !(0.0..=1.0).contains(&beta) {
            return Err(VolError::invalid_parameter("beta", beta, "must be in [0, 1]"));
        }
        if !(rho > -1.0 && rho < 1.0) {
            return Err(VolError::invalid_parameter("rho", rho, "must be in (-1, 1)"));
        }
        if !(nu >= 0.0) {
            return Err(VolError::invalid_parameter("nu", nu, "must be >= 0"));
        }
        Ok(Self {
            alpha,
            beta,
            rho,
            nu,
        })
    }

    /// Hagan (2002) lognormal implied volatility at a strike.
    ///
    /// Uses the general formula with a Taylor expansion of z/x(z) for small
    /// z, which covers both the ATM limit K -> F and the CEV limit nu -> 0.
    ///
    /// # Errors
    ///
    /// Returns `VolError::InvalidInput` for non-positive forward, strike,
    /// or expiry.
    pub fn implied_vol(&self, forward: f64, strike: f64, expiry: f64) -> VolResult<f64> {
        if forward <= 0.0 || strike <= 0.0 || expiry <= 0.0 {
            return Err(VolError::invalid_input(format!(
                "forward {forward}, strike {strike}, expiry {expiry} must all be positive"
            )));
        }

        let Self {
            alpha,
            beta,
            rho,
            nu,
        } = *self;
        let omb = 1.0 - beta;
        let log_fk = (forward / strike).ln();
        let fk_pow = (forward * strike).powf(omb / 2.0);

        // Denominator of the leading factor
        let denom = fk_pow
            * (1.0 + omb * omb / 24.0 * log_fk * log_fk
                + omb.powi(4) / 1920.0 * log_fk.powi(4));

        let z = nu / alpha * fk_pow * log_fk;
        let z_over_x = if z.abs() < SMALL_Z {
            1.0 - rho * z / 2.0 + (2.0 - 3.0 * rho * rho) / 12.0 * z * z
        } else {
            let x = (((1.0 - 2.0 * rho * z + z * z).sqrt() + z - rho) / (1.0 - rho)).ln();
            z / x
        };

        let correction = 1.0
            + (omb * omb / 24.0 * alpha * alpha / (fk_pow * fk_pow)
                + rho * beta * nu * alpha / (4.0 * fk_pow)
                + (2.0 - 3.0 * rho * rho) / 24.0 * nu * nu)
                * expiry;

        Ok(alpha / denom * z_over_x * correction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parameter_validation() {
        assert!(SabrParams::new(0.2, 0.5, -0.3, 0.4).is_ok());
        assert!(SabrParams::new(-0.1, 0.5, 0.0, 0.4).is_err());
        assert!(SabrParams::new(0.2, 1.5, 0.0, 0.4).is_err());
        assert!(SabrParams::new(0.2, 0.5, 1.0, 0.4).is_err());
        assert!(SabrParams::new(0.2, 0.5, 0.0, -0.1).is_err());
        assert!(SabrParams::new(f64::NAN, 0.5, 0.0, 0.4).is_err());
    }

    #[test]
    fn test_lognormal_flat_limit() {
        // beta = 1, nu = 0 is plain Black with vol = alpha
        let params = SabrParams::new(0.25, 1.0, 0.0, 0.0).unwrap();
        for strike in [0.5, 1.0, 2.0] {
            let vol = params.implied_vol(1.0, strike, 2.0).unwrap();
            assert_relative_eq!(vol, 0.25, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_atm_formula() {
        // At the money the formula reduces to the Hagan ATM expansion
        let params = SabrParams::new(0.05, 0.5, -0.25, 0.4).unwrap();
        let f: f64 = 0.03;
        let t = 5.0;

        let fk_pow = f.powf(0.5);
        let expected = params.alpha / fk_pow
            * (1.0
                + (0.25 / 24.0 * params.alpha * params.alpha / f.powf(1.0)
                    + params.rho * params.beta * params.nu * params.alpha / (4.0 * fk_pow)
                    + (2.0 - 3.0 * params.rho * params.rho) / 24.0 * params.nu * params.nu)
                    * t);

        let vol = params.implied_vol(f, f, t).unwrap();
        assert_relative_eq!(vol, expected, epsilon = 1e-10);
    }

    #[test]
    fn test_smile_shape() {
        // Negative rho tilts the smile: low strikes richer than high strikes
        let params = SabrParams::new(0.04, 0.5, -0.3, 0.5).unwrap();
        let f = 0.03;
        let t = 1.0;

        let low = params.implied_vol(f, 0.5 * f, t).unwrap();
        let atm = params.implied_vol(f, f, t).unwrap();
        let high = params.implied_vol(f, 1.5 * f, t).unwrap();

        assert!(low > atm, "low {low} vs atm {atm}");
        assert!(low > high, "low {low} vs high {high}");
    }

    #[test]
    fn test_continuity_at_atm() {
        // The small-z branch must join the general branch smoothly
        let params = SabrParams::new(0.04, 0.6, 0.2, 0.45).unwrap();
        let f = 0.03;
        let t = 2.0;

        let at = params.implied_vol(f, f, t).unwrap();
        let near = params.implied_vol(f, f * (1.0 + 1e-9), t).unwrap();
        assert_relative_eq!(at, near, epsilon = 1e-8);
    }

    #[test]
    fn test_invalid_inputs() {
        let params = SabrParams::new(0.2, 0.5, 0.0, 0.4).unwrap();
        assert!(params.implied_vol(-1.0, 1.0, 1.0).is_err());
        assert!(params.implied_vol(1.0, 0.0, 1.0).is_err());
        assert!(params.implied_vol(1.0, 1.0, -2.0).is_err());
    }
}
