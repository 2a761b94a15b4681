//! Curve shifts for scenario analysis and finite-difference checks.

use crate::curve::Curve;
use crate::error::{CurveError, CurveResult};

/// Returns a curve with every node value shifted by `amount`.
///
/// # Errors
///
/// Propagates curve reconstruction errors.
pub fn parallel_shift(curve: &Curve, amount: f64) -> CurveResult<Curve> {
    let shifted: Vec<f64> = curve.y_values().iter().map(|y| y + amount).collect();
    curve.with_values(shifted)
}

/// Returns a curve with a single node value shifted by `amount`.
///
/// # Errors
///
/// Returns `CurveError::SizeMismatch` if `node` is out of bounds, and
/// propagates curve reconstruction errors.
pub fn key_rate_shift(curve: &Curve, node: usize, amount: f64) -> CurveResult<Curve> {
    if node >= curve.node_count() {
        return Err(CurveError::size_mismatch(
            curve.name().as_str(),
            curve.node_count(),
            node + 1,
        ));
    }
    let mut shifted = curve.y_values().to_vec();
    shifted[node] += amount;
    curve.with_values(shifted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{CurveMeta, CurveName};
    use approx::assert_relative_eq;

    fn sample_curve() -> Curve {
        Curve::new(
            CurveName::from("EUR-DSC"),
            vec![1.0, 2.0, 5.0],
            vec![0.01, 0.015, 0.02],
            CurveMeta::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_parallel_shift() {
        let curve = sample_curve();
        let shifted = parallel_shift(&curve, 0.0001).unwrap();

        for (x, y) in curve.x_values().iter().zip(curve.y_values().iter()) {
            assert_relative_eq!(shifted.value(*x).unwrap(), y + 0.0001, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_key_rate_shift_local() {
        let curve = sample_curve();
        let shifted = key_rate_shift(&curve, 1, 0.001).unwrap();

        assert_relative_eq!(shifted.value(2.0).unwrap(), 0.016, epsilon = 1e-14);
        // Other nodes untouched
        assert_relative_eq!(shifted.value(1.0).unwrap(), 0.01, epsilon = 1e-14);
        assert_relative_eq!(shifted.value(5.0).unwrap(), 0.02, epsilon = 1e-14);
    }

    #[test]
    fn test_key_rate_shift_out_of_bounds() {
        let curve = sample_curve();
        assert!(key_rate_shift(&curve, 3, 0.001).is_err());
    }
}
