//! Node-parameterized curves.

use std::fmt;
use std::sync::Arc;

use pillar_core::daycounts::DayCountConvention;
use pillar_math::interpolation::{InterpolationMethod, Interpolator};
use pillar_math::Extrapolation;
use serde::{Deserialize, Serialize};

use crate::error::{CurveError, CurveResult};

/// The identity of a curve within a provider or calibration group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CurveName(String);

impl CurveName {
    /// Creates a curve name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurveName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CurveName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// What the y-values of a curve represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ValueType {
    /// Continuously compounded zero rates; DF(t) = exp(-z(t) * t).
    #[default]
    ZeroRate,
    /// Discount factors held directly at the nodes.
    DiscountFactor,
}

impl ValueType {
    /// Returns the value type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::ZeroRate => "ZeroRate",
            ValueType::DiscountFactor => "DiscountFactor",
        }
    }
}

/// The static shape of a curve: everything except its node values.
///
/// Shared between curve definitions (pre-calibration) and calibrated curves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveMeta {
    /// Interpolation scheme between nodes.
    pub interpolation: InterpolationMethod,
    /// Extrapolation policy below the first node.
    pub extrapolation_left: Extrapolation,
    /// Extrapolation policy above the last node.
    pub extrapolation_right: Extrapolation,
    /// Meaning of the y-values.
    pub value_type: ValueType,
    /// Day count used to convert dates to the curve's time axis.
    pub day_count: DayCountConvention,
}

impl Default for CurveMeta {
    fn default() -> Self {
        Self {
            interpolation: InterpolationMethod::Linear,
            extrapolation_left: Extrapolation::Flat,
            extrapolation_right: Extrapolation::Flat,
            value_type: ValueType::ZeroRate,
            day_count: DayCountConvention::Act365Fixed,
        }
    }
}

/// A calibrated (or trial) curve: ordered nodes bound to concrete values.
///
/// Immutable; the calibrator produces updated curves through
/// [`Curve::with_values`], which rebinds the node values and rebuilds the
/// interpolator. Evaluation outside the node range follows the per-side
/// extrapolation policy and never silently clamps unless the policy is
/// `Flat`.
#[derive(Clone)]
pub struct Curve {
    name: CurveName,
    x_values: Vec<f64>,
    y_values: Vec<f64>,
    meta: CurveMeta,
    interpolator: Arc<dyn Interpolator>,
}

impl fmt::Debug for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Curve")
            .field("name", &self.name)
            .field("nodes", &self.x_values.len())
            .field("value_type", &self.meta.value_type)
            .field("interpolation", &self.meta.interpolation)
            .finish()
    }
}

impl Curve {
    /// Creates a curve from nodes and values.
    ///
    /// # Errors
    ///
    /// Returns `CurveError::InvalidDefinition` if the x-values are not
    /// strictly increasing, the lengths differ, or the interpolator rejects
    /// the data (e.g. non-positive values under log-linear).
    pub fn new(
        name: CurveName,
        x_values: Vec<f64>,
        y_values: Vec<f64>,
        meta: CurveMeta,
    ) -> CurveResult<Self> {
        let interpolator = meta
            .interpolation
            .build(x_values.clone(), y_values.clone())
            .map_err(|e| CurveError::invalid_definition(name.as_str(), e.to_string()))?;

        Ok(Self {
            name,
            x_values,
            y_values,
            meta,
            interpolator: Arc::from(interpolator),
        })
    }

    /// Returns the curve name.
    #[must_use]
    pub fn name(&self) -> &CurveName {
        &self.name
    }

    /// Returns the node x-values.
    #[must_use]
    pub fn x_values(&self) -> &[f64] {
        &self.x_values
    }

    /// Returns the node y-values.
    #[must_use]
    pub fn y_values(&self) -> &[f64] {
        &self.y_values
    }

    /// Returns the number of nodes (calibration parameters).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.x_values.len()
    }

    /// Returns the curve metadata.
    #[must_use]
    pub fn meta(&self) -> &CurveMeta {
        &self.meta
    }

    /// Returns the day count of the curve's time axis.
    #[must_use]
    pub fn day_count(&self) -> DayCountConvention {
        self.meta.day_count
    }

    /// Returns the value type of the curve.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.meta.value_type
    }

    /// Rebinds the curve to new node values.
    ///
    /// # Errors
    ///
    /// Returns `CurveError::SizeMismatch` if the length differs from the
    /// node count, or an invalid-definition error from the interpolator.
    pub fn with_values(&self, y_values: Vec<f64>) -> CurveResult<Self> {
        if y_values.len() != self.x_values.len() {
            return Err(CurveError::size_mismatch(
                self.name.as_str(),
                self.x_values.len(),
                y_values.len(),
            ));
        }
        Self::new(self.name.clone(), self.x_values.clone(), y_values, self.meta)
    }

    /// Side of the node range that x falls on, if outside.
    fn out_of_range_side(&self, x: f64) -> Option<(f64, Extrapolation)> {
        let min = self.interpolator.min_x();
        let max = self.interpolator.max_x();
        if x < min {
            Some((min, self.meta.extrapolation_left))
        } else if x > max {
            Some((max, self.meta.extrapolation_right))
        } else {
            None
        }
    }

    fn out_of_range_error(&self, x: f64) -> CurveError {
        CurveError::OutOfRange {
            x,
            min: self.interpolator.min_x(),
            max: self.interpolator.max_x(),
            curve: self.name.to_string(),
        }
    }

    /// Interpolates/extrapolates the curve value at x.
    ///
    /// # Errors
    ///
    /// Returns `CurveError::OutOfRange` when x is outside the node range and
    /// that side's policy is [`Extrapolation::None`].
    pub fn value(&self, x: f64) -> CurveResult<f64> {
        match self.out_of_range_side(x) {
            None => Ok(self.interpolator.value(x)),
            Some((boundary, policy)) => match policy {
                Extrapolation::None => Err(self.out_of_range_error(x)),
                Extrapolation::Flat => Ok(self.interpolator.value(boundary)),
                Extrapolation::Linear => {
                    let v = self.interpolator.value(boundary);
                    let slope = self.interpolator.first_derivative(boundary);
                    Ok(v + (x - boundary) * slope)
                }
            },
        }
    }

    /// First derivative of the curve value with respect to x.
    ///
    /// # Errors
    ///
    /// Same out-of-range behavior as [`Curve::value`].
    pub fn first_derivative(&self, x: f64) -> CurveResult<f64> {
        match self.out_of_range_side(x) {
            None => Ok(self.interpolator.first_derivative(x)),
            Some((boundary, policy)) => match policy {
                Extrapolation::None => Err(self.out_of_range_error(x)),
                Extrapolation::Flat => Ok(0.0),
                Extrapolation::Linear => Ok(self.interpolator.first_derivative(boundary)),
            },
        }
    }

    /// Sensitivity of `value(x)` to each node y-value.
    ///
    /// # Errors
    ///
    /// Same out-of-range behavior as [`Curve::value`].
    pub fn parameter_sensitivity(&self, x: f64) -> CurveResult<Vec<f64>> {
        match self.out_of_range_side(x) {
            None => Ok(self.interpolator.node_weights(x)),
            Some((boundary, policy)) => match policy {
                Extrapolation::None => Err(self.out_of_range_error(x)),
                Extrapolation::Flat => Ok(self.interpolator.node_weights(boundary)),
                Extrapolation::Linear => {
                    let mut weights = self.interpolator.node_weights(boundary);
                    let slope_weights = self.interpolator.derivative_node_weights(boundary);
                    for (w, sw) in weights.iter_mut().zip(slope_weights.iter()) {
                        *w += (x - boundary) * sw;
                    }
                    Ok(weights)
                }
            },
        }
    }

    /// Discount factor at time t, honoring the curve's value type.
    ///
    /// t = 0 is the valuation point and returns exactly 1 by convention.
    ///
    /// # Errors
    ///
    /// Propagates out-of-range errors from [`Curve::value`].
    pub fn discount_factor(&self, t: f64) -> CurveResult<f64> {
        if t == 0.0 {
            return Ok(1.0);
        }
        match self.meta.value_type {
            ValueType::ZeroRate => Ok((-self.value(t)? * t).exp()),
            ValueType::DiscountFactor => self.value(t),
        }
    }

    /// Sensitivity of `discount_factor(t)` to each node y-value.
    ///
    /// # Errors
    ///
    /// Propagates out-of-range errors from [`Curve::parameter_sensitivity`].
    pub fn discount_factor_sensitivity(&self, t: f64) -> CurveResult<Vec<f64>> {
        if t == 0.0 {
            return Ok(vec![0.0; self.node_count()]);
        }
        match self.meta.value_type {
            ValueType::ZeroRate => {
                let df = self.discount_factor(t)?;
                let mut weights = self.parameter_sensitivity(t)?;
                for w in &mut weights {
                    *w *= -t * df;
                }
                Ok(weights)
            }
            ValueType::DiscountFactor => self.parameter_sensitivity(t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pillar_math::InterpolationMethod;

    fn zero_curve() -> Curve {
        Curve::new(
            CurveName::from("EUR-DSC"),
            vec![0.25, 1.0, 2.0, 5.0, 10.0],
            vec![0.010, 0.012, 0.015, 0.018, 0.020],
            CurveMeta::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_node_reproduction() {
        let curve = zero_curve();
        for (x, y) in curve.x_values().iter().zip(curve.y_values().iter()) {
            assert_relative_eq!(curve.value(*x).unwrap(), *y, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_invalid_definition_rejected() {
        // Non-increasing x
        assert!(Curve::new(
            CurveName::from("bad"),
            vec![1.0, 1.0, 2.0],
            vec![0.01, 0.02, 0.03],
            CurveMeta::default(),
        )
        .is_err());

        // Mismatched lengths
        assert!(Curve::new(
            CurveName::from("bad"),
            vec![1.0, 2.0],
            vec![0.01],
            CurveMeta::default(),
        )
        .is_err());
    }

    #[test]
    fn test_flat_extrapolation() {
        let curve = zero_curve();
        assert_relative_eq!(curve.value(30.0).unwrap(), 0.020);
        assert_relative_eq!(curve.value(0.01).unwrap(), 0.010);
        assert_relative_eq!(curve.first_derivative(30.0).unwrap(), 0.0);
    }

    #[test]
    fn test_linear_extrapolation() {
        let meta = CurveMeta {
            extrapolation_right: pillar_math::Extrapolation::Linear,
            ..CurveMeta::default()
        };
        let curve = Curve::new(
            CurveName::from("lin"),
            vec![1.0, 2.0],
            vec![0.01, 0.02],
            meta,
        )
        .unwrap();

        assert_relative_eq!(curve.value(3.0).unwrap(), 0.03, epsilon = 1e-14);
    }

    #[test]
    fn test_no_extrapolation_errors() {
        let meta = CurveMeta {
            extrapolation_left: pillar_math::Extrapolation::None,
            extrapolation_right: pillar_math::Extrapolation::None,
            ..CurveMeta::default()
        };
        let curve = Curve::new(
            CurveName::from("strict"),
            vec![1.0, 2.0, 5.0],
            vec![0.01, 0.02, 0.03],
            meta,
        )
        .unwrap();

        assert!(matches!(
            curve.value(0.5),
            Err(CurveError::OutOfRange { .. })
        ));
        assert!(matches!(
            curve.value(6.0),
            Err(CurveError::OutOfRange { .. })
        ));
        assert!(curve.value(3.0).is_ok());
    }

    #[test]
    fn test_discount_factor_zero_rate() {
        let curve = zero_curve();
        let t = 2.0;
        let z = curve.value(t).unwrap();
        assert_relative_eq!(curve.discount_factor(t).unwrap(), (-z * t).exp());
        assert_relative_eq!(curve.discount_factor(0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_discount_factor_df_curve() {
        let meta = CurveMeta {
            interpolation: InterpolationMethod::LogLinear,
            value_type: ValueType::DiscountFactor,
            ..CurveMeta::default()
        };
        let curve = Curve::new(
            CurveName::from("df"),
            vec![0.5, 1.0, 2.0],
            vec![0.995, 0.99, 0.97],
            meta,
        )
        .unwrap();

        assert_relative_eq!(curve.discount_factor(1.0).unwrap(), 0.99);
    }

    #[test]
    fn test_discount_factor_sensitivity_vs_bump() {
        let curve = zero_curve();
        let t = 3.0;
        let h = 1e-7;

        let sens = curve.discount_factor_sensitivity(t).unwrap();
        for j in 0..curve.node_count() {
            let mut up = curve.y_values().to_vec();
            up[j] += h;
            let mut down = curve.y_values().to_vec();
            down[j] -= h;
            let df_up = curve.with_values(up).unwrap().discount_factor(t).unwrap();
            let df_down = curve.with_values(down).unwrap().discount_factor(t).unwrap();
            let fd = (df_up - df_down) / (2.0 * h);
            assert_relative_eq!(sens[j], fd, epsilon = 1e-7, max_relative = 1e-5);
        }
    }

    #[test]
    fn test_with_values_size_check() {
        let curve = zero_curve();
        assert!(curve.with_values(vec![0.01; 4]).is_err());
        let rebound = curve.with_values(vec![0.02; 5]).unwrap();
        assert_relative_eq!(rebound.value(1.0).unwrap(), 0.02);
    }
}
