//! Multi-curve rates provider.

use std::collections::HashMap;
use std::sync::Arc;

use pillar_core::{Currency, Date};

use crate::curve::Curve;
use crate::error::{CurveError, CurveResult};
use crate::fx::FxMatrix;
use crate::index::RateIndex;
use crate::sensitivity::{
    CurrencyParameterSensitivities, CurveKey, ParameterSensitivity, PointSensitivities,
};

/// An Ibor-style forward rate observation, fully dated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IborObservation {
    /// The index being observed.
    pub index: RateIndex,
    /// Start of the underlying accrual period.
    pub start: Date,
    /// End of the underlying accrual period.
    pub end: Date,
    /// Accrual factor of the period in the index convention.
    pub year_fraction: f64,
}

/// An overnight-compounded rate observation over a period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OvernightObservation {
    /// The index being observed.
    pub index: RateIndex,
    /// Start of the compounding period.
    pub start: Date,
    /// End of the compounding period.
    pub end: Date,
    /// Accrual factor of the period in the index convention.
    pub year_fraction: f64,
}

/// An immutable multi-curve market snapshot.
///
/// Maps each currency to its discount curve and each rate index to its
/// forward curve, plus FX spot rates, all as of one valuation date. Pricers
/// consume it read-only; the calibrator produces a fresh provider per
/// iteration by swapping `Arc`-shared curves.
#[derive(Debug, Clone)]
pub struct RatesProvider {
    valuation_date: Date,
    discount_curves: HashMap<Currency, Arc<Curve>>,
    forward_curves: HashMap<RateIndex, Arc<Curve>>,
    fx: FxMatrix,
}

impl RatesProvider {
    /// Creates a builder.
    #[must_use]
    pub fn builder(valuation_date: Date) -> RatesProviderBuilder {
        RatesProviderBuilder::new(valuation_date)
    }

    /// Returns the valuation date.
    #[must_use]
    pub fn valuation_date(&self) -> Date {
        self.valuation_date
    }

    /// Returns the curve bound to a key.
    ///
    /// # Errors
    ///
    /// Returns `CurveError::CurveNotFound` if no curve is bound.
    pub fn curve(&self, key: &CurveKey) -> CurveResult<&Arc<Curve>> {
        match key {
            CurveKey::Discount(ccy) => self
                .discount_curves
                .get(ccy)
                .ok_or_else(|| CurveError::curve_not_found(key.to_string())),
            CurveKey::Forward(index) => self
                .forward_curves
                .get(index)
                .ok_or_else(|| CurveError::curve_not_found(key.to_string())),
        }
    }

    /// Returns true if a curve is bound to the key.
    #[must_use]
    pub fn has_curve(&self, key: &CurveKey) -> bool {
        self.curve(key).is_ok()
    }

    /// Returns the FX spot rate converting one unit of `base` into `quote`.
    ///
    /// # Errors
    ///
    /// Returns `CurveError::MissingFxRate` if the rate is unavailable.
    pub fn fx_rate(&self, base: Currency, quote: Currency) -> CurveResult<f64> {
        self.fx.rate(base, quote)
    }

    /// Curve time (year fraction from valuation date) of a date, in the
    /// given curve's own day count.
    fn time_on(&self, curve: &Curve, date: Date) -> f64 {
        curve.day_count().year_fraction_f64(self.valuation_date, date)
    }

    /// Discount factor of a currency at a date.
    ///
    /// The valuation date itself discounts to exactly 1 by convention; any
    /// other missing data propagates as an error.
    ///
    /// # Errors
    ///
    /// Returns `CurveError::CurveNotFound` for an unknown currency and
    /// propagates out-of-range errors from the curve.
    pub fn discount_factor(&self, currency: Currency, date: Date) -> CurveResult<f64> {
        let curve = self.curve(&CurveKey::Discount(currency))?;
        let t = self.time_on(curve, date);
        curve.discount_factor(t)
    }

    /// Simple forward rate of an Ibor-style index over its accrual period.
    ///
    /// Computed from two discount-factor evaluations on the index forward
    /// curve: `(df(start) / df(end) - 1) / tau`.
    ///
    /// # Errors
    ///
    /// Returns `CurveError::CurveNotFound` for an unknown index and
    /// propagates curve evaluation errors.
    pub fn ibor_rate(&self, observation: &IborObservation) -> CurveResult<f64> {
        let curve = self.curve(&CurveKey::Forward(observation.index))?;
        let df_start = curve.discount_factor(self.time_on(curve, observation.start))?;
        let df_end = curve.discount_factor(self.time_on(curve, observation.end))?;
        Ok((df_start / df_end - 1.0) / observation.year_fraction)
    }

    /// Compounded-in-arrears overnight rate over a period.
    ///
    /// Daily compounding of the index collapses to the same two
    /// discount-factor evaluations on the index curve as a term rate.
    ///
    /// # Errors
    ///
    /// Same as [`RatesProvider::ibor_rate`].
    pub fn overnight_rate(&self, observation: &OvernightObservation) -> CurveResult<f64> {
        let curve = self.curve(&CurveKey::Forward(observation.index))?;
        let df_start = curve.discount_factor(self.time_on(curve, observation.start))?;
        let df_end = curve.discount_factor(self.time_on(curve, observation.end))?;
        Ok((df_start / df_end - 1.0) / observation.year_fraction)
    }

    /// Converts point sensitivities into curve-node parameter sensitivities.
    ///
    /// For every point, the scalar d(PV)/d(DF) is chained through the
    /// curve's d(DF)/d(node) vector and accumulated into that curve's block.
    ///
    /// # Errors
    ///
    /// A point referencing a curve absent from this provider is an error,
    /// as are curve evaluation failures.
    pub fn parameter_sensitivity(
        &self,
        points: &PointSensitivities,
    ) -> CurveResult<CurrencyParameterSensitivities> {
        let mut result = CurrencyParameterSensitivities::empty();

        for point in points.points() {
            let curve = self.curve(&point.key)?;
            let t = self.time_on(curve, point.date);
            let mut sensitivities = curve.discount_factor_sensitivity(t)?;
            for s in &mut sensitivities {
                *s *= point.value;
            }
            result.add(ParameterSensitivity::new(
                curve.name().clone(),
                point.currency,
                sensitivities,
            ))?;
        }

        Ok(result)
    }

    /// Returns a provider with one curve rebound.
    ///
    /// The same `Arc` can be bound under several keys (a curve that both
    /// discounts a currency and forwards its overnight index).
    #[must_use]
    pub fn with_curve(&self, key: CurveKey, curve: Arc<Curve>) -> Self {
        let mut next = self.clone();
        match key {
            CurveKey::Discount(ccy) => {
                next.discount_curves.insert(ccy, curve);
            }
            CurveKey::Forward(index) => {
                next.forward_curves.insert(index, curve);
            }
        }
        next
    }

    /// Returns the discount-curve currencies bound in this provider.
    pub fn discount_currencies(&self) -> impl Iterator<Item = &Currency> {
        self.discount_curves.keys()
    }

    /// Returns the forward-curve indices bound in this provider.
    pub fn forward_indices(&self) -> impl Iterator<Item = &RateIndex> {
        self.forward_curves.keys()
    }
}

/// Builder for [`RatesProvider`].
pub struct RatesProviderBuilder {
    valuation_date: Date,
    discount_curves: HashMap<Currency, Arc<Curve>>,
    forward_curves: HashMap<RateIndex, Arc<Curve>>,
    fx: FxMatrix,
}

impl RatesProviderBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(valuation_date: Date) -> Self {
        Self {
            valuation_date,
            discount_curves: HashMap::new(),
            forward_curves: HashMap::new(),
            fx: FxMatrix::new(),
        }
    }

    /// Binds the discount curve of a currency.
    #[must_use]
    pub fn discount(mut self, currency: Currency, curve: Curve) -> Self {
        self.discount_curves.insert(currency, Arc::new(curve));
        self
    }

    /// Binds the discount curve of a currency from an `Arc`.
    #[must_use]
    pub fn discount_arc(mut self, currency: Currency, curve: Arc<Curve>) -> Self {
        self.discount_curves.insert(currency, curve);
        self
    }

    /// Binds the forward curve of a rate index.
    #[must_use]
    pub fn forward(mut self, index: RateIndex, curve: Curve) -> Self {
        self.forward_curves.insert(index, Arc::new(curve));
        self
    }

    /// Binds the forward curve of a rate index from an `Arc`.
    #[must_use]
    pub fn forward_arc(mut self, index: RateIndex, curve: Arc<Curve>) -> Self {
        self.forward_curves.insert(index, curve);
        self
    }

    /// Sets the FX spot matrix.
    #[must_use]
    pub fn fx(mut self, fx: FxMatrix) -> Self {
        self.fx = fx;
        self
    }

    /// Builds the provider.
    #[must_use]
    pub fn build(self) -> RatesProvider {
        RatesProvider {
            valuation_date: self.valuation_date,
            discount_curves: self.discount_curves,
            forward_curves: self.forward_curves,
            fx: self.fx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{CurveMeta, CurveName};
    use crate::sensitivity::PointSensitivity;
    use approx::assert_relative_eq;

    fn valuation_date() -> Date {
        Date::from_ymd(2026, 1, 15).unwrap()
    }

    fn flat_zero_curve(name: &str, rate: f64) -> Curve {
        Curve::new(
            CurveName::from(name),
            vec![0.25, 1.0, 5.0, 30.0],
            vec![rate; 4],
            CurveMeta::default(),
        )
        .unwrap()
    }

    fn sample_provider() -> RatesProvider {
        RatesProvider::builder(valuation_date())
            .discount(Currency::EUR, flat_zero_curve("EUR-DSC", 0.02))
            .forward(RateIndex::euribor_3m(), flat_zero_curve("EUR-IBOR3M", 0.025))
            .build()
    }

    #[test]
    fn test_discount_factor_flat_curve() {
        let provider = sample_provider();
        let date = Date::from_ymd(2027, 1, 15).unwrap();

        let df = provider.discount_factor(Currency::EUR, date).unwrap();
        let t: f64 = 365.0 / 365.0;
        assert_relative_eq!(df, (-0.02 * t).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_discount_factor_at_valuation_date_is_one() {
        let provider = sample_provider();
        let df = provider
            .discount_factor(Currency::EUR, valuation_date())
            .unwrap();
        assert_relative_eq!(df, 1.0);
    }

    #[test]
    fn test_missing_curve_errors() {
        let provider = sample_provider();
        let date = Date::from_ymd(2027, 1, 15).unwrap();

        assert!(matches!(
            provider.discount_factor(Currency::USD, date),
            Err(CurveError::CurveNotFound { .. })
        ));
        assert!(matches!(
            provider.ibor_rate(&IborObservation {
                index: RateIndex::euribor_6m(),
                start: date,
                end: date.add_months(6).unwrap(),
                year_fraction: 0.5,
            }),
            Err(CurveError::CurveNotFound { .. })
        ));
    }

    #[test]
    fn test_ibor_rate_close_to_flat_zero() {
        let provider = sample_provider();
        let start = Date::from_ymd(2027, 1, 15).unwrap();
        let end = Date::from_ymd(2027, 4, 15).unwrap();

        let obs = IborObservation {
            index: RateIndex::euribor_3m(),
            start,
            end,
            year_fraction: 90.0 / 360.0,
        };

        // Simple forward off a flat 2.5% continuous curve sits near 2.5%
        let fwd = provider.ibor_rate(&obs).unwrap();
        assert!((fwd - 0.025).abs() < 0.001, "fwd = {fwd}");
    }

    #[test]
    fn test_overnight_rate_matches_term_rate_formula() {
        let provider = RatesProvider::builder(valuation_date())
            .forward(RateIndex::eur_overnight(), flat_zero_curve("EUR-ON", 0.02))
            .build();

        let start = Date::from_ymd(2026, 7, 15).unwrap();
        let end = Date::from_ymd(2027, 7, 15).unwrap();
        let obs = OvernightObservation {
            index: RateIndex::eur_overnight(),
            start,
            end,
            year_fraction: 1.0,
        };

        // Compounded overnight collapses to the same two-DF formula
        let rate = provider.overnight_rate(&obs).unwrap();
        assert!((rate - 0.02).abs() < 0.001, "rate = {rate}");
    }

    #[test]
    fn test_parameter_sensitivity_chain_rule() {
        let provider = sample_provider();
        let date = Date::from_ymd(2028, 1, 15).unwrap();

        let points = PointSensitivities::of(vec![PointSensitivity {
            key: CurveKey::Discount(Currency::EUR),
            date,
            currency: Currency::EUR,
            value: 2.0,
        }]);

        let param = provider.parameter_sensitivity(&points).unwrap();
        let block = param.find(&CurveName::from("EUR-DSC")).unwrap();
        assert_eq!(block.sensitivities.len(), 4);

        // Chain rule against a direct curve query
        let curve = provider.curve(&CurveKey::Discount(Currency::EUR)).unwrap();
        let t = curve
            .day_count()
            .year_fraction_f64(provider.valuation_date(), date);
        let direct = curve.discount_factor_sensitivity(t).unwrap();
        for (got, want) in block.sensitivities.iter().zip(direct.iter()) {
            assert_relative_eq!(*got, want * 2.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_parameter_sensitivity_unknown_curve_errors() {
        let provider = sample_provider();
        let points = PointSensitivities::of(vec![PointSensitivity {
            key: CurveKey::Discount(Currency::JPY),
            date: Date::from_ymd(2027, 1, 15).unwrap(),
            currency: Currency::JPY,
            value: 1.0,
        }]);

        assert!(provider.parameter_sensitivity(&points).is_err());
    }

    #[test]
    fn test_with_curve_rebinds() {
        let provider = sample_provider();
        let bumped = Arc::new(flat_zero_curve("EUR-DSC", 0.03));
        let next = provider.with_curve(CurveKey::Discount(Currency::EUR), bumped);

        let date = Date::from_ymd(2027, 1, 15).unwrap();
        let df_old = provider.discount_factor(Currency::EUR, date).unwrap();
        let df_new = next.discount_factor(Currency::EUR, date).unwrap();
        assert!(df_new < df_old);
    }
}
