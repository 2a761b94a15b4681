//! Calibration measures.
//!
//! A measure turns an instrument into the scalar residual the calibrator
//! drives to zero, together with its analytic point sensitivity. The choice
//! of measure per instrument kind is a registry lookup, not a dispatch
//! hierarchy; [`Measures::standard`] holds the conventional assignment.
//!
//! Each measure owns its tolerance policy (one documented convention, not
//! call-site literals): rate-unit measures converge at an absolute scale of
//! 1 (so the default tolerance 1e-9 means a hundredth of a hundredth of a
//! basis point), present-value measures at a scale of the instrument
//! notional in thousands (so 1e-9 on the scaled residual is 1e-6 currency
//! units per unit notional).

use std::collections::HashMap;

use once_cell::sync::Lazy;
use pillar_curves::{PointSensitivities, RatesProvider};

use crate::error::CalibResult;
use crate::instruments::{InstrumentKind, ResolvedInstrument};

/// The scalar function used as calibration residual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// Residual = market-implied par rate minus the quoted rate, in rate
    /// units (1e-4 = 1bp). Also covers FX forward points.
    ParRate,
    /// Residual = the par spread implied by the curves minus the quoted
    /// spread, in rate units.
    ParSpread,
    /// Residual = present value in the instrument currency.
    PresentValue,
}

impl Measure {
    /// Computes the residual of an instrument against a provider.
    ///
    /// # Errors
    ///
    /// Propagates pricing errors.
    pub fn residual(
        &self,
        instrument: &ResolvedInstrument,
        provider: &RatesProvider,
    ) -> CalibResult<f64> {
        match self {
            Measure::ParRate | Measure::ParSpread => {
                Ok(instrument.par_measure(provider)? - instrument.quote())
            }
            Measure::PresentValue => instrument.present_value(provider),
        }
    }

    /// Computes the analytic point sensitivity of the residual.
    ///
    /// The quoted value is a constant, so the par-measure sensitivity is the
    /// residual sensitivity.
    ///
    /// # Errors
    ///
    /// Propagates pricing errors.
    pub fn residual_sensitivity(
        &self,
        instrument: &ResolvedInstrument,
        provider: &RatesProvider,
    ) -> CalibResult<PointSensitivities> {
        match self {
            Measure::ParRate | Measure::ParSpread => {
                instrument.par_measure_sensitivity(provider)
            }
            Measure::PresentValue => instrument.present_value_sensitivity(provider),
        }
    }

    /// The unit scale of this measure's residual for an instrument.
    ///
    /// The calibrator declares convergence when `|residual| / scale` drops
    /// below its absolute tolerance, so mixing rate-unit and currency-unit
    /// residuals in one group cannot produce false convergence.
    #[must_use]
    pub fn residual_scale(&self, instrument: &ResolvedInstrument) -> f64 {
        match self {
            Measure::ParRate | Measure::ParSpread => 1.0,
            Measure::PresentValue => instrument.notional().abs().max(1.0) * 1e3,
        }
    }
}

/// Registry mapping instrument kinds to their calibration measure.
#[derive(Debug, Clone)]
pub struct Measures {
    map: HashMap<InstrumentKind, Measure>,
}

static STANDARD: Lazy<Measures> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert(InstrumentKind::Deposit, Measure::ParRate);
    map.insert(InstrumentKind::IborFixingDeposit, Measure::ParRate);
    map.insert(InstrumentKind::Fra, Measure::ParRate);
    map.insert(InstrumentKind::Swap, Measure::ParRate);
    map.insert(InstrumentKind::Ois, Measure::ParRate);
    map.insert(InstrumentKind::FxSwap, Measure::ParRate);
    map.insert(InstrumentKind::XccyBasisSwap, Measure::ParSpread);
    Measures { map }
});

impl Measures {
    /// The conventional measure assignment: par rate everywhere except
    /// cross-currency basis swaps, which calibrate on par spread.
    #[must_use]
    pub fn standard() -> &'static Measures {
        &STANDARD
    }

    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Overrides (or sets) the measure of an instrument kind.
    #[must_use]
    pub fn with(mut self, kind: InstrumentKind, measure: Measure) -> Self {
        self.map.insert(kind, measure);
        self
    }

    /// Returns the measure for a kind, defaulting to present value for
    /// kinds with no registered entry.
    #[must_use]
    pub fn for_kind(&self, kind: InstrumentKind) -> Measure {
        self.map.get(&kind).copied().unwrap_or(Measure::PresentValue)
    }
}

impl Default for Measures {
    fn default() -> Self {
        Self::standard().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pillar_core::{Currency, Date};
    use pillar_curves::{Curve, CurveMeta, CurveName};
    use crate::instruments::Deposit;

    fn sample_provider() -> RatesProvider {
        let curve = Curve::new(
            CurveName::from("EUR-DSC"),
            vec![0.5, 1.0, 5.0],
            vec![0.02, 0.02, 0.02],
            CurveMeta::default(),
        )
        .unwrap();
        RatesProvider::builder(Date::from_ymd(2026, 1, 15).unwrap())
            .discount(Currency::EUR, curve)
            .build()
    }

    fn sample_deposit() -> ResolvedInstrument {
        ResolvedInstrument::Deposit(Deposit {
            currency: Currency::EUR,
            start: Date::from_ymd(2026, 1, 15).unwrap(),
            end: Date::from_ymd(2027, 1, 15).unwrap(),
            accrual_factor: 1.0,
            rate: 0.02,
            notional: 1_000_000.0,
        })
    }

    #[test]
    fn test_standard_registry() {
        let measures = Measures::standard();
        assert_eq!(measures.for_kind(InstrumentKind::Swap), Measure::ParRate);
        assert_eq!(measures.for_kind(InstrumentKind::Ois), Measure::ParRate);
        assert_eq!(
            measures.for_kind(InstrumentKind::XccyBasisSwap),
            Measure::ParSpread
        );
    }

    #[test]
    fn test_override() {
        let measures = Measures::default().with(InstrumentKind::Swap, Measure::PresentValue);
        assert_eq!(measures.for_kind(InstrumentKind::Swap), Measure::PresentValue);
        // Others untouched
        assert_eq!(measures.for_kind(InstrumentKind::Fra), Measure::ParRate);
    }

    #[test]
    fn test_residual_scales() {
        let deposit = sample_deposit();
        assert_relative_eq!(Measure::ParRate.residual_scale(&deposit), 1.0);
        assert_relative_eq!(
            Measure::PresentValue.residual_scale(&deposit),
            1_000_000.0 * 1e3
        );
    }

    #[test]
    fn test_par_rate_residual_vs_pv_residual() {
        let provider = sample_provider();
        let deposit = sample_deposit();

        let rate_residual = Measure::ParRate.residual(&deposit, &provider).unwrap();
        let pv_residual = Measure::PresentValue.residual(&deposit, &provider).unwrap();

        // Both near zero on the matching flat curve, in their own units
        assert!(rate_residual.abs() < 5e-4);
        assert!(pv_residual.abs() < 500.0);
    }
}
