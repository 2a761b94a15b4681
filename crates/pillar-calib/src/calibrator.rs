//! The multi-curve Newton calibrator.
//!
//! Groups are solved strictly in dependency order; within a group all
//! curves are solved simultaneously as one square nonlinear system
//! `residuals(node values) = 0` by Newton iteration with an analytic
//! Jacobian and an LU linear step. Earlier groups' solved curves are part
//! of the provider that later groups' instruments price against; their
//! sensitivities are projected out of the square solve.
//!
//! The final-iterate Jacobian and its factorization are retained per group
//! in [`CalibrationOutputs`] so market-quote risk can re-solve against the
//! same matrix without recomputation.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};
use pillar_core::{Currency, Date};
use pillar_curves::{
    Curve, CurveKey, CurveName, FxMatrix, RatesProvider, RatesProviderBuilder,
};
use pillar_math::linear_algebra::LuDecomposition;
use pillar_math::MathError;

use crate::definition::{CalibrationDefinition, CurveGroupDefinition};
use crate::error::{CalibError, CalibResult};
use crate::instruments::ResolvedInstrument;
use crate::measures::{Measure, Measures};
use crate::quotes::{MarketQuotes, QuoteId};

/// Convergence policy of the Newton iteration.
///
/// An instrument's residual is converged when
/// `|r| <= scale * max(tolerance_abs, tolerance_rel * |quote|)`,
/// where `scale` is the measure's unit scale (1 for rate-unit residuals).
#[derive(Debug, Clone, Copy)]
pub struct CalibratorConfig {
    /// Absolute tolerance on the scaled residual.
    pub tolerance_abs: f64,
    /// Relative tolerance against the quote magnitude (0 disables).
    pub tolerance_rel: f64,
    /// Maximum Newton iterations per group.
    pub max_iterations: usize,
}

impl Default for CalibratorConfig {
    fn default() -> Self {
        Self {
            tolerance_abs: 1e-9,
            tolerance_rel: 0.0,
            max_iterations: 30,
        }
    }
}

/// The retained Jacobian of one solved group.
#[derive(Debug, Clone)]
pub struct GroupJacobian {
    /// Group name.
    pub group: String,
    /// Row order: the quote behind each calibration instrument.
    pub quote_ids: Vec<QuoteId>,
    /// Currency of each row's instrument.
    pub currencies: Vec<Currency>,
    /// Column order: (curve, node index) across the group's curves.
    pub columns: Vec<(CurveName, usize)>,
    /// The final-iterate Jacobian, rows = instruments, columns = nodes.
    pub jacobian: DMatrix<f64>,
    lu: LuDecomposition,
}

impl GroupJacobian {
    /// The retained LU factorization of the Jacobian.
    #[must_use]
    pub fn lu(&self) -> &LuDecomposition {
        &self.lu
    }

    /// Returns true if the group calibrated the given curve.
    #[must_use]
    pub fn contains_curve(&self, name: &CurveName) -> bool {
        self.columns.iter().any(|(c, _)| c == name)
    }
}

/// Per-group Jacobians retained from a calibration run.
#[derive(Debug, Clone, Default)]
pub struct CalibrationOutputs {
    groups: Vec<GroupJacobian>,
}

impl CalibrationOutputs {
    /// Returns the groups in solve order.
    #[must_use]
    pub fn groups(&self) -> &[GroupJacobian] {
        &self.groups
    }

    /// Finds the group that calibrated a curve.
    #[must_use]
    pub fn group_for_curve(&self, name: &CurveName) -> Option<&GroupJacobian> {
        self.groups.iter().find(|g| g.contains_curve(name))
    }
}

/// A calibration result: the solved provider plus retained Jacobians.
#[derive(Debug, Clone)]
pub struct Calibrated {
    /// The fully calibrated provider.
    pub provider: RatesProvider,
    /// Retained per-group Jacobians for market-quote risk.
    pub outputs: CalibrationOutputs,
}

/// One group's working state during the Newton solve.
struct GroupSystem {
    /// Instruments with their measure, unit scale, quote id, and quote.
    instruments: Vec<(ResolvedInstrument, Measure, f64, QuoteId, Currency, f64)>,
    /// Per curve: name, node times, metadata source entry index, and the
    /// half-open column range of its nodes in the parameter vector.
    curves: Vec<CurveBlock>,
}

struct CurveBlock {
    name: CurveName,
    times: Vec<f64>,
    entry: usize,
    range: std::ops::Range<usize>,
}

/// The multi-curve calibrator.
#[derive(Debug, Clone)]
pub struct CurveCalibrator {
    config: CalibratorConfig,
    measures: Measures,
}

impl Default for CurveCalibrator {
    fn default() -> Self {
        Self::new()
    }
}

impl CurveCalibrator {
    /// Creates a calibrator with the default configuration and the standard
    /// measure registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: CalibratorConfig::default(),
            measures: Measures::default(),
        }
    }

    /// Overrides the configuration.
    #[must_use]
    pub fn with_config(mut self, config: CalibratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the measure registry.
    #[must_use]
    pub fn with_measures(mut self, measures: Measures) -> Self {
        self.measures = measures;
        self
    }

    /// Calibrates all groups against a quote snapshot.
    ///
    /// # Errors
    ///
    /// Configuration errors (missing quotes, non-square groups, invalid
    /// definitions) surface before iteration; numeric errors
    /// (`SingularJacobian`, `DidNotConverge`) carry the group name and
    /// iteration state.
    pub fn calibrate(
        &self,
        definition: &CalibrationDefinition,
        quotes: &MarketQuotes,
        fx: FxMatrix,
    ) -> CalibResult<Calibrated> {
        let valuation_date = quotes.valuation_date();
        let mut provider = RatesProviderBuilder::new(valuation_date).fx(fx).build();
        let mut outputs = CalibrationOutputs::default();

        for group in definition.solve_order() {
            let system = self.resolve_group(group, valuation_date, quotes)?;
            let (solved, group_jacobian) = self.solve_group(group, system, provider)?;
            provider = solved;
            outputs.groups.push(group_jacobian);
        }

        Ok(Calibrated { provider, outputs })
    }

    /// Calibrates one quote scenario per input snapshot.
    ///
    /// Scenarios are independent immutable inputs, so with the `parallel`
    /// feature enabled they fan out across threads; the output order always
    /// matches the input order.
    pub fn calibrate_scenarios(
        &self,
        definition: &CalibrationDefinition,
        scenarios: &[MarketQuotes],
        fx: &FxMatrix,
    ) -> Vec<CalibResult<Calibrated>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            scenarios
                .par_iter()
                .map(|quotes| self.calibrate(definition, quotes, fx.clone()))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            scenarios
                .iter()
                .map(|quotes| self.calibrate(definition, quotes, fx.clone()))
                .collect()
        }
    }

    /// Resolves a group's instruments and node grid, and checks squareness.
    fn resolve_group(
        &self,
        group: &CurveGroupDefinition,
        valuation_date: Date,
        quotes: &MarketQuotes,
    ) -> CalibResult<GroupSystem> {
        let mut instruments = Vec::new();
        let mut curves = Vec::new();
        let mut column = 0;

        for (entry_index, entry) in group.entries.iter().enumerate() {
            let definition = &entry.definition;
            let times = definition.node_times(valuation_date, quotes)?;

            for node in &definition.nodes {
                let (instrument, _) = node.resolve(valuation_date, quotes)?;
                let measure = self.measures.for_kind(instrument.kind());
                let scale = measure.residual_scale(&instrument);
                let quote = instrument.quote();
                let currency = instrument.currency();
                instruments.push((
                    instrument,
                    measure,
                    scale,
                    node.quote_id.clone(),
                    currency,
                    quote,
                ));
            }

            let range = column..column + times.len();
            column = range.end;
            curves.push(CurveBlock {
                name: definition.name.clone(),
                times,
                entry: entry_index,
                range,
            });
        }

        if instruments.len() != column {
            return Err(CalibError::group_size_mismatch(
                &group.name,
                instruments.len(),
                column,
            ));
        }

        Ok(GroupSystem {
            instruments,
            curves,
        })
    }

    /// Builds the group's trial curves from a parameter vector and binds
    /// them into the provider under the entries' keys.
    fn bind_curves(
        &self,
        group: &CurveGroupDefinition,
        system: &GroupSystem,
        provider: &RatesProvider,
        values: &DVector<f64>,
    ) -> CalibResult<RatesProvider> {
        let mut bound = provider.clone();
        for block in &system.curves {
            let entry = &group.entries[block.entry];
            let y: Vec<f64> = values.as_slice()[block.range.clone()].to_vec();
            let curve = Arc::new(Curve::new(
                block.name.clone(),
                block.times.clone(),
                y,
                entry.definition.meta,
            )?);

            for ccy in &entry.discount_currencies {
                bound = bound.with_curve(CurveKey::Discount(*ccy), Arc::clone(&curve));
            }
            for index in &entry.forward_indices {
                bound = bound.with_curve(CurveKey::Forward(*index), Arc::clone(&curve));
            }
        }
        Ok(bound)
    }

    /// Residual vector of the group against a provider.
    fn residuals(
        &self,
        system: &GroupSystem,
        provider: &RatesProvider,
    ) -> CalibResult<DVector<f64>> {
        let mut r = DVector::zeros(system.instruments.len());
        for (i, (instrument, measure, _, _, _, _)) in system.instruments.iter().enumerate() {
            r[i] = measure.residual(instrument, provider)?;
        }
        Ok(r)
    }

    /// Whether every residual is inside its instrument's tolerance band.
    fn converged(&self, system: &GroupSystem, residuals: &DVector<f64>) -> bool {
        system
            .instruments
            .iter()
            .zip(residuals.iter())
            .all(|((_, _, scale, _, _, quote), r)| {
                let band = scale
                    * self
                        .config
                        .tolerance_abs
                        .max(self.config.tolerance_rel * quote.abs());
                r.abs() <= band
            })
    }

    /// Largest scaled residual, for diagnostics.
    fn max_scaled_residual(&self, system: &GroupSystem, residuals: &DVector<f64>) -> f64 {
        system
            .instruments
            .iter()
            .zip(residuals.iter())
            .map(|((_, _, scale, _, _, _), r)| r.abs() / scale)
            .fold(0.0, f64::max)
    }

    /// Assembles the Jacobian: analytic residual sensitivities chained into
    /// node space and projected onto the group's own columns.
    fn jacobian(
        &self,
        system: &GroupSystem,
        provider: &RatesProvider,
    ) -> CalibResult<DMatrix<f64>> {
        let m = system.instruments.len();
        let mut jac = DMatrix::zeros(m, m);

        for (row, (instrument, measure, _, _, _, _)) in system.instruments.iter().enumerate() {
            let points = measure.residual_sensitivity(instrument, provider)?;
            let params = provider.parameter_sensitivity(&points)?;

            for block in &system.curves {
                if let Some(param) = params.find(&block.name) {
                    for (offset, value) in param.sensitivities.iter().enumerate() {
                        jac[(row, block.range.start + offset)] = *value;
                    }
                }
            }
        }
        Ok(jac)
    }

    /// Newton-solves one group and returns the updated provider plus the
    /// retained Jacobian.
    fn solve_group(
        &self,
        group: &CurveGroupDefinition,
        system: GroupSystem,
        provider: RatesProvider,
    ) -> CalibResult<(RatesProvider, GroupJacobian)> {
        let n = system.instruments.len();

        // Seed parameter vector per curve block
        let mut values = DVector::zeros(n);
        for block in &system.curves {
            let seed = group.entries[block.entry].definition.seed;
            for i in block.range.clone() {
                values[i] = seed;
            }
        }

        let mut trial = self.bind_curves(group, &system, &provider, &values)?;
        let mut residuals = self.residuals(&system, &trial)?;
        let mut iteration = 0;

        while !self.converged(&system, &residuals) {
            if iteration >= self.config.max_iterations {
                return Err(CalibError::DidNotConverge {
                    group: group.name.clone(),
                    iterations: iteration,
                    max_residual: self.max_scaled_residual(&system, &residuals),
                    residuals: residuals.iter().copied().collect(),
                });
            }

            let jac = self.jacobian(&system, &trial)?;
            let lu = LuDecomposition::new(&jac).map_err(|e| match e {
                MathError::SingularMatrix { .. } => CalibError::SingularJacobian {
                    group: group.name.clone(),
                    iteration,
                },
                other => CalibError::Math(other),
            })?;
            let step = lu.solve(&residuals).map_err(CalibError::Math)?;

            values -= step;
            trial = self.bind_curves(group, &system, &provider, &values)?;
            residuals = self.residuals(&system, &trial)?;
            iteration += 1;

            log::debug!(
                "group '{}' iteration {}: max scaled residual {:.3e}",
                group.name,
                iteration,
                self.max_scaled_residual(&system, &residuals)
            );
        }

        // Retain the Jacobian at the solution for market-quote risk
        let jacobian = self.jacobian(&system, &trial)?;
        let lu = LuDecomposition::new(&jacobian).map_err(|e| match e {
            MathError::SingularMatrix { .. } => CalibError::SingularJacobian {
                group: group.name.clone(),
                iteration,
            },
            other => CalibError::Math(other),
        })?;

        let group_jacobian = GroupJacobian {
            group: group.name.clone(),
            quote_ids: system
                .instruments
                .iter()
                .map(|(_, _, _, id, _, _)| id.clone())
                .collect(),
            currencies: system
                .instruments
                .iter()
                .map(|(_, _, _, _, ccy, _)| *ccy)
                .collect(),
            columns: system
                .curves
                .iter()
                .flat_map(|b| (0..b.times.len()).map(move |i| (b.name.clone(), i)))
                .collect(),
            jacobian,
            lu,
        };

        Ok((trial, group_jacobian))
    }
}
