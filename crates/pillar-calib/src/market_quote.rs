//! Market quote sensitivity.
//!
//! Re-expresses a curve-node parameter sensitivity in the space of the
//! original market quotes by inverting the calibration: with residuals
//! `r_i = par_i(y) - q_i`, the implicit function theorem gives
//! `dy/dq = J^{-1}`, so `d(PV)/dq = (J^T)^{-1} s` per group, solved against
//! the Jacobian factorization retained from calibration.
//!
//! Groups are independent here exactly as in the calibration itself:
//! a group's quotes move only that group's curves.

use nalgebra::DVector;
use pillar_core::Currency;
use pillar_curves::{CurrencyParameterSensitivities, CurveError};
use serde::{Deserialize, Serialize};

use crate::calibrator::{CalibrationOutputs, GroupJacobian};
use crate::error::{CalibError, CalibResult};
use crate::quotes::QuoteId;

/// Sensitivity of a value to one market quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuoteSensitivity {
    /// The quote.
    pub quote_id: QuoteId,
    /// Currency of the differentiated value.
    pub currency: Currency,
    /// d(value) / d(quote), in value units per quote unit.
    pub value: f64,
}

/// Sensitivities to all market quotes, ordered by quote id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketQuoteSensitivities {
    values: Vec<MarketQuoteSensitivity>,
}

impl MarketQuoteSensitivities {
    /// Returns the sensitivities in (quote, currency) order.
    #[must_use]
    pub fn values(&self) -> &[MarketQuoteSensitivity] {
        &self.values
    }

    /// Finds the sensitivity to one quote, summed over currencies.
    #[must_use]
    pub fn value_for(&self, quote_id: &QuoteId) -> f64 {
        self.values
            .iter()
            .filter(|s| &s.quote_id == quote_id)
            .map(|s| s.value)
            .sum()
    }

    fn add(&mut self, entry: MarketQuoteSensitivity) {
        if let Some(existing) = self
            .values
            .iter_mut()
            .find(|s| s.quote_id == entry.quote_id && s.currency == entry.currency)
        {
            existing.value += entry.value;
        } else {
            self.values.push(entry);
            self.values
                .sort_by(|a, b| (&a.quote_id, a.currency).cmp(&(&b.quote_id, b.currency)));
        }
    }
}

/// Converts parameter sensitivities into market-quote sensitivities.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketQuoteSensitivityCalculator;

impl MarketQuoteSensitivityCalculator {
    /// Creates a calculator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Re-expresses `parameter_sensitivities` in market-quote space.
    ///
    /// # Errors
    ///
    /// A block referencing a curve no calibration group produced is an
    /// error; transpose-solve failures propagate as math errors.
    pub fn sensitivity(
        &self,
        parameter_sensitivities: &CurrencyParameterSensitivities,
        outputs: &CalibrationOutputs,
    ) -> CalibResult<MarketQuoteSensitivities> {
        // Every referenced curve must have been calibrated somewhere
        for block in parameter_sensitivities.blocks() {
            if outputs.group_for_curve(&block.curve).is_none() {
                return Err(CalibError::Curve(CurveError::curve_not_found(
                    block.curve.as_str(),
                )));
            }
        }

        let mut result = MarketQuoteSensitivities::default();

        for group in outputs.groups() {
            let mut currencies: Vec<Currency> = parameter_sensitivities
                .blocks()
                .iter()
                .filter(|b| group.contains_curve(&b.curve))
                .map(|b| b.currency)
                .collect();
            currencies.sort();
            currencies.dedup();

            for currency in currencies {
                let s = self.group_vector(parameter_sensitivities, group, currency);
                if s.iter().all(|v| *v == 0.0) {
                    continue;
                }

                let x = group.lu().solve_transposed(&s).map_err(CalibError::Math)?;
                for (k, quote_id) in group.quote_ids.iter().enumerate() {
                    if x[k] != 0.0 {
                        result.add(MarketQuoteSensitivity {
                            quote_id: quote_id.clone(),
                            currency,
                            value: x[k],
                        });
                    }
                }
            }
        }

        Ok(result)
    }

    /// Gathers one currency's sensitivities over a group's column order.
    fn group_vector(
        &self,
        parameter_sensitivities: &CurrencyParameterSensitivities,
        group: &GroupJacobian,
        currency: Currency,
    ) -> DVector<f64> {
        let mut s = DVector::zeros(group.columns.len());
        for (i, (curve, node)) in group.columns.iter().enumerate() {
            if let Some(block) = parameter_sensitivities
                .blocks()
                .iter()
                .find(|b| &b.curve == curve && b.currency == currency)
            {
                if let Some(value) = block.sensitivities.get(*node) {
                    s[i] = *value;
                }
            }
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_type_serializes() {
        let mut sens = MarketQuoteSensitivities::default();
        sens.add(MarketQuoteSensitivity {
            quote_id: QuoteId::from("EUR-OIS-5Y"),
            currency: Currency::EUR,
            value: 123.45,
        });
        sens.add(MarketQuoteSensitivity {
            quote_id: QuoteId::from("EUR-OIS-5Y"),
            currency: Currency::EUR,
            value: 1.0,
        });

        let json = serde_json::to_string(&sens).unwrap();
        let back: MarketQuoteSensitivities = serde_json::from_str(&json).unwrap();
        assert_eq!(sens, back);
        // Same quote/currency entries merge by addition
        assert!((back.value_for(&QuoteId::from("EUR-OIS-5Y")) - 124.45).abs() < 1e-12);
    }
}
