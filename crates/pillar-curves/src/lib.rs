//! # Pillar Curves
//!
//! Curve parameterization and the multi-curve rates provider:
//!
//! - [`Curve`]: an ordered set of (x, y) nodes bound to an interpolation
//!   scheme and per-side extrapolation policy, exposing the value, its slope,
//!   and the analytic sensitivity of the value to every node
//! - [`RatesProvider`]: an immutable snapshot of discount curves per
//!   currency, forward curves per rate index, and FX spot rates, consumed
//!   read-only by pricers
//! - [`PointSensitivities`] / [`CurrencyParameterSensitivities`]: the
//!   sensitivity representations flowing from pricers through the provider
//!   into the calibrator
//!
//! Curves are cheap to rebind: each calibration iteration swaps node values
//! into fresh `Curve` instances behind `Arc`, nothing is mutated in place.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod curve;
pub mod error;
pub mod fx;
pub mod index;
pub mod provider;
pub mod sensitivity;
pub mod shifts;

pub use curve::{Curve, CurveMeta, CurveName, ValueType};
pub use error::{CurveError, CurveResult};
pub use fx::FxMatrix;
pub use index::RateIndex;
pub use provider::{IborObservation, OvernightObservation, RatesProvider, RatesProviderBuilder};
pub use sensitivity::{
    CurrencyParameterSensitivities, CurveKey, ParameterSensitivity, PointSensitivities,
    PointSensitivity,
};
