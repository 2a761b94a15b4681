//! # Pillar Calib
//!
//! The multi-curve calibration engine:
//!
//! - **Configuration**: curve nodes bound to market quotes, curve and group
//!   definitions, explicit group dependency DAG
//! - **Instruments**: a closed sum type of fully dated calibration
//!   instruments with analytic point sensitivities
//! - **Measures**: the residual function per instrument kind (par rate, par
//!   spread, present value), each owning its tolerance policy
//! - **Calibrator**: per-group Newton solve with analytic Jacobian, LU
//!   step, and retained factorization
//! - **Market quote sensitivity**: transpose solves against the retained
//!   Jacobians, re-expressing node risk as quote risk
//!
//! ## Example
//!
//! ```rust,ignore
//! use pillar_calib::prelude::*;
//!
//! let definition = CalibrationDefinition::sequential(vec![eur_group]);
//! let calibrated = CurveCalibrator::new()
//!     .calibrate(&definition, &quotes, FxMatrix::new())?;
//!
//! let pv = trade.present_value(&calibrated.provider)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod calibrator;
pub mod definition;
pub mod error;
pub mod instruments;
pub mod market_quote;
pub mod measures;
pub mod node;
pub mod quotes;

pub use calibrator::{
    Calibrated, CalibrationOutputs, CalibratorConfig, CurveCalibrator, GroupJacobian,
};
pub use definition::{
    CalibrationDefinition, CurveDefinition, CurveGroupDefinition, CurveGroupEntry,
};
pub use error::{CalibError, CalibResult};
pub use instruments::{InstrumentKind, ResolvedInstrument};
pub use market_quote::{
    MarketQuoteSensitivities, MarketQuoteSensitivity, MarketQuoteSensitivityCalculator,
};
pub use measures::{Measure, Measures};
pub use node::{CurveNode, InstrumentTemplate};
pub use quotes::{MarketQuotes, QuoteId};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::calibrator::{Calibrated, CalibratorConfig, CurveCalibrator};
    pub use crate::definition::{
        CalibrationDefinition, CurveDefinition, CurveGroupDefinition, CurveGroupEntry,
    };
    pub use crate::error::{CalibError, CalibResult};
    pub use crate::instruments::{InstrumentKind, ResolvedInstrument};
    pub use crate::market_quote::MarketQuoteSensitivityCalculator;
    pub use crate::measures::{Measure, Measures};
    pub use crate::node::{CurveNode, InstrumentTemplate};
    pub use crate::quotes::{MarketQuotes, QuoteId};
}
