//! # Pillar Vol
//!
//! SABR smile calibration:
//!
//! - [`SabrParams`] and the Hagan (2002) lognormal implied volatility
//!   approximation
//! - [`SabrSmileCalibrator`]: an independent least-squares fit of
//!   (alpha, rho, nu) per (expiry, tenor) node to a strike grid of market
//!   volatilities, skipping missing points
//! - [`SabrSurface`]: the fitted nodes, each carrying the Jacobian of its
//!   fitted parameters with respect to the input volatilities, mirroring
//!   the curve calibrator's retained-Jacobian design for downstream risk

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod calibrator;
pub mod error;
pub mod sabr;
pub mod surface;

pub use calibrator::{SabrSmileCalibrator, SmileCalibratorConfig, SmileNode};
pub use error::{VolError, VolResult};
pub use sabr::SabrParams;
pub use surface::{FittedSmileNode, SabrSurface};
