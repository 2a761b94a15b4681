//! Fitted SABR surface.

use nalgebra::DMatrix;

use crate::sabr::SabrParams;

/// One fitted node of the surface.
#[derive(Debug, Clone)]
pub struct FittedSmileNode {
    /// Node expiry in years.
    pub expiry: f64,
    /// Node (underlying) tenor in years.
    pub tenor: f64,
    /// Forward of the underlying at this node.
    pub forward: f64,
    /// Fitted parameters (beta as configured, alpha/rho/nu fitted).
    pub params: SabrParams,
    /// Strikes of the usable (non-NaN) input points, in input order.
    pub strikes: Vec<f64>,
    /// Root-mean-square fit error over the usable points.
    pub rms_error: f64,
    /// Jacobian of (alpha, rho, nu) with respect to each usable input
    /// volatility: rows = the 3 fitted parameters, columns = input points.
    ///
    /// Retained for downstream risk translation, in the same way the curve
    /// calibrator retains its group Jacobians.
    pub data_jacobian: DMatrix<f64>,
}

/// A SABR surface: independently fitted (expiry, tenor) nodes.
#[derive(Debug, Clone, Default)]
pub struct SabrSurface {
    nodes: Vec<FittedSmileNode>,
}

impl SabrSurface {
    /// Creates a surface from fitted nodes.
    #[must_use]
    pub fn new(nodes: Vec<FittedSmileNode>) -> Self {
        Self { nodes }
    }

    /// Returns the fitted nodes.
    #[must_use]
    pub fn nodes(&self) -> &[FittedSmileNode] {
        &self.nodes
    }

    /// Finds the node at an (expiry, tenor) coordinate.
    #[must_use]
    pub fn node(&self, expiry: f64, tenor: f64) -> Option<&FittedSmileNode> {
        self.nodes
            .iter()
            .find(|n| n.expiry == expiry && n.tenor == tenor)
    }
}
