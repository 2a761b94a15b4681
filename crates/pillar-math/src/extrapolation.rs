//! Extrapolation policy for curve boundaries.

use serde::{Deserialize, Serialize};

/// How a curve behaves outside its node range.
///
/// The policy is applied independently on each side of the node range; an
/// out-of-domain query uses that side's policy and never silently clamps
/// unless the policy is [`Extrapolation::Flat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Extrapolation {
    /// No extrapolation - out-of-range queries are an error.
    None,
    /// Constant value from the boundary node.
    #[default]
    Flat,
    /// Linear continuation with the boundary slope.
    Linear,
}

impl Extrapolation {
    /// Returns the policy name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Extrapolation::None => "None",
            Extrapolation::Flat => "Flat",
            Extrapolation::Linear => "Linear",
        }
    }
}
