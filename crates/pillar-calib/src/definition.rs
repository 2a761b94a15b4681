//! Curve and group definitions.
//!
//! A [`CurveDefinition`] names a curve, lists its nodes, and fixes its shape
//! (interpolation, extrapolation, value type, day count) plus a seed value.
//! Definitions are partitioned into [`CurveGroupDefinition`]s solved as one
//! square system each; a [`CalibrationDefinition`] orders the groups along
//! an explicit dependency DAG, validated before any numeric work starts.

use pillar_core::{Currency, Date};
use pillar_curves::{CurveMeta, CurveName, RateIndex, ValueType};

use crate::error::{CalibError, CalibResult};
use crate::node::CurveNode;
use crate::quotes::MarketQuotes;

/// Definition of one curve to calibrate.
#[derive(Debug, Clone)]
pub struct CurveDefinition {
    /// Curve name, unique within the calibration.
    pub name: CurveName,
    /// Ordered calibration nodes.
    pub nodes: Vec<CurveNode>,
    /// Curve shape (interpolation, extrapolation, value type, day count).
    pub meta: CurveMeta,
    /// Seed node value for the first Newton iterate.
    pub seed: f64,
}

impl CurveDefinition {
    /// Creates a definition with the conventional seed for its value type
    /// (0 for zero rates, 1 for discount factors).
    #[must_use]
    pub fn new(name: impl Into<CurveName>, nodes: Vec<CurveNode>, meta: CurveMeta) -> Self {
        let seed = match meta.value_type {
            ValueType::ZeroRate => 0.0,
            ValueType::DiscountFactor => 1.0,
        };
        Self {
            name: name.into(),
            nodes,
            meta,
            seed,
        }
    }

    /// Overrides the seed value.
    #[must_use]
    pub fn with_seed(mut self, seed: f64) -> Self {
        self.seed = seed;
        self
    }

    /// Resolves the node x-values against a valuation date.
    ///
    /// # Errors
    ///
    /// Propagates node resolution errors; non-increasing pillar dates are
    /// reported when the curve is built.
    pub fn node_times(
        &self,
        valuation_date: Date,
        quotes: &MarketQuotes,
    ) -> CalibResult<Vec<f64>> {
        let mut times = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let (_, pillar) = node.resolve(valuation_date, quotes)?;
            times.push(self.meta.day_count.year_fraction_f64(valuation_date, pillar));
        }
        Ok(times)
    }
}

/// One curve of a group plus the provider keys it is bound under.
#[derive(Debug, Clone)]
pub struct CurveGroupEntry {
    /// The curve definition.
    pub definition: CurveDefinition,
    /// Currencies this curve discounts.
    pub discount_currencies: Vec<Currency>,
    /// Indices this curve forwards.
    pub forward_indices: Vec<RateIndex>,
}

impl CurveGroupEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(definition: CurveDefinition) -> Self {
        Self {
            definition,
            discount_currencies: Vec::new(),
            forward_indices: Vec::new(),
        }
    }

    /// Declares the curve as the discount curve of a currency.
    #[must_use]
    pub fn discounting(mut self, currency: Currency) -> Self {
        self.discount_currencies.push(currency);
        self
    }

    /// Declares the curve as the forward curve of an index.
    #[must_use]
    pub fn forwarding(mut self, index: RateIndex) -> Self {
        self.forward_indices.push(index);
        self
    }
}

/// A set of curves calibrated jointly as one square system.
#[derive(Debug, Clone)]
pub struct CurveGroupDefinition {
    /// Group name.
    pub name: String,
    /// The curves of this group.
    pub entries: Vec<CurveGroupEntry>,
}

impl CurveGroupDefinition {
    /// Creates a group.
    #[must_use]
    pub fn new(name: impl Into<String>, entries: Vec<CurveGroupEntry>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    /// Total node (parameter) count across the group's curves.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.definition.nodes.len())
            .sum()
    }
}

/// The full calibration configuration: groups plus dependency edges.
///
/// Groups are solved in a topological order of the dependency graph; a
/// cycle is rejected at construction, before any numeric iteration.
#[derive(Debug, Clone)]
pub struct CalibrationDefinition {
    groups: Vec<CurveGroupDefinition>,
    /// Solve order as indices into `groups`.
    order: Vec<usize>,
}

impl CalibrationDefinition {
    /// Creates a definition from groups and dependency edges.
    ///
    /// Each edge `(group, depends_on)` names groups; `group` is solved after
    /// `depends_on`. Groups with no path between them keep their input
    /// order, so the solve order is deterministic.
    ///
    /// # Errors
    ///
    /// Returns `CalibError::CyclicDependency` on a cycle and an
    /// invalid-instrument error for an edge naming an unknown group.
    pub fn new(
        groups: Vec<CurveGroupDefinition>,
        dependencies: &[(&str, &str)],
    ) -> CalibResult<Self> {
        let index_of = |name: &str| -> CalibResult<usize> {
            groups
                .iter()
                .position(|g| g.name == name)
                .ok_or_else(|| CalibError::invalid_instrument(name, "unknown group in dependency"))
        };

        let n = groups.len();
        let mut depends_on: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (group, dep) in dependencies {
            let g = index_of(group)?;
            let d = index_of(dep)?;
            depends_on[g].push(d);
        }

        // Kahn's algorithm, preferring lower input index among ready groups
        let mut order = Vec::with_capacity(n);
        let mut done = vec![false; n];
        while order.len() < n {
            let ready = (0..n).find(|&g| {
                !done[g] && depends_on[g].iter().all(|&d| done[d])
            });
            match ready {
                Some(g) => {
                    done[g] = true;
                    order.push(g);
                }
                None => {
                    let stuck = (0..n).find(|&g| !done[g]).unwrap_or(0);
                    return Err(CalibError::cyclic_dependency(groups[stuck].name.clone()));
                }
            }
        }

        Ok(Self { groups, order })
    }

    /// Creates a definition of independent groups solved in input order.
    #[must_use]
    pub fn sequential(groups: Vec<CurveGroupDefinition>) -> Self {
        let order = (0..groups.len()).collect();
        Self { groups, order }
    }

    /// Returns the groups in input order.
    #[must_use]
    pub fn groups(&self) -> &[CurveGroupDefinition] {
        &self.groups
    }

    /// Returns the groups in solve order.
    pub fn solve_order(&self) -> impl Iterator<Item = &CurveGroupDefinition> {
        self.order.iter().map(|&i| &self.groups[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(name: &str) -> CurveGroupDefinition {
        CurveGroupDefinition::new(name, Vec::new())
    }

    #[test]
    fn test_solve_order_respects_dependencies() {
        let def = CalibrationDefinition::new(
            vec![group("xccy"), group("eur"), group("usd")],
            &[("xccy", "eur"), ("xccy", "usd")],
        )
        .unwrap();

        let order: Vec<&str> = def.solve_order().map(|g| g.name.as_str()).collect();
        assert_eq!(order, vec!["eur", "usd", "xccy"]);
    }

    #[test]
    fn test_cycle_rejected() {
        let result = CalibrationDefinition::new(
            vec![group("a"), group("b")],
            &[("a", "b"), ("b", "a")],
        );
        assert!(matches!(result, Err(CalibError::CyclicDependency { .. })));
    }

    #[test]
    fn test_self_cycle_rejected() {
        let result = CalibrationDefinition::new(vec![group("a")], &[("a", "a")]);
        assert!(matches!(result, Err(CalibError::CyclicDependency { .. })));
    }

    #[test]
    fn test_unknown_group_in_edge() {
        let result = CalibrationDefinition::new(vec![group("a")], &[("a", "ghost")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_independent_groups_keep_input_order() {
        let def = CalibrationDefinition::new(vec![group("z"), group("a")], &[]).unwrap();
        let order: Vec<&str> = def.solve_order().map(|g| g.name.as_str()).collect();
        assert_eq!(order, vec!["z", "a"]);
    }
}
