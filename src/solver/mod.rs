//! Operating-point solver boundary.
//!
//! The numerical engine lives outside this crate. Anything that can take a
//! [`Circuit`], solve its DC operating point, and report node voltages by
//! name implements [`OperatingPointSolver`]. The production backend is
//! [`NgspiceSolver`], which runs ngspice in batch mode once per solve.
//!
//! Solvers may fold node names to lower case; [`OperatingPoint`] lookups are
//! case-insensitive and accept both `vout` and `v(vout)`.

mod ngspice;
mod rawfile;

#[cfg(test)]
pub(crate) mod fake;

pub use ngspice::{NgspiceSolver, SolverConfig};
pub use rawfile::{parse_rawfile, RawVariable, Rawfile, RawfileHeader};

use std::collections::HashMap;

use crate::circuit::Circuit;
use crate::error::{Result, ShuntError};

/// A collaborator that solves DC operating points.
pub trait OperatingPointSolver {
    /// Solve the operating point of `circuit` at its current source values.
    fn operating_point(&self, circuit: &Circuit) -> Result<OperatingPoint>;
}

impl<F> OperatingPointSolver for F
where
    F: Fn(&Circuit) -> Result<OperatingPoint>,
{
    fn operating_point(&self, circuit: &Circuit) -> Result<OperatingPoint> {
        self(circuit)
    }
}

/// Solved node voltages and branch currents of one operating point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatingPoint {
    /// Values keyed by lower-cased solver variable name
    values: HashMap<String, f64>,
}

impl OperatingPoint {
    /// Create an empty operating point.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a solver variable. The name is stored lower-cased.
    pub fn insert(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_lowercase(), value);
    }

    /// Number of recorded variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no variables were recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(name, value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Voltage of `node` relative to ground.
    pub fn voltage(&self, node: &str) -> Option<f64> {
        let key = node.to_lowercase();
        if key == "0" || key == "gnd" {
            return Some(0.0);
        }
        self.values
            .get(&format!("v({key})"))
            .or_else(|| self.values.get(&key))
            .copied()
    }

    /// Voltage of `node`, or [`ShuntError::NodeNotFound`].
    pub fn require_voltage(&self, node: &str) -> Result<f64> {
        self.voltage(node).ok_or_else(|| ShuntError::NodeNotFound {
            node: node.to_lowercase(),
        })
    }

    /// Branch current through the voltage source `source`.
    ///
    /// SPICE reports the current flowing into the positive terminal, so a
    /// source delivering power reads negative.
    pub fn branch_current(&self, source: &str) -> Option<f64> {
        let key = source.to_lowercase();
        self.values
            .get(&format!("i({key})"))
            .or_else(|| self.values.get(&format!("{key}#branch")))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_tolerates_case_and_spelling() {
        let mut op = OperatingPoint::new();
        op.insert("V(VOUT)", 3.306);
        op.insert("ref", 2.495);
        op.insert("vbat#branch", -1.66e-3);

        assert_eq!(op.voltage("VOUT"), Some(3.306));
        assert_eq!(op.voltage("vout"), Some(3.306));
        assert_eq!(op.voltage("REF"), Some(2.495));
        assert_eq!(op.voltage("GND"), Some(0.0));
        assert_eq!(op.voltage("GATE"), None);
        assert_eq!(op.branch_current("VBAT"), Some(-1.66e-3));
        assert_eq!(op.len(), 3);
    }

    #[test]
    fn test_require_voltage_reports_missing_node() {
        let op = OperatingPoint::new();
        assert!(op.is_empty());
        match op.require_voltage("VOUT") {
            Err(ShuntError::NodeNotFound { node }) => assert_eq!(node, "vout"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_closures_are_solvers() {
        let solver = |_: &Circuit| {
            let mut op = OperatingPoint::new();
            op.insert("out", 5.0);
            Ok::<_, ShuntError>(op)
        };
        let circuit = Circuit::new("empty");
        let op = solver.operating_point(&circuit).unwrap();
        assert_eq!(op.voltage("OUT"), Some(5.0));
    }
}
