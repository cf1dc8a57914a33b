//! Linear passive components: Resistor, Capacitor.

use crate::circuit::{ElementId, NodeId};

/// A resistor component.
#[derive(Debug, Clone)]
pub struct Resistor {
    pub id: ElementId,
    pub name: String,
    pub nodes: [NodeId; 2], // [positive, negative]
    pub resistance: f64,
}

impl Resistor {
    /// Create a new resistor.
    pub fn new(id: ElementId, name: String, nodes: [NodeId; 2], resistance: f64) -> Self {
        Self {
            id,
            name,
            nodes,
            resistance,
        }
    }

}

/// A capacitor component.
///
/// Open circuit at the DC operating point; it only matters to the solver
/// for transient and AC analyses, but it is part of the netlist.
#[derive(Debug, Clone)]
pub struct Capacitor {
    pub id: ElementId,
    pub name: String,
    pub nodes: [NodeId; 2],
    pub capacitance: f64,
}

impl Capacitor {
    /// Create a new capacitor.
    pub fn new(id: ElementId, name: String, nodes: [NodeId; 2], capacitance: f64) -> Self {
        Self {
            id,
            name,
            nodes,
            capacitance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resistor_keeps_terminals() {
        let r = Resistor::new(
            ElementId(0),
            "RSER".to_string(),
            [NodeId(1), NodeId(2)],
            4700.0,
        );
        assert_eq!(r.nodes, [NodeId(1), NodeId(2)]);
        assert_eq!(r.resistance, 4700.0);
    }
}
