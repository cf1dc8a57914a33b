//! Independent voltage source.

use crate::circuit::{ElementId, NodeId};

/// A DC voltage source component.
///
/// The source enforces: V+ - V- = dc_value. Its value is the only part of a
/// built circuit that changes between operating-point solves.
#[derive(Debug, Clone)]
pub struct VoltageSource {
    pub id: ElementId,
    pub name: String,
    pub nodes: [NodeId; 2], // [positive, negative]
    pub dc_value: f64,
}

impl VoltageSource {
    /// Create a new voltage source.
    pub fn new(id: ElementId, name: String, nodes: [NodeId; 2], dc_value: f64) -> Self {
        Self {
            id,
            name,
            nodes,
            dc_value,
        }
    }

    /// Set the source value.
    pub fn set_value(&mut self, value: f64) {
        self.dc_value = value;
    }

    /// Get the current source voltage.
    pub fn voltage(&self) -> f64 {
        self.dc_value
    }
}
