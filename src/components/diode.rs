//! Diode model.
//!
//! Only the model card parameters are carried; the solver evaluates the
//! Shockley junction equation itself.

use crate::circuit::{ElementId, NodeId};

/// Parameters of a SPICE `D` model card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiodeParams {
    /// Saturation current (Is), typically 1e-14 to 1e-12 A
    pub is: f64,
    /// Ideality factor (n), typically 1.0 to 2.0
    pub n: f64,
}

impl Default for DiodeParams {
    fn default() -> Self {
        Self { is: 1e-14, n: 1.0 }
    }
}

/// A named diode model, rendered as a `.model` card.
#[derive(Debug, Clone, PartialEq)]
pub struct DiodeModel {
    pub name: String,
    pub params: DiodeParams,
}

impl DiodeModel {
    /// Create a new named diode model.
    pub fn new(name: impl Into<String>, params: DiodeParams) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

/// A diode component.
#[derive(Debug, Clone)]
pub struct Diode {
    pub id: ElementId,
    pub name: String,
    pub nodes: [NodeId; 2], // [anode, cathode]
    /// Name of the `.model` card this diode uses
    pub model: String,
}

impl Diode {
    /// Create a new diode.
    pub fn new(id: ElementId, name: String, nodes: [NodeId; 2], model: String) -> Self {
        Self {
            id,
            name,
            nodes,
            model,
        }
    }
}
