//! Element models for the circuit description.
//!
//! This module provides the elements a regulator netlist is made of:
//! - Linear: Resistor, Capacitor
//! - Sources: DC Voltage Source
//! - Nonlinear: Diode (with named `.model` cards)
//! - Behavioral: voltage/current sources driven by a closed-form equation

mod behavioral;
mod diode;
mod linear;
mod sources;

pub use behavioral::{BehavioralExpr, BehavioralOutput, BehavioralSource};
pub use diode::{Diode, DiodeModel, DiodeParams};
pub use linear::{Capacitor, Resistor};
pub use sources::VoltageSource;

use crate::circuit::{ElementId, NodeId};

/// A circuit element.
#[derive(Debug, Clone)]
pub enum Element {
    Resistor(Resistor),
    Capacitor(Capacitor),
    VoltageSource(VoltageSource),
    Diode(Diode),
    Behavioral(BehavioralSource),
}

impl Element {
    /// Get the element ID.
    pub fn id(&self) -> ElementId {
        match self {
            Element::Resistor(r) => r.id,
            Element::Capacitor(c) => c.id,
            Element::VoltageSource(v) => v.id,
            Element::Diode(d) => d.id,
            Element::Behavioral(b) => b.id,
        }
    }

    /// Get the element name.
    pub fn name(&self) -> &str {
        match self {
            Element::Resistor(r) => &r.name,
            Element::Capacitor(c) => &c.name,
            Element::VoltageSource(v) => &v.name,
            Element::Diode(d) => &d.name,
            Element::Behavioral(b) => &b.name,
        }
    }

    /// Terminal nodes of the element.
    pub fn nodes(&self) -> [NodeId; 2] {
        match self {
            Element::Resistor(r) => r.nodes,
            Element::Capacitor(c) => c.nodes,
            Element::VoltageSource(v) => v.nodes,
            Element::Diode(d) => d.nodes,
            Element::Behavioral(b) => b.nodes,
        }
    }
}
