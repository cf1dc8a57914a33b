//! Circuit description, validation, and netlist rendering.
//!
//! The [`Circuit`] struct holds all elements, nodes, and model cards of a
//! topology in a form that can be validated and rendered to a SPICE netlist
//! for the external solver.

mod graph;
mod spice;
mod types;
mod validate;

pub use graph::Circuit;
pub use spice::{spice_number, to_netlist, AnalysisOptions};
pub use types::*;
pub use validate::validate_circuit;
