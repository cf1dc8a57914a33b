//! Circuit validation.

use crate::components::Element;
use crate::error::{Result, ShuntError};

use super::Circuit;

/// Validate a circuit before handing it to a solver.
///
/// Checks:
/// - An output node is designated and it is not ground
/// - At least one independent voltage source drives the circuit
/// - Every non-ground node is reached by at least two element terminals
/// - Every diode references a registered model
pub fn validate_circuit(circuit: &Circuit) -> Result<()> {
    let output = circuit.output_node().ok_or_else(|| ShuntError::InvalidTopology {
        message: "No output node designated".to_string(),
    })?;

    if output.is_ground() {
        return Err(ShuntError::InvalidTopology {
            message: "Output node cannot be ground".to_string(),
        });
    }

    if !circuit
        .elements
        .iter()
        .any(|e| matches!(e, Element::VoltageSource(_)))
    {
        return Err(ShuntError::InvalidTopology {
            message: "Circuit has no voltage source".to_string(),
        });
    }

    let mut terminals = vec![0usize; circuit.num_nodes()];
    for element in &circuit.elements {
        for node in element.nodes() {
            terminals[node.0] += 1;
        }
    }

    for node in circuit.nodes().filter(|n| !n.is_ground()) {
        if terminals[node.0] < 2 {
            return Err(ShuntError::InvalidTopology {
                message: format!(
                    "Node '{}' is connected to {} element terminal(s); it needs at least two",
                    circuit.node_name(node),
                    terminals[node.0]
                ),
            });
        }
    }

    for element in &circuit.elements {
        if let Element::Diode(d) = element {
            if circuit.model(&d.model).is_none() {
                return Err(ShuntError::UndefinedModel {
                    model: d.model.clone(),
                    element: d.name.clone(),
                });
            }
        }
    }

    Ok(())
}
