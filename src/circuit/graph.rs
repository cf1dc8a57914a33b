//! Circuit graph structure.

use std::collections::HashMap;

use super::types::{ElementId, NodeId, SourceHandle};
use crate::components::{
    BehavioralExpr, BehavioralOutput, BehavioralSource, Capacitor, Diode, DiodeModel,
    DiodeParams, Element, Resistor, VoltageSource,
};
use crate::error::{Result, ShuntError};

/// A circuit description ready to be handed to a solver.
///
/// Nodes are created on first use by name. Ground is node 0 and answers to
/// both `"0"` and `"GND"`. Element names carry their SPICE letter
/// (`RFUSE`, `VBAT`, ...) and must be unique ignoring case, since the solver
/// folds names to lower case.
#[derive(Debug, Clone)]
pub struct Circuit {
    /// Title line of the netlist
    pub title: String,

    /// All elements in insertion order
    pub elements: Vec<Element>,

    /// Diode model cards
    pub models: Vec<DiodeModel>,

    /// Mapping from node names to node IDs
    node_map: HashMap<String, NodeId>,

    /// Reverse mapping from node IDs to names
    node_names: Vec<String>,

    /// Node whose voltage is reported as the circuit output
    output_node: Option<NodeId>,
}

impl Circuit {
    /// Create an empty circuit containing only the ground node.
    pub fn new(title: impl Into<String>) -> Self {
        let mut node_map = HashMap::new();
        node_map.insert("0".to_string(), NodeId::GROUND);
        node_map.insert("GND".to_string(), NodeId::GROUND);

        Self {
            title: title.into(),
            elements: Vec::new(),
            models: Vec::new(),
            node_map,
            node_names: vec!["0".to_string()],
            output_node: None,
        }
    }

    /// Get or create the node with the given name.
    pub fn node(&mut self, name: &str) -> NodeId {
        if let Some(&id) = self.node_map.get(name) {
            return id;
        }
        let id = NodeId(self.node_names.len());
        self.node_map.insert(name.to_string(), id);
        self.node_names.push(name.to_string());
        id
    }

    /// Find a node ID by name.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.node_map.get(name).copied()
    }

    /// Get the name of a node.
    pub fn node_name(&self, node: NodeId) -> &str {
        &self.node_names[node.0]
    }

    /// Number of nodes (including ground).
    pub fn num_nodes(&self) -> usize {
        self.node_names.len()
    }

    /// Iterate over all node IDs, ground first.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        (0..self.node_names.len()).map(NodeId)
    }

    /// Mark the node reported as the circuit output.
    pub fn set_output(&mut self, name: &str) -> NodeId {
        let node = self.node(name);
        self.output_node = Some(node);
        node
    }

    /// The node reported as the circuit output, if one was set.
    pub fn output_node(&self) -> Option<NodeId> {
        self.output_node
    }

    /// Look up an element by name (case-insensitive).
    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements
            .iter()
            .find(|e| e.name().eq_ignore_ascii_case(name))
    }

    /// Look up a diode model by name (case-insensitive).
    pub fn model(&self, name: &str) -> Option<&DiodeModel> {
        self.models.iter().find(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// Add a resistor between `n1` and `n2`.
    pub fn resistor(&mut self, name: &str, n1: &str, n2: &str, ohms: f64) -> Result<ElementId> {
        check_positive(name, "resistance", ohms)?;
        let nodes = [self.node(n1), self.node(n2)];
        self.push(name, 'R', |id| {
            Element::Resistor(Resistor::new(id, name.to_string(), nodes, ohms))
        })
    }

    /// Add a capacitor between `n1` and `n2`.
    pub fn capacitor(&mut self, name: &str, n1: &str, n2: &str, farads: f64) -> Result<ElementId> {
        check_positive(name, "capacitance", farads)?;
        let nodes = [self.node(n1), self.node(n2)];
        self.push(name, 'C', |id| {
            Element::Capacitor(Capacitor::new(id, name.to_string(), nodes, farads))
        })
    }

    /// Add a DC voltage source and return a handle for changing its value later.
    pub fn voltage_source(
        &mut self,
        name: &str,
        positive: &str,
        negative: &str,
        volts: f64,
    ) -> Result<SourceHandle> {
        check_finite(name, "voltage", volts)?;
        let nodes = [self.node(positive), self.node(negative)];
        let id = self.push(name, 'V', |id| {
            Element::VoltageSource(VoltageSource::new(id, name.to_string(), nodes, volts))
        })?;
        Ok(SourceHandle(id))
    }

    /// Add a diode using a previously registered model.
    pub fn diode(&mut self, name: &str, anode: &str, cathode: &str, model: &str) -> Result<ElementId> {
        if self.model(model).is_none() {
            return Err(ShuntError::UndefinedModel {
                model: model.to_string(),
                element: name.to_string(),
            });
        }
        let nodes = [self.node(anode), self.node(cathode)];
        self.push(name, 'D', |id| {
            Element::Diode(Diode::new(id, name.to_string(), nodes, model.to_string()))
        })
    }

    /// Register a diode `.model` card.
    pub fn diode_model(&mut self, name: &str, params: DiodeParams) -> Result<()> {
        if self.model(name).is_some() {
            return Err(ShuntError::DuplicateModel {
                name: name.to_string(),
            });
        }
        check_positive(name, "saturation current", params.is)?;
        check_positive(name, "ideality factor", params.n)?;
        self.models.push(DiodeModel::new(name, params));
        Ok(())
    }

    /// Add a behavioral voltage source (`V=` expression) from `positive` to `negative`.
    pub fn behavioral_voltage(
        &mut self,
        name: &str,
        positive: &str,
        negative: &str,
        expr: BehavioralExpr,
    ) -> Result<ElementId> {
        self.behavioral(name, positive, negative, BehavioralOutput::Voltage, expr)
    }

    /// Add a behavioral current source (`I=` expression) pulling current
    /// from `positive` to `negative`.
    pub fn behavioral_current(
        &mut self,
        name: &str,
        positive: &str,
        negative: &str,
        expr: BehavioralExpr,
    ) -> Result<ElementId> {
        self.behavioral(name, positive, negative, BehavioralOutput::Current, expr)
    }

    fn behavioral(
        &mut self,
        name: &str,
        positive: &str,
        negative: &str,
        output: BehavioralOutput,
        expr: BehavioralExpr,
    ) -> Result<ElementId> {
        if expr
            .controlling_nodes()
            .iter()
            .any(|n| n.0 >= self.num_nodes())
        {
            return Err(ShuntError::invalid_element(
                name,
                "expression reads a node that is not part of this circuit",
            ));
        }
        let nodes = [self.node(positive), self.node(negative)];
        self.push(name, 'B', |id| {
            Element::Behavioral(BehavioralSource::new(id, name.to_string(), nodes, output, expr))
        })
    }

    fn push(
        &mut self,
        name: &str,
        prefix: char,
        build: impl FnOnce(ElementId) -> Element,
    ) -> Result<ElementId> {
        let starts_with_prefix = name
            .chars()
            .next()
            .map(|c| c.eq_ignore_ascii_case(&prefix))
            .unwrap_or(false);
        if !starts_with_prefix || name.len() < 2 {
            return Err(ShuntError::invalid_element(
                name,
                format!("name must start with '{prefix}' followed by an identifier"),
            ));
        }
        if self.element(name).is_some() {
            return Err(ShuntError::DuplicateElement {
                name: name.to_string(),
            });
        }
        let id = ElementId(self.elements.len());
        self.elements.push(build(id));
        Ok(id)
    }

    /// Current value of the voltage source behind `handle`.
    pub fn source_value(&self, handle: &SourceHandle) -> Result<f64> {
        match self.elements.get(handle.0 .0) {
            Some(Element::VoltageSource(vs)) => Ok(vs.voltage()),
            _ => Err(ShuntError::UnknownSource { index: handle.0 .0 }),
        }
    }

    /// Change the value of the voltage source behind `handle`.
    pub fn set_source_value(&mut self, handle: &SourceHandle, volts: f64) -> Result<()> {
        match self.elements.get_mut(handle.0 .0) {
            Some(Element::VoltageSource(vs)) => {
                check_finite(&vs.name, "voltage", volts)?;
                vs.set_value(volts);
                Ok(())
            }
            _ => Err(ShuntError::UnknownSource { index: handle.0 .0 }),
        }
    }
}

fn check_positive(name: &str, what: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ShuntError::invalid_element(
            name,
            format!("{what} must be positive and finite (got {value})"),
        ))
    }
}

fn check_finite(name: &str, what: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ShuntError::invalid_element(
            name,
            format!("{what} must be finite (got {value})"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_aliases() {
        let mut c = Circuit::new("aliases");
        assert_eq!(c.node("0"), NodeId::GROUND);
        assert_eq!(c.node("GND"), NodeId::GROUND);
        assert_eq!(c.num_nodes(), 1);

        let vin = c.node("VIN");
        assert_eq!(vin, NodeId(1));
        assert_eq!(c.node("VIN"), vin);
        assert_eq!(c.node_name(vin), "VIN");
    }

    #[test]
    fn test_duplicate_names_rejected_ignoring_case() {
        let mut c = Circuit::new("dup");
        c.resistor("RSER", "VIN", "VOUT", 4700.0).unwrap();
        let err = c.resistor("rser", "VOUT", "GND", 1000.0).unwrap_err();
        assert!(matches!(err, ShuntError::DuplicateElement { .. }));
    }

    #[test]
    fn test_prefix_must_match_element_kind() {
        let mut c = Circuit::new("prefix");
        assert!(c.resistor("FUSE", "VBAT", "VIN", 0.01).is_err());
        assert!(c.capacitor("R1", "VOUT", "GND", 1e-6).is_err());
        assert!(c.resistor("R", "VOUT", "GND", 1.0).is_err());
        assert!(c.resistor("RFUSE", "VBAT", "VIN", 0.01).is_ok());
    }

    #[test]
    fn test_non_positive_values_rejected() {
        let mut c = Circuit::new("values");
        assert!(c.resistor("R1", "A", "B", 0.0).is_err());
        assert!(c.resistor("R2", "A", "B", -5.0).is_err());
        assert!(c.capacitor("C1", "A", "B", f64::NAN).is_err());
        assert!(c.voltage_source("V1", "A", "GND", f64::INFINITY).is_err());
    }

    #[test]
    fn test_diode_requires_model() {
        let mut c = Circuit::new("diodes");
        let err = c.diode("D1", "A", "GND", "DCLIP").unwrap_err();
        assert!(matches!(err, ShuntError::UndefinedModel { .. }));

        c.diode_model("DCLIP", DiodeParams::default()).unwrap();
        assert!(c.diode("D1", "A", "GND", "dclip").is_ok());
        assert!(matches!(
            c.diode_model("DCLIP", DiodeParams::default()),
            Err(ShuntError::DuplicateModel { .. })
        ));
    }

    #[test]
    fn test_source_handle_mutation() {
        let mut c = Circuit::new("source");
        let vbat = c.voltage_source("VBAT", "VBAT", "GND", 11.1).unwrap();
        c.resistor("RLOAD", "VBAT", "GND", 100.0).unwrap();

        assert_eq!(c.source_value(&vbat).unwrap(), 11.1);
        c.set_source_value(&vbat, 12.6).unwrap();
        assert_eq!(c.source_value(&vbat).unwrap(), 12.6);
        assert_eq!(c.elements.len(), 2);
    }

    #[test]
    fn test_handle_to_non_source_rejected() {
        let mut c = Circuit::new("bad handle");
        let r = c.resistor("R1", "A", "GND", 1.0).unwrap();
        let bogus = SourceHandle(r);
        assert!(matches!(
            c.set_source_value(&bogus, 1.0),
            Err(ShuntError::UnknownSource { index: 0 })
        ));
        assert!(c.source_value(&SourceHandle(ElementId(9))).is_err());
    }

    #[test]
    fn test_behavioral_expression_node_must_exist() {
        let mut c = Circuit::new("behavioral");
        let expr = BehavioralExpr::ErrorAmplifier {
            sense: NodeId(7),
            gain: 1000.0,
            setpoint: 2.495,
        };
        assert!(c.behavioral_voltage("BAMP", "GATE", "GND", expr).is_err());

        let reference = c.node("REF");
        let expr = BehavioralExpr::ErrorAmplifier {
            sense: reference,
            gain: 1000.0,
            setpoint: 2.495,
        };
        assert!(c.behavioral_voltage("BAMP", "GATE", "GND", expr).is_ok());
    }

    #[test]
    fn test_output_node() {
        let mut c = Circuit::new("output");
        assert!(c.output_node().is_none());
        let vout = c.set_output("VOUT");
        assert_eq!(c.output_node(), Some(vout));
        assert_eq!(c.find_node("VOUT"), Some(vout));
    }
}
