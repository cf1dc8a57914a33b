//! Behavioral sources (B elements).
//!
//! Instead of free-form expression text, each behavioral source carries a
//! [`BehavioralExpr`] variant. The variant has a closed-form [`eval`] and is
//! rendered to solver syntax by the netlist writer.
//!
//! [`eval`]: BehavioralExpr::eval

use crate::circuit::{ElementId, NodeId};

/// What a behavioral source drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehavioralOutput {
    /// `V=` source: forces the voltage between its nodes
    Voltage,
    /// `I=` source: drives current from its positive to its negative node
    Current,
}

/// Closed-form equation of a behavioral source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BehavioralExpr {
    /// `gain * (V(sense) - setpoint)`
    ErrorAmplifier {
        sense: NodeId,
        gain: f64,
        setpoint: f64,
    },
    /// `clamp(gm * V(control), min, max)`
    LimitedTransconductance {
        control: NodeId,
        gm: f64,
        min: f64,
        max: f64,
    },
}

impl BehavioralExpr {
    /// Evaluate the expression given a lookup of node voltages.
    pub fn eval(&self, voltage: impl Fn(NodeId) -> f64) -> f64 {
        match *self {
            BehavioralExpr::ErrorAmplifier {
                sense,
                gain,
                setpoint,
            } => gain * (voltage(sense) - setpoint),
            BehavioralExpr::LimitedTransconductance {
                control,
                gm,
                min,
                max,
            } => (gm * voltage(control)).clamp(min, max),
        }
    }

    /// Nodes whose voltages the expression reads.
    pub fn controlling_nodes(&self) -> [NodeId; 1] {
        match *self {
            BehavioralExpr::ErrorAmplifier { sense, .. } => [sense],
            BehavioralExpr::LimitedTransconductance { control, .. } => [control],
        }
    }
}

/// A behavioral source component.
#[derive(Debug, Clone)]
pub struct BehavioralSource {
    pub id: ElementId,
    pub name: String,
    pub nodes: [NodeId; 2], // [positive, negative]
    pub output: BehavioralOutput,
    pub expr: BehavioralExpr,
}

impl BehavioralSource {
    /// Create a new behavioral source.
    pub fn new(
        id: ElementId,
        name: String,
        nodes: [NodeId; 2],
        output: BehavioralOutput,
        expr: BehavioralExpr,
    ) -> Self {
        Self {
            id,
            name,
            nodes,
            output,
            expr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_amplifier() {
        let amp = BehavioralExpr::ErrorAmplifier {
            sense: NodeId(1),
            gain: 1000.0,
            setpoint: 2.495,
        };
        assert!((amp.eval(|_| 2.496) - 1.0).abs() < 1e-9);
        assert!((amp.eval(|_| 2.494) + 1.0).abs() < 1e-9);
        assert_eq!(amp.controlling_nodes(), [NodeId(1)]);
    }

    #[test]
    fn test_limited_transconductance_saturates() {
        let sink = BehavioralExpr::LimitedTransconductance {
            control: NodeId(2),
            gm: 0.01,
            min: 0.0,
            max: 0.1,
        };
        assert_eq!(sink.eval(|_| -1.0), 0.0);
        assert!((sink.eval(|_| 0.5) - 0.005).abs() < 1e-12);
        assert_eq!(sink.eval(|_| 50.0), 0.1);
    }
}
