//! SPICE netlist rendering.
//!
//! The netlist is the binding layer between the typed circuit description
//! and the external solver. Behavioral equations are rendered from their
//! [`BehavioralExpr`] variants here and nowhere else.

use std::fmt::Write;

use super::Circuit;
use crate::components::{BehavioralExpr, BehavioralOutput, Element};

/// Analysis settings written into the netlist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
    /// Circuit temperature in °C (`temp`)
    pub temperature: f64,
    /// Temperature at which model parameters were measured in °C (`tnom`)
    pub nominal_temperature: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            temperature: 25.0,
            nominal_temperature: 25.0,
        }
    }
}

/// Format a value the way SPICE reads it back without loss.
pub fn spice_number(value: f64) -> String {
    format!("{value:e}")
}

/// Render `circuit` as a DC operating-point deck.
pub fn to_netlist(circuit: &Circuit, options: &AnalysisOptions) -> String {
    let mut out = String::new();
    let node = |id| spice_node(circuit, id);

    // First line of a deck is always the title
    let _ = writeln!(out, "{}", circuit.title);
    let _ = writeln!(
        out,
        ".options temp={} tnom={}",
        spice_number(options.temperature),
        spice_number(options.nominal_temperature)
    );

    for element in &circuit.elements {
        let [n1, n2] = element.nodes();
        let _ = match element {
            Element::Resistor(r) => writeln!(
                out,
                "{} {} {} {}",
                r.name,
                node(n1),
                node(n2),
                spice_number(r.resistance)
            ),
            Element::Capacitor(c) => writeln!(
                out,
                "{} {} {} {}",
                c.name,
                node(n1),
                node(n2),
                spice_number(c.capacitance)
            ),
            Element::VoltageSource(v) => writeln!(
                out,
                "{} {} {} DC {}",
                v.name,
                node(n1),
                node(n2),
                spice_number(v.dc_value)
            ),
            Element::Diode(d) => writeln!(out, "{} {} {} {}", d.name, node(n1), node(n2), d.model),
            Element::Behavioral(b) => {
                let kind = match b.output {
                    BehavioralOutput::Voltage => 'V',
                    BehavioralOutput::Current => 'I',
                };
                writeln!(
                    out,
                    "{} {} {} {}={}",
                    b.name,
                    node(n1),
                    node(n2),
                    kind,
                    render_expr(circuit, &b.expr)
                )
            }
        };
    }

    for model in &circuit.models {
        let _ = writeln!(
            out,
            ".model {} D(Is={} N={})",
            model.name,
            spice_number(model.params.is),
            spice_number(model.params.n)
        );
    }

    out.push_str(".op\n.end\n");
    out
}

fn spice_node(circuit: &Circuit, id: super::NodeId) -> &str {
    if id.is_ground() {
        "0"
    } else {
        circuit.node_name(id)
    }
}

fn render_expr(circuit: &Circuit, expr: &BehavioralExpr) -> String {
    match *expr {
        BehavioralExpr::ErrorAmplifier {
            sense,
            gain,
            setpoint,
        } => format!(
            "{}*(V({})-({}))",
            spice_number(gain),
            spice_node(circuit, sense),
            spice_number(setpoint)
        ),
        // min/max is understood by every ngspice B-source parser, unlike LIMIT()
        BehavioralExpr::LimitedTransconductance {
            control,
            gm,
            min,
            max,
        } => format!(
            "min(max({}*V({}), {}), {})",
            spice_number(gm),
            spice_node(circuit, control),
            spice_number(min),
            spice_number(max)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::DiodeParams;

    #[test]
    fn test_spice_number_round_trips() {
        for &v in &[0.01, 4700.0, 680e-6, 22e-9, 1e-14, 2439.3939393939395, -2.495] {
            let text = spice_number(v);
            assert_eq!(text.parse::<f64>().unwrap(), v);
        }
    }

    #[test]
    fn test_netlist_layout() {
        let mut c = Circuit::new("Divider");
        c.voltage_source("VBAT", "VBAT", "GND", 11.1).unwrap();
        c.resistor("RTOP", "VBAT", "OUT", 4700.0).unwrap();
        c.capacitor("COUT", "OUT", "0", 680e-6).unwrap();
        c.set_output("OUT");

        let deck = to_netlist(&c, &AnalysisOptions::default());
        let lines: Vec<&str> = deck.lines().collect();

        assert_eq!(lines[0], "Divider");
        assert_eq!(lines[1], ".options temp=2.5e1 tnom=2.5e1");
        assert_eq!(lines[2], "VBAT VBAT 0 DC 1.11e1");
        assert_eq!(lines[3], "RTOP VBAT OUT 4.7e3");
        assert_eq!(lines[4], "COUT OUT 0 6.8e-4");
        assert_eq!(lines[lines.len() - 2], ".op");
        assert_eq!(lines[lines.len() - 1], ".end");
    }

    #[test]
    fn test_behavioral_and_model_cards() {
        let mut c = Circuit::new("Behavioral");
        let reference = c.node("REF");
        let gate_lim = c.node("GATE_LIM");
        c.behavioral_voltage(
            "BERRAMP",
            "GATE",
            "GND",
            BehavioralExpr::ErrorAmplifier {
                sense: reference,
                gain: 1000.0,
                setpoint: 2.495,
            },
        )
        .unwrap();
        c.behavioral_current(
            "BSINK",
            "VOUT",
            "GND",
            BehavioralExpr::LimitedTransconductance {
                control: gate_lim,
                gm: 0.01,
                min: 0.0,
                max: 0.1,
            },
        )
        .unwrap();
        c.diode_model("DCLIP", DiodeParams { is: 1e-14, n: 1.0 })
            .unwrap();
        c.diode("DHI", "GATE_LIM", "VOUT", "DCLIP").unwrap();

        let deck = to_netlist(&c, &AnalysisOptions::default());
        assert!(deck.contains("BERRAMP GATE 0 V=1e3*(V(REF)-(2.495e0))\n"));
        assert!(deck.contains("BSINK VOUT 0 I=min(max(1e-2*V(GATE_LIM), 0e0), 1e-1)\n"));
        assert!(deck.contains("DHI GATE_LIM VOUT DCLIP\n"));
        assert!(deck.contains(".model DCLIP D(Is=1e-14 N=1e0)\n"));
    }
}
