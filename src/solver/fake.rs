//! In-process stand-in for the external solver, for tests.
//!
//! Solves the regulator built by [`crate::regulator`] by collapsing it to a
//! single KCL equation at VOUT. Capacitors are open at DC, the clamp diodes
//! are treated as ideal clips at their 1 mA forward voltage, and the
//! behavioral equations are evaluated through [`BehavioralExpr::eval`].
//! The residual is monotonic in VOUT, so bisection finds the root.

use std::cell::{Cell, RefCell};

use super::{OperatingPoint, OperatingPointSolver};
use crate::circuit::Circuit;
use crate::components::{BehavioralExpr, DiodeParams, Element};
use crate::error::{Result, ShuntError};
use crate::regulator::{CLAMP_MODEL, SOURCE_NAME};

const CLAMP_CURRENT: f64 = 1e-3;
const BISECTION_STEPS: usize = 200;
const CELSIUS_TO_KELVIN: f64 = 273.15;

/// Boltzmann constant over elementary charge (V/K)
const K_OVER_Q: f64 = 8.617_333_262e-5;

/// Thermal voltage kT/q at the given temperature in °C.
fn thermal_voltage(temperature_c: f64) -> f64 {
    K_OVER_Q * (temperature_c + CELSIUS_TO_KELVIN)
}

/// Forward voltage a junction needs to carry `current` (inverse Shockley).
fn forward_voltage(params: &DiodeParams, current: f64, vt: f64) -> f64 {
    params.n * vt * (current / params.is + 1.0).ln()
}

#[derive(Debug, Default)]
pub(crate) struct RegulatorModelSolver {
    /// Source values at which the solve reports non-convergence
    pub fail_at: Vec<f64>,
    /// Source values seen, in call order
    pub seen: RefCell<Vec<f64>>,
    pub calls: Cell<usize>,
}

impl RegulatorModelSolver {
    pub fn failing_at(values: &[f64]) -> Self {
        Self {
            fail_at: values.to_vec(),
            ..Self::default()
        }
    }
}

fn resistance(circuit: &Circuit, name: &str) -> Result<f64> {
    match circuit.element(name) {
        Some(Element::Resistor(r)) => Ok(r.resistance),
        _ => Err(missing(name)),
    }
}

fn expr(circuit: &Circuit, name: &str) -> Result<BehavioralExpr> {
    match circuit.element(name) {
        Some(Element::Behavioral(b)) => Ok(b.expr),
        _ => Err(missing(name)),
    }
}

fn missing(name: &str) -> ShuntError {
    ShuntError::InvalidTopology {
        message: format!("regulator element {name} not found"),
    }
}

impl OperatingPointSolver for RegulatorModelSolver {
    fn operating_point(&self, circuit: &Circuit) -> Result<OperatingPoint> {
        self.calls.set(self.calls.get() + 1);

        let v_bat = match circuit.element(SOURCE_NAME) {
            Some(Element::VoltageSource(v)) => v.voltage(),
            _ => return Err(missing(SOURCE_NAME)),
        };
        self.seen.borrow_mut().push(v_bat);
        if self.fail_at.contains(&v_bat) {
            return Err(ShuntError::convergence_failure(format!(
                "scripted failure at VBAT={v_bat}"
            )));
        }

        let r_fuse = resistance(circuit, "RFUSE")?;
        let r_ser = resistance(circuit, "RSER")?;
        let r_top = resistance(circuit, "RPOTTOP")?;
        let r_bot = resistance(circuit, "RPOTBOT")?;
        let r_ref_in = resistance(circuit, "RREF_IN")?;
        let amp = expr(circuit, "BERRAMP")?;
        let sink = expr(circuit, "BTL431_SINK")?;
        let diode: DiodeParams = circuit
            .model(CLAMP_MODEL)
            .map(|m| m.params)
            .ok_or_else(|| missing(CLAMP_MODEL))?;

        let vt = thermal_voltage(25.0);
        let v_clip = forward_voltage(&diode, CLAMP_CURRENT, vt);
        let r_lower = r_bot * r_ref_in / (r_bot + r_ref_in);
        let r_divider = r_top + r_lower;
        let r_series = r_fuse + r_ser;

        let state = |v_out: f64| {
            let v_ref = v_out * r_lower / r_divider;
            let gate = amp.eval(|_| v_ref);
            let gate_lim = gate.clamp(-v_clip, v_out + v_clip);
            let i_sink = sink.eval(|_| gate_lim);
            (v_ref, gate, gate_lim, i_sink)
        };
        let residual = |v_out: f64| {
            let (_, _, _, i_sink) = state(v_out);
            (v_bat - v_out) / r_series - v_out / r_divider - i_sink
        };

        let (mut lo, mut hi) = (0.0_f64.min(v_bat), v_bat.max(0.0));
        for _ in 0..BISECTION_STEPS {
            let mid = 0.5 * (lo + hi);
            if residual(mid) > 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let v_out = 0.5 * (lo + hi);
        let (v_ref, gate, gate_lim, _) = state(v_out);
        let i_in = (v_bat - v_out) / r_series;

        // Spelled the way ngspice writes its rawfile
        let mut op = OperatingPoint::new();
        op.insert("v(vbat)", v_bat);
        op.insert("v(vin)", v_bat - i_in * r_fuse);
        op.insert("v(vout)", v_out);
        op.insert("v(ref)", v_ref);
        op.insert("v(gate)", gate);
        op.insert("v(gate_lim)", gate_lim);
        op.insert("vbat#branch", -i_in);
        Ok(op)
    }
}

mod tests {
    use super::*;

    #[test]
    fn test_thermal_voltage_room_temperature() {
        assert!((thermal_voltage(25.0) - 0.025693).abs() < 1e-5);
        assert!(thermal_voltage(85.0) > thermal_voltage(25.0));
    }

    #[test]
    fn test_clamp_forward_voltage() {
        let params = DiodeParams::default();
        let vt = thermal_voltage(25.0);

        // Is = 10 fA silicon junction sits around 0.65 V at 1 mA
        let v = forward_voltage(&params, CLAMP_CURRENT, vt);
        assert!(v > 0.6 && v < 0.7);

        let v_n2 = forward_voltage(&DiodeParams { is: 1e-14, n: 2.0 }, CLAMP_CURRENT, vt);
        assert!((v_n2 - 2.0 * v).abs() < 1e-12);
    }
}
