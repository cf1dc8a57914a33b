//! TL431 3.3 V shunt regulator topology.
//!
//! ```text
//!  VBAT --RFUSE-- VIN --RSER(4.7k)-- VOUT ---+---------+----------+
//!   |                                  |     |         |          |
//!  VBAT                             COUT  RPOTTOP    CCOMP    BTL431_SINK
//!   |                              680u     |         |       (I to GND)
//!  GND                                |     REF ------+          |
//!                                    GND    |                   GND
//!                                         RPOTBOT || RREF_IN
//!                                           |
//!                                          GND
//!
//!  BERRAMP: V(GATE) = gain * (V(REF) - Vref)
//!  GATE --RGATE_LIM-- GATE_LIM, clamped by DGATE_CLIP_LO (GND->GATE_LIM)
//!                     and DGATE_CLIP_HI (GATE_LIM->VOUT)
//!  BTL431_SINK: I(VOUT->GND) = clamp(gm * V(GATE_LIM), 0, I_max)
//! ```
//!
//! The behavioral constants approximate a TL431A; they are not taken from a
//! datasheet macromodel and live in [`RegulatorConfig`] so they can be tuned.

use tracing::debug;

use crate::circuit::{validate_circuit, Circuit, SourceHandle};
use crate::components::{BehavioralExpr, DiodeParams};
use crate::divider::{solve_divider, DividerSplit};
use crate::error::Result;
use crate::{TARGET_VOUT, TL431_VREF};

/// Battery terminal
pub const NODE_VBAT: &str = "VBAT";
/// Fuse output, top of the series resistor
pub const NODE_VIN: &str = "VIN";
/// Regulated output (TL431 cathode)
pub const NODE_VOUT: &str = "VOUT";
/// TL431 reference input, potentiometer wiper
pub const NODE_REF: &str = "REF";
/// Error amplifier output
pub const NODE_GATE: &str = "GATE";
/// Clamped drive of the current sink
pub const NODE_GATE_LIM: &str = "GATE_LIM";
/// Ground (TL431 anode)
pub const NODE_GND: &str = "GND";

/// Name of the battery source element
pub const SOURCE_NAME: &str = "VBAT";
/// Name of the clamp diode model card
pub const CLAMP_MODEL: &str = "DCLIP";

/// Component values and behavioral constants of the regulator.
#[derive(Debug, Clone, PartialEq)]
pub struct RegulatorConfig {
    /// Output the potentiometer is trimmed for (V)
    pub v_out_target: f64,
    /// TL431 reference voltage (V)
    pub v_ref: f64,
    /// Potentiometer end-to-end resistance (Ω)
    pub pot_total: f64,
    /// Series resistor from VIN to VOUT (Ω)
    pub series_resistance: f64,
    /// Output bulk capacitor (F)
    pub output_capacitance: f64,
    /// VOUT to REF compensation capacitor (F)
    pub compensation_capacitance: f64,
    /// REF input resistance to ground (Ω)
    pub ref_input_resistance: f64,
    /// Error amplifier gain (V/V)
    pub amp_gain: f64,
    /// Resistor between GATE and the clamp node (Ω)
    pub gate_resistance: f64,
    /// Clamp diode junction parameters
    pub clamp_diode: DiodeParams,
    /// Sink transconductance (A/V)
    pub sink_gm: f64,
    /// Sink saturation current (A)
    pub sink_max_current: f64,
}

impl Default for RegulatorConfig {
    fn default() -> Self {
        Self {
            v_out_target: TARGET_VOUT,
            v_ref: TL431_VREF,
            pot_total: 10_000.0,
            series_resistance: 4_700.0,
            output_capacitance: 680e-6,
            compensation_capacitance: 22e-9,
            ref_input_resistance: 1e6,
            amp_gain: 1000.0,
            gate_resistance: 1.0,
            clamp_diode: DiodeParams { is: 1e-14, n: 1.0 },
            sink_gm: 0.01,
            sink_max_current: 0.1,
        }
    }
}

impl RegulatorConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output voltage the divider is trimmed for.
    pub fn with_target(mut self, v_out_target: f64) -> Self {
        self.v_out_target = v_out_target;
        self
    }

    /// Set the reference voltage of the regulating device.
    pub fn with_reference(mut self, v_ref: f64) -> Self {
        self.v_ref = v_ref;
        self
    }

    /// Set the series resistor feeding the output.
    pub fn with_series_resistance(mut self, ohms: f64) -> Self {
        self.series_resistance = ohms;
        self
    }

    /// Set the error amplifier gain.
    pub fn with_amp_gain(mut self, gain: f64) -> Self {
        self.amp_gain = gain;
        self
    }

    /// Set the sink transconductance and saturation current.
    pub fn with_sink(mut self, gm: f64, max_current: f64) -> Self {
        self.sink_gm = gm;
        self.sink_max_current = max_current;
        self
    }

    /// Potentiometer split for this configuration.
    pub fn divider(&self) -> Result<DividerSplit> {
        solve_divider(self.v_out_target, self.pot_total, self.v_ref)
    }
}

/// Build the regulator with default component values.
///
/// Returns the circuit and a handle to the battery source so the sweep can
/// change its value without rebuilding the topology.
pub fn build_circuit(v_bat: f64, fuse_resistance: f64) -> Result<(Circuit, SourceHandle)> {
    build_circuit_with(&RegulatorConfig::default(), v_bat, fuse_resistance)
}

/// Build the regulator with the given component values.
pub fn build_circuit_with(
    config: &RegulatorConfig,
    v_bat: f64,
    fuse_resistance: f64,
) -> Result<(Circuit, SourceHandle)> {
    let split = config.divider()?;
    debug!(
        r_top = split.r_top,
        r_bot = split.r_bot,
        v_out_target = config.v_out_target,
        "potentiometer split"
    );

    let mut circuit = Circuit::new(format!("TL431 {}V Shunt", config.v_out_target));

    let vbat = circuit.voltage_source(SOURCE_NAME, NODE_VBAT, NODE_GND, v_bat)?;
    circuit.resistor("RFUSE", NODE_VBAT, NODE_VIN, fuse_resistance)?;
    circuit.resistor("RSER", NODE_VIN, NODE_VOUT, config.series_resistance)?;
    circuit.capacitor("COUT", NODE_VOUT, NODE_GND, config.output_capacitance)?;

    circuit.resistor("RPOTTOP", NODE_VOUT, NODE_REF, split.r_top)?;
    circuit.resistor("RPOTBOT", NODE_REF, NODE_GND, split.r_bot)?;
    circuit.capacitor("CCOMP", NODE_VOUT, NODE_REF, config.compensation_capacitance)?;

    // TL431 macromodel: error amp -> clamped drive -> current sink
    let reference = circuit.node(NODE_REF);
    circuit.behavioral_voltage(
        "BERRAMP",
        NODE_GATE,
        NODE_GND,
        BehavioralExpr::ErrorAmplifier {
            sense: reference,
            gain: config.amp_gain,
            setpoint: config.v_ref,
        },
    )?;

    circuit.resistor("RGATE_LIM", NODE_GATE, NODE_GATE_LIM, config.gate_resistance)?;
    circuit.diode_model(CLAMP_MODEL, config.clamp_diode)?;
    circuit.diode("DGATE_CLIP_LO", NODE_GND, NODE_GATE_LIM, CLAMP_MODEL)?;
    circuit.diode("DGATE_CLIP_HI", NODE_GATE_LIM, NODE_VOUT, CLAMP_MODEL)?;

    let gate_lim = circuit.node(NODE_GATE_LIM);
    circuit.behavioral_current(
        "BTL431_SINK",
        NODE_VOUT,
        NODE_GND,
        BehavioralExpr::LimitedTransconductance {
            control: gate_lim,
            gm: config.sink_gm,
            min: 0.0,
            max: config.sink_max_current,
        },
    )?;

    circuit.resistor("RREF_IN", NODE_REF, NODE_GND, config.ref_input_resistance)?;

    circuit.set_output(NODE_VOUT);
    validate_circuit(&circuit)?;

    Ok((circuit, vbat))
}
