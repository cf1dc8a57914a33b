//! Feedback divider solver.
//!
//! A TL431 regulates its cathode so that the REF pin sits at `Vref`. With a
//! potentiometer of total resistance `R` between the output and ground and
//! its wiper on REF, the regulated output is
//!
//! ```text
//! Vout = Vref * (1 + R_top / R_bot),    R_top + R_bot = R
//! ```
//!
//! Solving for the split gives `R_top = R * k / (1 + k)` with
//! `k = Vout / Vref - 1`.

use crate::error::{Result, ShuntError};

/// The two halves of a potentiometer-equivalent feedback network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DividerSplit {
    /// Resistance from the output to the feedback node (ohms)
    pub r_top: f64,
    /// Resistance from the feedback node to ground (ohms)
    pub r_bot: f64,
}

impl DividerSplit {
    /// Total resistance of the network.
    pub fn total(&self) -> f64 {
        self.r_top + self.r_bot
    }

    /// Output voltage at which the feedback node reaches `v_ref`.
    pub fn output_voltage(&self, v_ref: f64) -> f64 {
        v_ref * (1.0 + self.r_top / self.r_bot)
    }

    /// Voltage at the feedback node for a given output voltage (unloaded).
    pub fn feedback_voltage(&self, v_out: f64) -> f64 {
        v_out * self.r_bot / self.total()
    }
}

/// Split `r_total` so that the feedback node reaches `v_ref` when the output
/// reaches `v_out_target`.
///
/// Fails with [`ShuntError::InvalidTarget`] when the target is not positive
/// or does not exceed the reference (no positive split exists), and when the
/// total or reference resistance/voltage is not a positive finite number.
pub fn solve_divider(v_out_target: f64, r_total: f64, v_ref: f64) -> Result<DividerSplit> {
    if !(v_out_target.is_finite() && r_total.is_finite() && v_ref.is_finite()) {
        return Err(ShuntError::invalid_target(
            v_out_target,
            v_ref,
            "inputs must be finite",
        ));
    }
    if v_out_target <= 0.0 {
        return Err(ShuntError::invalid_target(
            v_out_target,
            v_ref,
            "target output voltage must be positive",
        ));
    }
    if v_ref <= 0.0 {
        return Err(ShuntError::invalid_target(
            v_out_target,
            v_ref,
            "reference voltage must be positive",
        ));
    }
    if r_total <= 0.0 {
        return Err(ShuntError::invalid_target(
            v_out_target,
            v_ref,
            format!("total resistance must be positive (got {r_total} ohm)"),
        ));
    }

    let ratio = v_out_target / v_ref - 1.0;
    if ratio <= 0.0 {
        return Err(ShuntError::invalid_target(
            v_out_target,
            v_ref,
            "target output voltage must exceed the reference voltage",
        ));
    }

    let r_top = r_total * (ratio / (1.0 + ratio));
    let r_bot = r_total - r_top;

    Ok(DividerSplit { r_top, r_bot })
}
