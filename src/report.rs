//! Human-readable result lines.

use crate::sweep::SweepPoint;

/// `Nominal OP @ VBAT=11.10 V -> VOUT=3.3063 V`
pub fn nominal_line(v_bat: f64, v_out: f64) -> String {
    format!("Nominal OP @ VBAT={v_bat:.2} V -> VOUT={v_out:.4} V")
}

/// `  VBAT=10.5 V -> VOUT=3.3062 V`
pub fn sweep_line(point: &SweepPoint) -> String {
    format!(
        "  VBAT={:>4.1} V -> VOUT={:.4} V",
        point.input_voltage, point.output_voltage
    )
}

/// Current available through the series resistor when the output sits at
/// its target, before the TL431 and the load take their share.
pub fn series_current_estimate(v_bat: f64, v_out_target: f64, series_resistance: f64) -> f64 {
    (v_bat - v_out_target) / series_resistance
}

/// `Info: Series current at 11.1 V ≈ 1.66 mA (available for TL431 + load)`
pub fn series_current_line(v_bat: f64, current: f64) -> String {
    format!(
        "Info: Series current at {v_bat:.1} V ≈ {:.2} mA (available for TL431 + load)",
        current * 1e3
    )
}

/// The complete report: nominal point, sweep table, and current budget.
pub fn render(
    v_bat: f64,
    v_out_nominal: f64,
    points: &[SweepPoint],
    series_current: f64,
) -> String {
    let mut lines = vec![
        nominal_line(v_bat, v_out_nominal),
        String::new(),
        "Line sweep (no load):".to_string(),
    ];
    lines.extend(points.iter().map(sweep_line));
    lines.push(String::new());
    lines.push(series_current_line(v_bat, series_current));
    lines.join("\n")
}
