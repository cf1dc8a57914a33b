//! Nominal operating point and line sweep.
//!
//! A line sweep mutates one voltage source through its [`SourceHandle`] and
//! re-solves the operating point once per value, strictly in input order.
//! Nothing is retained between solves except the source value.

use tracing::{debug, info, warn};

use crate::circuit::{Circuit, SourceHandle};
use crate::error::{Result, ShuntError};
use crate::solver::OperatingPointSolver;

/// One solved point of a line sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPoint {
    /// Source value the point was solved at (V)
    pub input_voltage: f64,
    /// Voltage at the circuit's output node (V)
    pub output_voltage: f64,
}

/// What a sweep does when a single solve fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepPolicy {
    /// Stop at the first failure and return its error
    #[default]
    AbortOnError,
    /// Record the failure and move on to the next value
    ContinueOnError,
}

/// A sweep input value whose solve failed.
#[derive(Debug)]
pub struct SweepFailure {
    pub input_voltage: f64,
    pub error: ShuntError,
}

/// Result of a sweep run under [`SweepPolicy::ContinueOnError`].
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Solved points, in input order
    pub points: Vec<SweepPoint>,
    /// Failed inputs, in input order
    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    /// Whether every input was solved.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Inclusive range of sweep values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSweepRange {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

/// Sweep values are snapped to multiples of 1 / VALUE_GRID volts
const VALUE_GRID: f64 = 1e9;

impl Default for LineSweepRange {
    /// Near-empty to full 3S LiPo: 10.5 V to 12.6 V in 0.3 V steps.
    fn default() -> Self {
        Self {
            start: 10.5,
            stop: 12.6,
            step: 0.3,
        }
    }
}

impl LineSweepRange {
    /// Create a new range.
    pub fn new(start: f64, stop: f64, step: f64) -> Self {
        Self { start, stop, step }
    }

    /// Values from `start` to `stop` inclusive, snapped to a nanovolt grid
    /// so accumulated float error does not leak into the input values.
    ///
    /// An empty list is returned for a non-positive step or a stop below start.
    pub fn values(&self) -> Vec<f64> {
        let valid = self.step.is_finite() && self.step > 0.0 && self.stop >= self.start;
        if !valid {
            return Vec::new();
        }
        // Absorb float error so 2.1 / 0.3 still counts 7 steps
        let steps = ((self.stop - self.start) / self.step + 1e-9).floor() as usize;
        (0..=steps)
            .map(|i| ((self.start + self.step * i as f64) * VALUE_GRID).round() / VALUE_GRID)
            .collect()
    }
}

/// Solve the operating point at the circuit's current source values and
/// return the voltage at its output node.
pub fn run_nominal_operating_point<S>(solver: &S, circuit: &Circuit) -> Result<f64>
where
    S: OperatingPointSolver + ?Sized,
{
    let output = circuit
        .output_node()
        .ok_or_else(|| ShuntError::InvalidTopology {
            message: "No output node designated".to_string(),
        })?;
    let name = circuit.node_name(output);

    let op = solver.operating_point(circuit)?;
    let v_out = op.require_voltage(name)?;
    debug!(node = name, v_out, "operating point");
    Ok(v_out)
}

/// Sweep `source` over `inputs`, one operating point per value.
///
/// Returns exactly one point per input in input order. The first failed
/// solve aborts the sweep and is returned as the error. The source keeps
/// the last value it was set to.
pub fn run_line_sweep<S>(
    solver: &S,
    circuit: &mut Circuit,
    source: &SourceHandle,
    inputs: &[f64],
) -> Result<Vec<SweepPoint>>
where
    S: OperatingPointSolver + ?Sized,
{
    let report = run_line_sweep_with_policy(solver, circuit, source, inputs, SweepPolicy::AbortOnError)?;
    Ok(report.points)
}

/// Sweep `source` over `inputs` with an explicit failure policy.
///
/// Under [`SweepPolicy::AbortOnError`] the first failure is returned as the
/// error. Under [`SweepPolicy::ContinueOnError`] solver failures are recorded
/// in the report and the sweep continues; errors that are not solver errors
/// (a bad handle, a non-finite input) still abort.
pub fn run_line_sweep_with_policy<S>(
    solver: &S,
    circuit: &mut Circuit,
    source: &SourceHandle,
    inputs: &[f64],
    policy: SweepPolicy,
) -> Result<SweepReport>
where
    S: OperatingPointSolver + ?Sized,
{
    info!(points = inputs.len(), ?policy, "line sweep");
    let mut report = SweepReport {
        points: Vec::with_capacity(inputs.len()),
        failures: Vec::new(),
    };

    for &v in inputs {
        circuit.set_source_value(source, v)?;

        match run_nominal_operating_point(solver, circuit) {
            Ok(v_out) => {
                debug!(v_in = v, v_out, "sweep point");
                report.points.push(SweepPoint {
                    input_voltage: v,
                    output_voltage: v_out,
                });
            }
            Err(error) if policy == SweepPolicy::ContinueOnError && error.is_solver_error() => {
                warn!(v_in = v, %error, "sweep point failed");
                report.failures.push(SweepFailure {
                    input_voltage: v,
                    error,
                });
            }
            Err(error) => return Err(error),
        }
    }

    info!(
        solved = report.points.len(),
        failed = report.failures.len(),
        "line sweep finished"
    );
    Ok(report)
}
