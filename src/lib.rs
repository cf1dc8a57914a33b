//! # TL431 Shunt
//!
//! Operating-point and line-sweep simulation of a TL431 shunt regulator,
//! driven through an external SPICE solver.
//!
//! This library provides:
//! - A closed-form solver for the potentiometer split that sets the output
//! - A typed circuit description with behavioral TL431 macromodel
//! - An ngspice binding that solves DC operating points out of process
//! - Nominal and line-sweep orchestration with an explicit failure policy
//!
//! ## Architecture
//!
//! - [`divider`] - Feedback divider solver
//! - [`circuit`] - Circuit description, validation, and netlist rendering
//! - [`components`] - Element models (R, C, V, D, behavioral sources)
//! - [`regulator`] - Assembly of the 3.3 V shunt regulator topology
//! - [`solver`] - The operating-point solver boundary and its ngspice backend
//! - [`sweep`] - Nominal operating point and line sweep
//! - [`report`] - Human-readable result lines
//!
//! ## Usage
//!
//! ```no_run
//! use tl431_shunt::{regulator, solver::NgspiceSolver, sweep, LineSweepRange};
//!
//! # fn main() -> tl431_shunt::Result<()> {
//! let (mut circuit, vbat) = regulator::build_circuit(11.1, 0.01)?;
//! let solver = NgspiceSolver::default();
//!
//! let v_out = sweep::run_nominal_operating_point(&solver, &circuit)?;
//! let points = sweep::run_line_sweep(&solver, &mut circuit, &vbat, &LineSweepRange::default().values())?;
//! # let _ = (v_out, points);
//! # Ok(())
//! # }
//! ```
//!
//! ## Regulation
//!
//! The TL431 keeps its REF pin at 2.495 V by sinking current from its
//! cathode. A potentiometer from the output to ground with its wiper on REF
//! therefore fixes the output at `Vref * (1 + R_top / R_bot)`.

pub mod circuit;
pub mod components;
pub mod divider;
pub mod error;
pub mod regulator;
pub mod report;
pub mod solver;
pub mod sweep;

// Re-export main types for convenience
pub use circuit::{Circuit, SourceHandle};
pub use divider::{solve_divider, DividerSplit};
pub use error::{Result, ShuntError};
pub use regulator::RegulatorConfig;
pub use solver::{OperatingPoint, OperatingPointSolver};
pub use sweep::{LineSweepRange, SweepPoint, SweepPolicy};

/// TL431A internal reference voltage in volts
pub const TL431_VREF: f64 = 2.495;

/// Regulated output the feedback divider is sized for, in volts
pub const TARGET_VOUT: f64 = 3.3;

/// Nominal 3S LiPo battery voltage
pub const NOMINAL_VBAT: f64 = 11.1;

/// Series resistance standing in for the 3 A fuse
pub const DEFAULT_FUSE_RESISTANCE: f64 = 0.01;
