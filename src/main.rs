//! TL431 Shunt - 3.3 V shunt regulator operating point and line sweep
//!
//! Builds the regulator at the nominal battery voltage, solves its operating
//! point with ngspice, sweeps the battery from 10.5 V to 12.6 V, and prints
//! the results.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=tl431_shunt=debug tl431-shunt --ngspice /usr/local/bin/ngspice
//! ```

use clap::Parser;
use tl431_shunt::{
    error::Result,
    regulator::{self, RegulatorConfig},
    report,
    solver::{NgspiceSolver, SolverConfig},
    sweep, LineSweepRange, DEFAULT_FUSE_RESISTANCE, NOMINAL_VBAT,
};
use tracing::debug;

/// TL431 shunt regulator simulation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// ngspice executable used to solve operating points
    #[arg(long, value_name = "PATH", default_value = "ngspice")]
    ngspice: String,

    /// Seconds a single operating-point solve may take
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let solver = NgspiceSolver::new(
        SolverConfig::new()
            .with_executable(args.ngspice)
            .with_timeout_secs(args.timeout_secs),
    );
    if let Ok(version) = solver.version() {
        debug!(%version, "solver");
    }

    // Build the circuit at nominal battery voltage
    let config = RegulatorConfig::default();
    let (mut circuit, vbat) =
        regulator::build_circuit_with(&config, NOMINAL_VBAT, DEFAULT_FUSE_RESISTANCE)?;

    let v_out_nominal = sweep::run_nominal_operating_point(&solver, &circuit)?;

    // No-load line sweep across the 3S LiPo range
    let inputs = LineSweepRange::default().values();
    let points = sweep::run_line_sweep(&solver, &mut circuit, &vbat, &inputs)?;

    // Closed-form budget, not a solver result
    let series_current = report::series_current_estimate(
        NOMINAL_VBAT,
        config.v_out_target,
        config.series_resistance,
    );

    println!(
        "{}",
        report::render(NOMINAL_VBAT, v_out_nominal, &points, series_current)
    );

    Ok(())
}
