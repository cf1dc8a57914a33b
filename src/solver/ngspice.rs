//! ngspice process backend.
//!
//! Each solve renders the circuit to a netlist, runs
//! `ngspice -b -o <log> -r <raw> <netlist>` and reads the operating point
//! back from the rawfile. The child process and its temporary files belong
//! to an [`NgspiceSession`] and are released when the session drops, on
//! success and on every error path.

use std::io::Write;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::NamedTempFile;
use tracing::{debug, trace};

use super::rawfile::parse_rawfile;
use super::{OperatingPoint, OperatingPointSolver};
use crate::circuit::{to_netlist, AnalysisOptions, Circuit};
use crate::error::{Result, ShuntError};

/// Log lines ngspice prints when an operating point cannot be found.
const CONVERGENCE_MARKERS: &[&str] = &[
    "no convergence",
    "iteration limit reached",
    "simulation(s) aborted",
    "singular matrix",
    "timestep too small",
];

/// Configuration for the ngspice backend.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Path to the ngspice executable (default: "ngspice" in PATH).
    pub executable: String,
    /// Timeout for a single solve in seconds.
    pub timeout_secs: u64,
    /// Temperature settings written into every netlist.
    pub analysis: AnalysisOptions,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            executable: "ngspice".to_string(),
            timeout_secs: 60,
            analysis: AnalysisOptions::default(),
        }
    }
}

impl SolverConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ngspice executable.
    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Set the per-solve timeout in seconds.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set circuit and nominal temperature in °C.
    pub fn with_temperature(mut self, temperature: f64, nominal_temperature: f64) -> Self {
        self.analysis = AnalysisOptions {
            temperature,
            nominal_temperature,
        };
        self
    }
}

/// Operating-point solver backed by the ngspice executable.
#[derive(Debug, Clone, Default)]
pub struct NgspiceSolver {
    config: SolverConfig,
}

impl NgspiceSolver {
    /// Create a solver with the given configuration.
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// The solver configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Check if the ngspice executable can be started.
    pub fn is_available(&self) -> bool {
        Command::new(&self.config.executable)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// First line of `ngspice --version`.
    pub fn version(&self) -> Result<String> {
        let output = Command::new(&self.config.executable)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ShuntError::SolverNotFound {
                executable: self.config.executable.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ShuntError::SolverExecutionFailed {
                message: format!("--version exited with {}", output.status),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout);
        Ok(text
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("unknown")
            .to_string())
    }
}

impl OperatingPointSolver for NgspiceSolver {
    fn operating_point(&self, circuit: &Circuit) -> Result<OperatingPoint> {
        let netlist = to_netlist(circuit, &self.config.analysis);
        trace!(%netlist, "ngspice input");

        let started = Instant::now();
        let mut session = NgspiceSession::start(&self.config, &netlist)?;
        let status = session.wait(Duration::from_secs(self.config.timeout_secs))?;
        let log = session.log()?;
        let raw = session.rawfile()?;
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            %status,
            raw_bytes = raw.len(),
            "ngspice finished"
        );

        let convergence_note = find_convergence_failure(&log);

        if !status.success() {
            if let Some(line) = convergence_note {
                return Err(ShuntError::convergence_failure(line));
            }
            return Err(ShuntError::SolverExecutionFailed {
                message: format!(
                    "ngspice exited with {status}\nstderr: {}\nlog: {}",
                    session.stderr(),
                    tail(&log, 20)
                ),
            });
        }

        // A recovered operating point (e.g. after gmin stepping) still has data;
        // only an empty plot means the solve itself failed.
        match parse_rawfile(&raw).and_then(|r| r.to_operating_point()) {
            Ok(op) => Ok(op),
            Err(err) => match convergence_note {
                Some(line) => Err(ShuntError::convergence_failure(line)),
                None => Err(err),
            },
        }
    }
}

/// One ngspice child process and the files it reads and writes.
struct NgspiceSession {
    child: Option<Child>,
    executable: String,
    // Held so the netlist outlives the child.
    _netlist: NamedTempFile,
    log: NamedTempFile,
    raw: NamedTempFile,
    // A file, not a pipe: nothing drains stderr while the child runs.
    stderr: NamedTempFile,
}

impl NgspiceSession {
    fn start(config: &SolverConfig, netlist: &str) -> Result<Self> {
        let temp = |source| ShuntError::TempFile { source };

        let mut netlist_file = NamedTempFile::new().map_err(temp)?;
        netlist_file.write_all(netlist.as_bytes()).map_err(temp)?;
        netlist_file.flush().map_err(temp)?;
        let log = NamedTempFile::new().map_err(temp)?;
        let raw = NamedTempFile::new().map_err(temp)?;
        let stderr = NamedTempFile::new().map_err(temp)?;
        let stderr_sink = stderr.reopen().map_err(temp)?;

        // -b: batch mode, -o: log file, -r: rawfile
        let child = Command::new(&config.executable)
            .arg("-b")
            .arg("-o")
            .arg(log.path())
            .arg("-r")
            .arg(raw.path())
            .arg(netlist_file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr_sink))
            .spawn()
            .map_err(|source| ShuntError::SolverNotFound {
                executable: config.executable.clone(),
                source,
            })?;

        Ok(Self {
            child: Some(child),
            executable: config.executable.clone(),
            _netlist: netlist_file,
            log,
            raw,
            stderr,
        })
    }

    /// Wait for the child to exit, killing it once `timeout` elapses.
    fn wait(&mut self, timeout: Duration) -> Result<ExitStatus> {
        let start = Instant::now();
        let poll_interval = Duration::from_millis(20);

        let Some(child) = self.child.as_mut() else {
            return Err(ShuntError::SolverExecutionFailed {
                message: format!("{} session already finished", self.executable),
            });
        };

        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    self.child = None;
                    return Ok(status);
                }
                Ok(None) => {
                    if start.elapsed() > timeout {
                        // Drop kills and reaps the child
                        return Err(ShuntError::SolverTimeout {
                            seconds: timeout.as_secs(),
                        });
                    }
                    thread::sleep(poll_interval);
                }
                Err(e) => {
                    return Err(ShuntError::SolverExecutionFailed {
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    fn log(&self) -> Result<String> {
        let bytes = std::fs::read(self.log.path()).map_err(|source| ShuntError::TempFile { source })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn rawfile(&self) -> Result<Vec<u8>> {
        std::fs::read(self.raw.path()).map_err(|source| ShuntError::TempFile { source })
    }

    fn stderr(&self) -> String {
        std::fs::read(self.stderr.path())
            .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
            .unwrap_or_default()
    }
}

impl Drop for NgspiceSession {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// First log line that reports a failed operating point, if any.
fn find_convergence_failure(log: &str) -> Option<String> {
    log.lines()
        .map(str::trim)
        .find(|line| {
            let lower = line.to_lowercase();
            CONVERGENCE_MARKERS.iter().any(|m| lower.contains(m))
        })
        .map(str::to_string)
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}
