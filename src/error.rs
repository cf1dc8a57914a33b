//! Error types for the TL431 shunt regulator simulation.
//!
//! This module provides a unified error type [`ShuntError`] that covers
//! divider solving, circuit construction, and the external solver boundary.

use thiserror::Error;

/// Result type alias using [`ShuntError`].
pub type Result<T> = std::result::Result<T, ShuntError>;

/// Unified error type for all operations in this crate.
#[derive(Error, Debug)]
pub enum ShuntError {
    // ============ Divider Errors ============
    /// No positive resistor split reaches the requested output voltage
    #[error("Invalid target {v_out_target} V (reference {v_ref} V): {message}")]
    InvalidTarget {
        v_out_target: f64,
        v_ref: f64,
        message: String,
    },

    // ============ Circuit Errors ============
    /// Duplicate element name
    #[error("Duplicate element name '{name}'")]
    DuplicateElement { name: String },

    /// Duplicate model name
    #[error("Duplicate model name '{name}'")]
    DuplicateModel { name: String },

    /// Invalid element value
    #[error("Invalid element '{name}': {message}")]
    InvalidElement { name: String, message: String },

    /// Undefined model reference
    #[error("Undefined model '{model}' referenced by element '{element}'")]
    UndefinedModel { model: String, element: String },

    /// Source handle does not refer to a voltage source of this circuit
    #[error("Element #{index} is not a voltage source of this circuit")]
    UnknownSource { index: usize },

    /// Invalid circuit topology
    #[error("Invalid circuit topology: {message}")]
    InvalidTopology { message: String },

    // ============ Solver Errors ============
    /// Requested node is absent from the solver output
    #[error("Node '{node}' not found in solver output")]
    NodeNotFound { node: String },

    /// The solver gave up on the operating point
    #[error("Operating point did not converge: {message}")]
    ConvergenceFailure { message: String },

    /// Solver executable could not be started
    #[error("Solver executable '{executable}' could not be started: {source}")]
    SolverNotFound {
        executable: String,
        #[source]
        source: std::io::Error,
    },

    /// Solver ran but reported failure
    #[error("Solver execution failed: {message}")]
    SolverExecutionFailed { message: String },

    /// Solver exceeded its time budget
    #[error("Solver timed out after {seconds} seconds")]
    SolverTimeout { seconds: u64 },

    /// Solver output could not be read
    #[error("Failed to parse rawfile: {message}")]
    RawfileParse { message: String },

    /// Temporary file for the solver session could not be created or written
    #[error("Temporary file error: {source}")]
    TempFile {
        #[source]
        source: std::io::Error,
    },
}

impl ShuntError {
    /// Create an invalid target error
    pub fn invalid_target(v_out_target: f64, v_ref: f64, message: impl Into<String>) -> Self {
        Self::InvalidTarget {
            v_out_target,
            v_ref,
            message: message.into(),
        }
    }

    /// Create an invalid element error
    pub fn invalid_element(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidElement {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a convergence failure error
    pub fn convergence_failure(message: impl Into<String>) -> Self {
        Self::ConvergenceFailure {
            message: message.into(),
        }
    }

    /// Create a rawfile parse error
    pub fn rawfile(message: impl Into<String>) -> Self {
        Self::RawfileParse {
            message: message.into(),
        }
    }

    /// Whether this error came from the solver boundary rather than from
    /// the caller's inputs.
    pub fn is_solver_error(&self) -> bool {
        matches!(
            self,
            Self::NodeNotFound { .. }
                | Self::ConvergenceFailure { .. }
                | Self::SolverNotFound { .. }
                | Self::SolverExecutionFailed { .. }
                | Self::SolverTimeout { .. }
                | Self::RawfileParse { .. }
                | Self::TempFile { .. }
        )
    }
}
