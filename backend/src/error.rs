//! Error taxonomy for the opinion dynamics engine
//!
//! Configuration and load errors are raised while a simulation is being
//! assembled, before any interaction runs. Everything else can surface
//! mid-run and leaves the agent store at its last completed iteration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced anywhere in the engine or its I/O adapters
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Invalid or contradictory settings (e.g. non-square lattice request)
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Agent index outside `[0, size)`
    #[error("Agent index {index} is out of range for {size} agents")]
    IndexOutOfRange { index: i64, size: usize },

    /// Malformed network description
    #[error("Network load error (line {line}): {reason}")]
    NetworkLoad { line: usize, reason: String },

    /// Malformed agent description
    #[error("Agent load error (line {line}): {reason}")]
    AgentLoad { line: usize, reason: String },

    /// Selector could not find a legal pair after bounded retries
    #[error("No valid interaction partner found after {retries} attempts")]
    NoValidInteraction { retries: usize },

    /// Output location already holds results
    #[error("Output target already exists: {}", .0.display())]
    OutputTargetConflict(PathBuf),

    /// Snapshot sink failure
    #[error("Output error: {0}")]
    Output(String),

    /// Filesystem failure with the offending path attached
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Checkpoint or config (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Checkpoint does not belong to the supplied configuration
    #[error("Checkpoint mismatch: {0}")]
    CheckpointMismatch(String),

    /// Operation not allowed in the engine's current run state
    #[error("Invalid engine state: {0}")]
    InvalidState(String),
}

impl SimulationError {
    /// Wrap an `std::io::Error` together with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SimulationError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error was raised before iteration could begin
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            SimulationError::Configuration(_)
                | SimulationError::NetworkLoad { .. }
                | SimulationError::AgentLoad { .. }
                | SimulationError::OutputTargetConflict(_)
                | SimulationError::CheckpointMismatch(_)
        )
    }
}
