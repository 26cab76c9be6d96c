//! Simulation settings
//!
//! Settings are plain typed structs, deserialised from TOML:
//!
//! ```toml
//! rng_seed = 42
//!
//! [model]
//! max_iterations = 100000
//! homophily_threshold = 0.2
//! mu = 0.5
//! use_network = false
//!
//! [network]
//! number_of_agents = 300
//!
//! [output]
//! n_output_agents = 1000
//! ```
//!
//! Every field has a default, so an empty document is a valid configuration.

use crate::error::SimulationError;
use crate::network::{integer_sqrt, LatticeBoundary};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default homophily threshold
pub const DEFAULT_HOMOPHILY_THRESHOLD: f64 = 0.2;
/// Default convergence rate
pub const DEFAULT_MU: f64 = 0.5;
/// Default population size when agents are generated
pub const DEFAULT_NUMBER_OF_AGENTS: usize = 200;

/// Complete configuration of one simulation run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationOptions {
    /// Seed for the engine RNG; `None` picks a fresh seed at construction
    pub rng_seed: Option<u64>,

    /// Deffuant model parameters
    pub model: DeffuantSettings,

    /// Population generation parameters
    pub network: NetworkSettings,

    /// Snapshot and progress reporting
    pub output: OutputSettings,
}

/// Deffuant model parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeffuantSettings {
    /// Stop after this many interaction attempts; `None` runs until stopped
    pub max_iterations: Option<usize>,

    /// Agents interact only if their opinions differ by less than this
    pub homophily_threshold: f64,

    /// Fraction of the opinion gap each agent closes per interaction
    pub mu: f64,

    /// Restrict interactions to a square lattice
    pub use_network: bool,

    /// Lattice border behaviour when `use_network` is set
    pub lattice_boundary: LatticeBoundary,
}

impl Default for DeffuantSettings {
    fn default() -> Self {
        Self {
            max_iterations: None,
            homophily_threshold: DEFAULT_HOMOPHILY_THRESHOLD,
            mu: DEFAULT_MU,
            use_network: false,
            lattice_boundary: LatticeBoundary::Open,
        }
    }
}

/// Population generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkSettings {
    /// Number of agents generated when no agent file is supplied
    pub number_of_agents: usize,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            number_of_agents: DEFAULT_NUMBER_OF_AGENTS,
        }
    }
}

/// Snapshot and progress reporting
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
    /// Hand opinions to the snapshot sink every N iterations
    pub n_output_agents: Option<usize>,

    /// Include the network in snapshots every N iterations
    pub n_output_network: Option<usize>,

    /// Log progress every N iterations
    pub print_progress: Option<usize>,

    /// Keep an in-memory log of every interaction attempt
    pub record_events: bool,
}

impl SimulationOptions {
    /// Load options from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimulationError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SimulationError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Parse options from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, SimulationError> {
        toml::from_str(content).map_err(|e| SimulationError::Configuration(e.to_string()))
    }

    /// Serialise options back to TOML
    pub fn to_toml_string(&self) -> Result<String, SimulationError> {
        toml::to_string_pretty(self).map_err(|e| SimulationError::Serialization(e.to_string()))
    }

    /// Validate options against the actual population size
    ///
    /// Checks:
    /// - at least two agents
    /// - finite, non-negative homophily threshold
    /// - finite mu
    /// - output intervals are positive when set
    /// - lattice requests use a perfect-square population
    pub fn validate(&self, n_agents: usize) -> Result<(), SimulationError> {
        if n_agents < 2 {
            return Err(SimulationError::Configuration(format!(
                "at least 2 agents are required, got {}",
                n_agents
            )));
        }

        let threshold = self.model.homophily_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(SimulationError::Configuration(format!(
                "homophily_threshold must be a finite non-negative number, got {}",
                threshold
            )));
        }

        if !self.model.mu.is_finite() {
            return Err(SimulationError::Configuration(format!(
                "mu must be finite, got {}",
                self.model.mu
            )));
        }

        for (name, value) in [
            ("n_output_agents", self.output.n_output_agents),
            ("n_output_network", self.output.n_output_network),
            ("print_progress", self.output.print_progress),
        ] {
            if value == Some(0) {
                return Err(SimulationError::Configuration(format!(
                    "{} must be positive when set",
                    name
                )));
            }
        }

        if self.model.use_network && integer_sqrt(n_agents).is_none() {
            return Err(SimulationError::Configuration(format!(
                "use_network requires a perfect-square number of agents, got {}",
                n_agents
            )));
        }

        Ok(())
    }

    /// Whether mu lies in the stable range (0, 0.5]
    pub fn mu_is_stable(&self) -> bool {
        self.model.mu > 0.0 && self.model.mu <= 0.5
    }
}
