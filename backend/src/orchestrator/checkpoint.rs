//! Checkpoint - Save/Load Simulation State
//!
//! Captures everything needed to continue a run later: the iteration
//! counter, the RNG state and every agent (opinion and activity). The network is not stored; it
//! is rebuilt from the same options or network file on restore.
//!
//! # Critical Invariants
//!
//! - **Determinism**: a restored engine draws the same pairs as the original
//!   would have from that iteration on
//! - **Config Matching**: a snapshot can only be loaded with options whose
//!   hash matches `config_hash`

use crate::error::SimulationError;
use crate::models::Agent;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

// ============================================================================
// Snapshot Structure
// ============================================================================

/// Resumable engine state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Completed iterations
    pub iteration: usize,

    /// Seed the run started from
    pub rng_seed: u64,

    /// RNG state at the time of the snapshot (CRITICAL for determinism)
    pub rng_state: u64,

    /// Agents in index order
    pub agents: Vec<Agent>,

    /// SHA256 hash of the effective options (for validation)
    pub config_hash: String,
}

impl StateSnapshot {
    /// Check internal consistency
    ///
    /// - at least two agents
    /// - every opinion finite
    /// - non-empty config hash
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.agents.len() < 2 {
            return Err(SimulationError::CheckpointMismatch(format!(
                "snapshot holds {} agents, at least 2 are required",
                self.agents.len()
            )));
        }

        if let Some(index) = self.agents.iter().position(|a| !a.opinion().is_finite()) {
            return Err(SimulationError::CheckpointMismatch(format!(
                "opinion of agent {} is not finite",
                index
            )));
        }

        if self.config_hash.is_empty() {
            return Err(SimulationError::CheckpointMismatch(
                "snapshot has no config hash".to_string(),
            ));
        }

        Ok(())
    }

    /// Write the snapshot as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SimulationError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            SimulationError::Serialization(format!("Snapshot serialization failed: {}", e))
        })?;
        fs::write(path, json).map_err(|e| SimulationError::io(path, e))
    }

    /// Read a snapshot written by [`StateSnapshot::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimulationError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| SimulationError::io(path, e))?;
        let snapshot: StateSnapshot = serde_json::from_str(&json).map_err(|e| {
            SimulationError::Serialization(format!("Snapshot deserialization failed: {}", e))
        })?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}

// ============================================================================
// Config Hashing
// ============================================================================

/// Compute deterministic SHA256 hash of config
///
/// Uses canonical JSON serialization with sorted keys so the hash does not
/// depend on field order.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, SimulationError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let value = serde_json::to_value(config).map_err(|e| {
        SimulationError::Serialization(format!("Config serialization failed: {}", e))
    })?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value)).map_err(|e| {
        SimulationError::Serialization(format!("Config serialization failed: {}", e))
    })?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
