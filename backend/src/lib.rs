//! Deffuant Core - Rust Engine
//!
//! Bounded-confidence opinion dynamics (Deffuant-Weisbuch model) with
//! deterministic execution.
//!
//! # Architecture
//!
//! - **models**: Agent store and event log
//! - **network**: Interaction topologies (none, square lattice, explicit)
//! - **interaction**: Update rule and pair selection
//! - **orchestrator**: Simulation loop, run control, checkpoints
//! - **output**: Snapshot sinks (directory, background writer, memory)
//! - **io**: Agent and network text formats
//! - **config**: TOML-backed simulation options
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. Agent count is fixed for the lifetime of a run
//! 2. All randomness is deterministic (seeded RNG)
//! 3. Both agents of an interaction are updated from their pre-update opinions
//! 4. FFI boundary is minimal and safe

// Module declarations
pub mod config;
pub mod error;
pub mod interaction;
pub mod io;
pub mod models;
pub mod network;
pub mod orchestrator;
pub mod output;
pub mod rng;

// Re-exports for convenience
pub use config::{DeffuantSettings, NetworkSettings, OutputSettings, SimulationOptions};
pub use error::SimulationError;
pub use interaction::{deffuant_update, InteractionOutcome, InteractionSelector, RandomSelector};
pub use models::{Agent, AgentStore, Event, EventLog};
pub use network::{LatticeBoundary, Network, NetworkKind};
pub use orchestrator::{
    DeffuantModel, RunState, RunSummary, SimulationEngine, StateSnapshot, StepResult,
    TerminationReason,
};
pub use output::{
    BackgroundSink, DirectoryWriter, MemorySink, NullSink, SnapshotSink, SnapshotStage,
    SnapshotView,
};
pub use rng::RngManager;

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn deffuant_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::model::PyDeffuantModel>()?;
    Ok(())
}
