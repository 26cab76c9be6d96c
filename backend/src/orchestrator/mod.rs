//! Orchestrator - simulation loop and run control
//!
//! See `engine.rs` for the interaction loop, `model.rs` for the file-backed
//! entry point.

pub mod checkpoint;
pub mod control;
pub mod engine;
pub mod model;

// Re-export main types for convenience
pub use checkpoint::{compute_config_hash, StateSnapshot};
pub use control::{
    AnyOf, CancellationToken, ConvergenceMonitor, Deadline, NeverStop, RunProgress, StopCondition,
};
pub use engine::{RunState, RunSummary, SimulationEngine, StepResult, TerminationReason};
pub use model::{prepare_output_dir, DeffuantModel};
