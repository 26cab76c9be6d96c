//! Type conversion utilities for FFI boundary
//!
//! Converts engine errors and results into Python exceptions and dicts.

use pyo3::exceptions::{PyFileExistsError, PyIndexError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::error::SimulationError;
use crate::orchestrator::{RunSummary, TerminationReason};

/// Map an engine error onto the closest Python exception
///
/// - `IndexOutOfRange` → `IndexError`
/// - configuration and file format errors → `ValueError`
/// - `OutputTargetConflict` → `FileExistsError`
/// - everything else → `RuntimeError`
pub fn to_py_err(err: SimulationError) -> PyErr {
    let message = err.to_string();
    match err {
        SimulationError::IndexOutOfRange { .. } => PyIndexError::new_err(message),
        SimulationError::Configuration(_)
        | SimulationError::AgentLoad { .. }
        | SimulationError::NetworkLoad { .. }
        | SimulationError::CheckpointMismatch(_) => PyValueError::new_err(message),
        SimulationError::OutputTargetConflict(_) => PyFileExistsError::new_err(message),
        _ => PyRuntimeError::new_err(message),
    }
}

fn reason_name(reason: &TerminationReason) -> &'static str {
    match reason {
        TerminationReason::MaxIterations => "max_iterations",
        TerminationReason::Stopped => "stopped",
        TerminationReason::Failed(_) => "failed",
    }
}

/// Convert RunSummary to Python dict
pub fn run_summary_to_py(py: Python<'_>, summary: &RunSummary) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new(py);

    dict.set_item("reason", reason_name(&summary.reason))?;
    dict.set_item("final_iteration", summary.final_iteration)?;
    dict.set_item("iterations_run", summary.iterations_run)?;
    dict.set_item("updates", summary.updates)?;
    dict.set_item("snapshots_written", summary.snapshots_written)?;
    dict.set_item("opinion_spread", summary.opinion_spread)?;
    dict.set_item("elapsed_seconds", summary.elapsed.as_secs_f64())?;

    Ok(dict.into())
}
