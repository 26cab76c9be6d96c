//! PyO3 wrapper for DeffuantModel
//!
//! This module provides the Python interface to the Rust engine.

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyFloat, PyList};
use std::path::PathBuf;

use super::types::{run_summary_to_py, to_py_err};
use crate::config::SimulationOptions;
use crate::network::LatticeBoundary;
use crate::orchestrator::{DeffuantModel, NeverStop};
use crate::output::NullSink;

/// Python wrapper for the Deffuant model
///
/// # Example (from Python)
///
/// ```python
/// from deffuant_core_rs import DeffuantModel
///
/// model = DeffuantModel(max_iterations=10_000, homophily_threshold=0.2, rng_seed=42)
/// summary = model.run("output/")
/// print(summary["final_iteration"], model.agent_opinion(0))
/// ```
#[pyclass(name = "DeffuantModel")]
pub struct PyDeffuantModel {
    inner: DeffuantModel,
}

#[pymethods]
impl PyDeffuantModel {
    /// Create a model
    ///
    /// # Errors
    ///
    /// Raises ValueError for invalid settings or malformed input files.
    #[new]
    #[pyo3(signature = (
        max_iterations = None,
        homophily_threshold = 0.2,
        mu = 0.5,
        use_network = false,
        rng_seed = None,
        agent_file = None,
        network_file = None,
        number_of_agents = 200,
        periodic_lattice = false
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        max_iterations: Option<usize>,
        homophily_threshold: f64,
        mu: f64,
        use_network: bool,
        rng_seed: Option<u64>,
        agent_file: Option<PathBuf>,
        network_file: Option<PathBuf>,
        number_of_agents: usize,
        periodic_lattice: bool,
    ) -> PyResult<Self> {
        let mut options = SimulationOptions::default();
        options.rng_seed = rng_seed;
        options.model.max_iterations = max_iterations;
        options.model.homophily_threshold = homophily_threshold;
        options.model.mu = mu;
        options.model.use_network = use_network;
        options.network.number_of_agents = number_of_agents;
        if periodic_lattice {
            options.model.lattice_boundary = LatticeBoundary::Periodic;
        }

        let inner = DeffuantModel::new(options, agent_file.as_deref(), network_file.as_deref())
            .map_err(to_py_err)?;
        Ok(PyDeffuantModel { inner })
    }

    /// Run the simulation
    ///
    /// With `output_dir`, snapshots are written there; the directory must
    /// not already contain results. The GIL is released while iterating.
    ///
    /// # Returns
    ///
    /// Dictionary with `reason`, `final_iteration`, `iterations_run`,
    /// `updates`, `snapshots_written`, `opinion_spread`, `elapsed_seconds`
    #[pyo3(signature = (output_dir = None))]
    fn run(&mut self, py: Python<'_>, output_dir: Option<PathBuf>) -> PyResult<Py<PyDict>> {
        let inner = &mut self.inner;
        let summary = py
            .allow_threads(|| match output_dir {
                Some(dir) => inner.run(dir),
                None => inner.run_with(NullSink, NeverStop),
            })
            .map_err(to_py_err)?;
        run_summary_to_py(py, &summary)
    }

    /// Opinion of agent `index`, or all opinions when `index` is None
    #[pyo3(signature = (index = None))]
    fn agent_opinion(&self, py: Python<'_>, index: Option<i64>) -> PyResult<PyObject> {
        match index {
            Some(index) => {
                let opinion = self.inner.agent_opinion(index).map_err(to_py_err)?;
                Ok(PyFloat::new(py, opinion).into_any().unbind())
            }
            None => Ok(PyList::new(py, self.inner.agent_opinions())?
                .into_any()
                .unbind()),
        }
    }

    /// Overwrite the opinion of agent `index`
    fn set_agent_opinion(&mut self, index: i64, opinion: f64) -> PyResult<()> {
        self.inner
            .set_agent_opinion(index, opinion)
            .map_err(to_py_err)
    }

    fn n_agents(&self) -> usize {
        self.inner.n_agents()
    }

    /// Neighbours of agent `index` (empty without a network)
    fn neighbours(&self, index: i64) -> PyResult<Vec<usize>> {
        let index = self
            .inner
            .engine()
            .agents()
            .resolve_index(index)
            .map_err(to_py_err)?;
        let neighbours = self
            .inner
            .get_network()
            .neighbors_of(index)
            .map_err(to_py_err)?;
        Ok(neighbours.to_vec())
    }

    /// Completed iterations
    fn iteration(&self) -> usize {
        self.inner.iteration()
    }

    /// Network kind: "disabled", "lattice" or "explicit"
    #[getter]
    fn network_kind(&self) -> String {
        self.inner.get_network().kind().to_string()
    }

    #[getter]
    fn rng_seed(&self) -> u64 {
        self.inner.engine().rng_seed()
    }

    #[getter]
    fn max_iterations(&self) -> Option<usize> {
        self.inner.settings().model.max_iterations
    }

    #[setter]
    fn set_max_iterations(&mut self, value: Option<usize>) -> PyResult<()> {
        self.inner.settings_mut().map_err(to_py_err)?.model.max_iterations = value;
        Ok(())
    }

    #[getter]
    fn homophily_threshold(&self) -> f64 {
        self.inner.settings().model.homophily_threshold
    }

    #[setter]
    fn set_homophily_threshold(&mut self, value: f64) -> PyResult<()> {
        self.inner.settings_mut().map_err(to_py_err)?.model.homophily_threshold = value;
        Ok(())
    }

    #[getter]
    fn mu(&self) -> f64 {
        self.inner.settings().model.mu
    }

    #[setter]
    fn set_mu(&mut self, value: f64) -> PyResult<()> {
        self.inner.settings_mut().map_err(to_py_err)?.model.mu = value;
        Ok(())
    }

    #[getter]
    fn use_network(&self) -> bool {
        self.inner.settings().model.use_network
    }

    fn __repr__(&self) -> String {
        format!(
            "DeffuantModel(n_agents={}, iteration={}, network={})",
            self.inner.n_agents(),
            self.inner.iteration(),
            self.inner.get_network().kind()
        )
    }
}
