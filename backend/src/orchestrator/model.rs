//! Deffuant model entry point
//!
//! Assembles a [`SimulationEngine`] from options plus optional agent and
//! network files, and runs it against an output directory.
//!
//! Network precedence:
//! 1. a network file gives an explicit network
//! 2. otherwise `use_network` gives a square lattice
//! 3. otherwise every pair of agents may interact

use crate::config::SimulationOptions;
use crate::error::SimulationError;
use crate::io::{load_agents, load_network};
use crate::models::AgentStore;
use crate::network::Network;
use crate::orchestrator::checkpoint::StateSnapshot;
use crate::orchestrator::control::{NeverStop, StopCondition};
use crate::orchestrator::engine::{RunSummary, SimulationEngine};
use crate::output::{BackgroundSink, DirectoryWriter, SnapshotSink};
use crate::rng::RngManager;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Deffuant bounded-confidence model
///
/// # Example
///
/// ```rust
/// use deffuant_core_rs::{DeffuantModel, SimulationOptions};
///
/// let mut options = SimulationOptions::default();
/// options.rng_seed = Some(42);
/// options.model.max_iterations = Some(500);
/// options.network.number_of_agents = 16;
/// options.model.use_network = true;
///
/// let mut model = DeffuantModel::new(options, None, None).unwrap();
/// assert_eq!(model.get_network().neighbors_of(0).unwrap().len(), 2);
///
/// let dir = std::env::temp_dir().join(format!("deffuant-doc-{}", std::process::id()));
/// let summary = model.run(&dir).unwrap();
/// assert_eq!(summary.final_iteration, 500);
/// # std::fs::remove_dir_all(&dir).unwrap();
/// ```
#[derive(Debug)]
pub struct DeffuantModel {
    engine: SimulationEngine,
}

impl DeffuantModel {
    /// Build the model
    ///
    /// Without an agent file, `network.number_of_agents` opinions are drawn
    /// uniformly from [0, 1) using the run's RNG.
    ///
    /// # Errors
    ///
    /// * `AgentLoad` / `NetworkLoad` - malformed input files
    /// * `Configuration` - invalid options, e.g. a lattice over a non-square
    ///   population
    pub fn new(
        mut options: SimulationOptions,
        agent_file: Option<&Path>,
        network_file: Option<&Path>,
    ) -> Result<Self, SimulationError> {
        let seed = *options
            .rng_seed
            .get_or_insert_with(RngManager::entropy_seed);
        let mut rng = RngManager::new(seed);

        let agents = match agent_file {
            Some(path) => {
                let agents = load_agents(path)?;
                info!(path = %path.display(), n_agents = agents.size(), "loaded agents");
                agents
            }
            None => AgentStore::random_uniform(options.network.number_of_agents, &mut rng),
        };
        let n_agents = agents.size();
        let network = build_network(&mut options, network_file, n_agents)?;

        let engine = SimulationEngine::with_rng(options, agents, network, rng)?;
        Ok(Self { engine })
    }

    /// Continue a run saved with [`SimulationEngine::checkpoint`]
    ///
    /// `options` and `network_file` must be the ones the checkpointed model
    /// was built from; the network is rebuilt from them.
    ///
    /// # Errors
    ///
    /// * `CheckpointMismatch` - options or agent count differ from the snapshot
    pub fn from_checkpoint(
        mut options: SimulationOptions,
        network_file: Option<&Path>,
        snapshot: StateSnapshot,
    ) -> Result<Self, SimulationError> {
        let network = build_network(&mut options, network_file, snapshot.agents.len())?;
        let engine = SimulationEngine::from_checkpoint(options, network, snapshot)?;
        Ok(Self { engine })
    }

    /// Wrap an already assembled engine
    pub fn from_engine(engine: SimulationEngine) -> Self {
        Self { engine }
    }

    /// Run to completion, writing snapshots into `output_dir`
    ///
    /// `output_dir` is created if missing. An existing empty directory is
    /// used as is.
    ///
    /// # Errors
    ///
    /// * `OutputTargetConflict` - `output_dir` is a file or a non-empty
    ///   directory
    pub fn run(&mut self, output_dir: impl AsRef<Path>) -> Result<RunSummary, SimulationError> {
        self.run_until(output_dir, NeverStop)
    }

    /// Run into `output_dir` until `max_iterations` or `stop` fires
    pub fn run_until<C: StopCondition>(
        &mut self,
        output_dir: impl AsRef<Path>,
        stop: C,
    ) -> Result<RunSummary, SimulationError> {
        let dir = output_dir.as_ref();
        prepare_output_dir(dir)?;

        let mut sink = BackgroundSink::new(DirectoryWriter::new(dir))?;
        let summary = self.engine.run(&mut sink, stop)?;
        let writer = sink.finish()?;

        debug!(
            dir = %dir.display(),
            files = writer.files_written(),
            "output written"
        );
        Ok(summary)
    }

    /// Run with a caller-supplied sink and stop condition
    pub fn run_with<S, C>(&mut self, sink: S, stop: C) -> Result<RunSummary, SimulationError>
    where
        S: SnapshotSink,
        C: StopCondition,
    {
        self.engine.run(sink, stop)
    }

    pub fn get_network(&self) -> &Network {
        self.engine.network()
    }

    /// Opinion of one agent; negative indices are rejected
    pub fn agent_opinion(&self, index: i64) -> Result<f64, SimulationError> {
        let index = self.engine.agents().resolve_index(index)?;
        self.engine.get_opinion(index)
    }

    /// All opinions in index order
    pub fn agent_opinions(&self) -> Vec<f64> {
        self.engine.agents().opinions()
    }

    /// Overwrite one opinion; negative indices are rejected
    pub fn set_agent_opinion(&mut self, index: i64, opinion: f64) -> Result<(), SimulationError> {
        let index = self.engine.agents().resolve_index(index)?;
        self.engine.set_opinion(index, opinion)
    }

    pub fn n_agents(&self) -> usize {
        self.engine.agents().size()
    }

    pub fn iteration(&self) -> usize {
        self.engine.iteration()
    }

    pub fn settings(&self) -> &SimulationOptions {
        self.engine.options()
    }

    /// Mutable settings, only before the first run
    pub fn settings_mut(&mut self) -> Result<&mut SimulationOptions, SimulationError> {
        self.engine.options_mut()
    }

    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SimulationEngine {
        &mut self.engine
    }

    pub fn into_engine(self) -> SimulationEngine {
        self.engine
    }
}

/// Network for `n_agents` following the precedence in the module docs
///
/// A network file clears `use_network` in `options` so that validation does
/// not demand a square population.
fn build_network(
    options: &mut SimulationOptions,
    network_file: Option<&Path>,
    n_agents: usize,
) -> Result<Network, SimulationError> {
    if network_file.is_some() && options.model.use_network {
        debug!("network file takes precedence over use_network");
        options.model.use_network = false;
    }
    options.validate(n_agents)?;

    match network_file {
        Some(path) => {
            let network = load_network(path, Some(n_agents))?;
            info!(path = %path.display(), "loaded network");
            Ok(network)
        }
        None if options.model.use_network => {
            Network::square_lattice(n_agents, options.model.lattice_boundary)
        }
        None => Ok(Network::disabled(n_agents)),
    }
}

/// Create `dir`, refusing to overwrite earlier results
///
/// An existing empty directory is reused.
pub fn prepare_output_dir(dir: &Path) -> Result<(), SimulationError> {
    if dir.is_file() {
        return Err(SimulationError::OutputTargetConflict(dir.to_path_buf()));
    }

    if dir.is_dir() {
        let mut entries = fs::read_dir(dir).map_err(|e| SimulationError::io(dir, e))?;
        if entries.next().is_some() {
            return Err(SimulationError::OutputTargetConflict(dir.to_path_buf()));
        }
        return Ok(());
    }

    fs::create_dir_all(dir).map_err(|e| SimulationError::io(dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkKind;
    use crate::orchestrator::control::RunProgress;
    use crate::output::NullSink;

    fn options(n_agents: usize) -> SimulationOptions {
        let mut options = SimulationOptions::default();
        options.rng_seed = Some(11);
        options.model.max_iterations = Some(100);
        options.network.number_of_agents = n_agents;
        options
    }

    #[test]
    fn test_default_network_is_disabled() {
        let model = DeffuantModel::new(options(10), None, None).unwrap();
        assert_eq!(model.get_network().kind(), NetworkKind::Disabled);
        assert_eq!(model.n_agents(), 10);
        assert!(model.agent_opinions().iter().all(|x| (0.0..1.0).contains(x)));
    }

    #[test]
    fn test_lattice_requires_square() {
        let mut opts = options(15);
        opts.model.use_network = true;
        assert!(matches!(
            DeffuantModel::new(opts, None, None),
            Err(SimulationError::Configuration(_))
        ));
    }

    #[test]
    fn test_same_seed_same_initial_opinions() {
        let a = DeffuantModel::new(options(20), None, None).unwrap();
        let b = DeffuantModel::new(options(20), None, None).unwrap();
        assert_eq!(a.agent_opinions(), b.agent_opinions());
    }

    #[test]
    fn test_signed_index_checks() {
        let mut model = DeffuantModel::new(options(4), None, None).unwrap();
        assert!(matches!(
            model.agent_opinion(-1),
            Err(SimulationError::IndexOutOfRange { index: -1, size: 4 })
        ));
        assert!(model.agent_opinion(4).is_err());
        model.set_agent_opinion(3, 0.25).unwrap();
        assert_eq!(model.agent_opinion(3).unwrap(), 0.25);
    }

    #[test]
    fn test_resume_from_checkpoint_matches_full_run() {
        let mut opts = options(16);
        opts.model.use_network = true;
        opts.model.max_iterations = Some(400);

        let mut full = DeffuantModel::new(opts.clone(), None, None).unwrap();
        full.run_with(NullSink, NeverStop).unwrap();

        let mut first = DeffuantModel::new(opts.clone(), None, None).unwrap();
        first
            .run_with(NullSink, |p: &RunProgress<'_>| p.iteration == 150)
            .unwrap();
        let snapshot = first.engine().checkpoint().unwrap();

        let mut resumed = DeffuantModel::from_checkpoint(opts, None, snapshot).unwrap();
        assert_eq!(resumed.iteration(), 150);
        assert_eq!(resumed.get_network().kind(), NetworkKind::Lattice);
        resumed.run_with(NullSink, NeverStop).unwrap();
        assert_eq!(resumed.agent_opinions(), full.agent_opinions());
    }

    #[test]
    fn test_prepare_output_dir() {
        let tmp = tempfile::tempdir().unwrap();

        let fresh = tmp.path().join("fresh");
        prepare_output_dir(&fresh).unwrap();
        assert!(fresh.is_dir());
        // empty directory is reused
        prepare_output_dir(&fresh).unwrap();

        fs::write(fresh.join("opinions_0.txt"), "0, 0.5\n").unwrap();
        assert!(matches!(
            prepare_output_dir(&fresh),
            Err(SimulationError::OutputTargetConflict(_))
        ));

        let file = tmp.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            prepare_output_dir(&file),
            Err(SimulationError::OutputTargetConflict(_))
        ));
    }
}
