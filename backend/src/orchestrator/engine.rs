//! Simulation Engine
//!
//! Owns the agent store, the network, the RNG and the iteration counter, and
//! drives the Deffuant interaction loop:
//!
//! ```text
//! For each iteration:
//! 1. Select an ordered pair (i, j) through the InteractionSelector
//! 2. Apply the bounded-confidence rule to (opinion_i, opinion_j)
//! 3. Write both new opinions back in one call
//! 4. Increment the iteration counter
//! 5. Emit periodic snapshots / progress as configured
//! 6. Stop at max_iterations or when the stop condition fires
//! ```
//!
//! # Run states
//!
//! ```text
//! Initialized ──run──▶ Running ──┬──▶ Terminated(MaxIterations)
//!                                ├──▶ Terminated(Stopped)   ──run──▶ Running
//!                                └──▶ Terminated(Failed)
//! ```
//!
//! # Example
//!
//! ```rust
//! use deffuant_core_rs::{AgentStore, Network, NullSink, SimulationEngine, SimulationOptions};
//! use deffuant_core_rs::orchestrator::{NeverStop, TerminationReason};
//!
//! let mut options = SimulationOptions::default();
//! options.rng_seed = Some(12345);
//! options.model.max_iterations = Some(1000);
//!
//! let agents = AgentStore::from_opinions(vec![0.0, 0.1, 0.5, 0.9, 1.0]);
//! let mut engine = SimulationEngine::new(options, agents, Network::disabled(5)).unwrap();
//!
//! let summary = engine.run(NullSink, NeverStop).unwrap();
//! assert_eq!(summary.reason, TerminationReason::MaxIterations);
//! assert_eq!(engine.iteration(), 1000);
//! ```

use crate::config::SimulationOptions;
use crate::error::SimulationError;
use crate::interaction::{self, InteractionOutcome, InteractionSelector, RandomSelector};
use crate::models::{AgentStore, Event, EventLog};
use crate::network::Network;
use crate::orchestrator::checkpoint::{compute_config_hash, StateSnapshot};
use crate::orchestrator::control::{RunProgress, StopCondition};
use crate::output::{SnapshotSink, SnapshotStage, SnapshotView};
use crate::rng::RngManager;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

// ============================================================================
// Run State
// ============================================================================

/// Why a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum TerminationReason {
    /// Iteration counter reached `max_iterations`
    MaxIterations,
    /// Stop condition fired; the run can be resumed
    Stopped,
    /// An error aborted the run; opinions hold their last good values
    Failed(String),
}

/// Lifecycle of an engine
#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    Initialized,
    Running,
    Terminated(TerminationReason),
}

/// Result of a single iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResult {
    /// Iteration count after this step
    pub iteration: usize,

    /// Focal agent
    pub focal: usize,

    /// Partner agent
    pub partner: usize,

    /// What the rule did to the pair
    pub outcome: InteractionOutcome,
}

/// Result of a `run` call
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Why the run ended
    pub reason: TerminationReason,

    /// Iteration count when the run ended
    pub final_iteration: usize,

    /// Iterations completed by this call
    pub iterations_run: usize,

    /// Interactions that changed opinions during this call
    pub updates: usize,

    /// Snapshots handed to the sink during this call
    pub snapshots_written: usize,

    /// Max minus min opinion at the end
    pub opinion_spread: f64,

    /// Wall-clock duration of this call
    pub elapsed: Duration,
}

// ============================================================================
// Simulation Engine
// ============================================================================

/// Deffuant simulation owning all run state
///
/// # Determinism
///
/// All randomness is via `rng` with seeded xorshift64*.
/// Same seed + same options + same initial opinions = identical pair
/// sequence and identical final opinions.
pub struct SimulationEngine {
    /// Effective options (`rng_seed` is always set)
    options: SimulationOptions,

    /// Opinion state
    agents: AgentStore,

    /// Interaction topology
    network: Network,

    /// Deterministic RNG
    rng: RngManager,

    /// Seed the RNG started from
    rng_seed: u64,

    /// Pair selection strategy
    selector: Box<dyn InteractionSelector>,

    /// Completed iterations
    iteration: usize,

    /// Lifecycle state
    state: RunState,

    /// Recorded events (only filled when `record_events` is set)
    event_log: EventLog,

    /// Whether the Initial snapshot has been emitted
    initial_snapshot_done: bool,
}

impl SimulationEngine {
    /// Create an engine, seeding the RNG from `options.rng_seed`
    ///
    /// When no seed is configured a fresh one is drawn; read it back through
    /// [`SimulationEngine::rng_seed`] to reproduce the run.
    ///
    /// # Errors
    ///
    /// * `Configuration` - options fail validation, or the network size does
    ///   not match the number of agents
    pub fn new(
        options: SimulationOptions,
        agents: AgentStore,
        network: Network,
    ) -> Result<Self, SimulationError> {
        let seed = options.rng_seed.unwrap_or_else(RngManager::entropy_seed);
        Self::with_rng(options, agents, network, RngManager::new(seed))
    }

    /// Create an engine continuing from an existing RNG
    ///
    /// Used when the initial opinions were drawn from the same stream. The
    /// reported seed is `options.rng_seed`, or the RNG state if unset.
    pub fn with_rng(
        mut options: SimulationOptions,
        agents: AgentStore,
        network: Network,
        rng: RngManager,
    ) -> Result<Self, SimulationError> {
        let n_agents = agents.size();
        options.validate(n_agents)?;
        network.ensure_agent_count(n_agents)?;

        let rng_seed = *options.rng_seed.get_or_insert(rng.get_state());

        if !options.mu_is_stable() {
            warn!(
                mu = options.model.mu,
                "mu outside (0, 0.5]; opinions may overshoot"
            );
        }

        if network.is_enabled() {
            let isolated = network.isolated_agents();
            if !isolated.is_empty() {
                warn!(
                    count = isolated.len(),
                    "agents without neighbours will be re-drawn when selected"
                );
            }
        }

        info!(
            seed = rng_seed,
            n_agents,
            network = %network.kind(),
            homophily_threshold = options.model.homophily_threshold,
            mu = options.model.mu,
            "simulation engine initialised"
        );

        Ok(Self {
            options,
            agents,
            network,
            rng,
            rng_seed,
            selector: Box::new(RandomSelector::new()),
            iteration: 0,
            state: RunState::Initialized,
            event_log: EventLog::new(),
            initial_snapshot_done: false,
        })
    }

    /// Replace the pair selection strategy
    pub fn with_selector(mut self, selector: Box<dyn InteractionSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Restore an engine from a checkpoint
    ///
    /// `options` and `network` must describe the same simulation the
    /// snapshot was taken from. If `options.rng_seed` is unset it is taken
    /// from the snapshot before the hashes are compared.
    ///
    /// # Errors
    ///
    /// * `CheckpointMismatch` - config hash or agent count differs
    pub fn from_checkpoint(
        mut options: SimulationOptions,
        network: Network,
        snapshot: StateSnapshot,
    ) -> Result<Self, SimulationError> {
        snapshot.validate()?;

        options.rng_seed.get_or_insert(snapshot.rng_seed);
        let hash = compute_config_hash(&options)?;
        if hash != snapshot.config_hash {
            return Err(SimulationError::CheckpointMismatch(format!(
                "config hash {} does not match snapshot hash {}",
                hash, snapshot.config_hash
            )));
        }

        if network.agent_count() != snapshot.agents.len() {
            return Err(SimulationError::CheckpointMismatch(format!(
                "network has {} agents, snapshot has {}",
                network.agent_count(),
                snapshot.agents.len()
            )));
        }

        let agents = AgentStore::new(snapshot.agents);
        let mut engine =
            Self::with_rng(options, agents, network, RngManager::new(snapshot.rng_state))?;
        engine.iteration = snapshot.iteration;
        engine.initial_snapshot_done = snapshot.iteration > 0;

        info!(iteration = engine.iteration, "engine restored from checkpoint");
        Ok(engine)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Completed iterations
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn agents(&self) -> &AgentStore {
        &self.agents
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Seed the RNG started from
    pub fn rng_seed(&self) -> u64 {
        self.rng_seed
    }

    /// Effective options
    pub fn options(&self) -> &SimulationOptions {
        &self.options
    }

    /// Mutable options, only before the first run
    ///
    /// The network and the RNG are fixed at construction, so changes to
    /// `rng_seed`, `use_network` or `lattice_boundary` have no effect.
    /// Everything else is validated again when `run` starts.
    pub fn options_mut(&mut self) -> Result<&mut SimulationOptions, SimulationError> {
        match self.state {
            RunState::Initialized => Ok(&mut self.options),
            _ => Err(SimulationError::InvalidState(
                "options can only be changed before the first run".to_string(),
            )),
        }
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// Opinion of agent `index`
    pub fn get_opinion(&self, index: usize) -> Result<f64, SimulationError> {
        self.agents.get_opinion(index)
    }

    /// Overwrite the opinion of agent `index`
    ///
    /// The value is used by the next interaction involving that agent.
    pub fn set_opinion(&mut self, index: usize, opinion: f64) -> Result<(), SimulationError> {
        let old_opinion = self.agents.get_opinion(index)?;
        self.agents.set_opinion(index, opinion)?;
        if self.options.output.record_events {
            self.event_log.log(Event::OpinionOverride {
                iteration: self.iteration,
                agent: index,
                old_opinion,
                new_opinion: opinion,
            });
        }
        Ok(())
    }

    /// Whether `max_iterations` has been reached
    pub fn is_finished(&self) -> bool {
        matches!(self.options.model.max_iterations, Some(max) if self.iteration >= max)
    }

    /// Capture a resumable snapshot
    pub fn checkpoint(&self) -> Result<StateSnapshot, SimulationError> {
        Ok(StateSnapshot {
            iteration: self.iteration,
            rng_seed: self.rng_seed,
            rng_state: self.rng.get_state(),
            agents: self.agents.agents().to_vec(),
            config_hash: compute_config_hash(&self.options)?,
        })
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Execute one iteration with a selector-chosen pair
    ///
    /// # Errors
    ///
    /// * `InvalidState` - `max_iterations` already reached
    /// * `NoValidInteraction` - selector found no legal pair
    pub fn step(&mut self) -> Result<StepResult, SimulationError> {
        self.ensure_not_finished()?;
        let (focal, partner) = self.selector.next_pair(&self.network, &mut self.rng)?;
        self.apply(focal, partner)
    }

    /// Execute one iteration on an explicit pair
    ///
    /// Counts as an iteration. The pair is not checked against the network.
    ///
    /// # Errors
    ///
    /// * `IndexOutOfRange` - either index outside the store; nothing changes
    pub fn interact(&mut self, focal: usize, partner: usize) -> Result<StepResult, SimulationError> {
        self.ensure_not_finished()?;
        self.apply(focal, partner)
    }

    fn ensure_not_finished(&self) -> Result<(), SimulationError> {
        if self.is_finished() {
            return Err(SimulationError::InvalidState(format!(
                "iteration limit {} already reached",
                self.iteration
            )));
        }
        Ok(())
    }

    fn apply(&mut self, focal: usize, partner: usize) -> Result<StepResult, SimulationError> {
        let a = self.agents.get_opinion(focal)?;
        let b = self.agents.get_opinion(partner)?;

        let outcome = interaction::interact(
            a,
            b,
            self.options.model.homophily_threshold,
            self.options.model.mu,
        );
        if let InteractionOutcome::Updated { new_a, new_b, .. } = outcome {
            self.agents.set_pair((focal, new_a), (partner, new_b))?;
        }

        self.iteration += 1;

        if self.options.output.record_events {
            self.event_log.log(Event::Interaction {
                iteration: self.iteration,
                focal,
                partner,
                distance: outcome.distance(),
                updated: outcome.is_updated(),
            });
        }

        Ok(StepResult {
            iteration: self.iteration,
            focal,
            partner,
            outcome,
        })
    }

    // ========================================================================
    // Run Loop
    // ========================================================================

    /// Run until `max_iterations` or until `stop` fires
    ///
    /// The sink receives an Initial snapshot (first run only), Periodic
    /// snapshots per `OutputSettings`, and a Final snapshot including the
    /// network. `sink.flush()` is called before returning.
    ///
    /// A run that ended with `Stopped` continues on the next call; one that
    /// reached `MaxIterations` returns immediately.
    ///
    /// # Errors
    ///
    /// Any selector or sink error moves the engine to
    /// `Terminated(Failed)` and is returned. Opinions keep the values of the
    /// last completed iteration and a Final snapshot is still attempted.
    pub fn run<S, C>(&mut self, mut sink: S, mut stop: C) -> Result<RunSummary, SimulationError>
    where
        S: SnapshotSink,
        C: StopCondition,
    {
        match &self.state {
            RunState::Running => {
                return Err(SimulationError::InvalidState(
                    "run is already in progress".to_string(),
                ));
            }
            RunState::Terminated(TerminationReason::Failed(reason)) => {
                return Err(SimulationError::InvalidState(format!(
                    "previous run failed: {}",
                    reason
                )));
            }
            RunState::Initialized => self.options.validate(self.agents.size())?,
            RunState::Terminated(_) => {}
        }

        let started = Instant::now();
        let mut tally = RunTally {
            start_iteration: self.iteration,
            updates: 0,
            snapshots: 0,
        };

        self.state = RunState::Running;
        info!(
            iteration = self.iteration,
            max_iterations = ?self.options.model.max_iterations,
            "run started"
        );

        let outcome = self.drive(&mut sink, &mut stop, started, &mut tally);

        let outcome = outcome.and_then(|reason| {
            self.emit(&mut sink, SnapshotStage::Final, true, &mut tally)?;
            sink.flush()?;
            Ok(reason)
        });

        match outcome {
            Ok(reason) => {
                self.state = RunState::Terminated(reason.clone());
                let summary = self.summary(reason, started, &tally);
                info!(
                    iteration = summary.final_iteration,
                    reason = ?summary.reason,
                    spread = summary.opinion_spread,
                    "run finished"
                );
                Ok(summary)
            }
            Err(e) => {
                self.state = RunState::Terminated(TerminationReason::Failed(e.to_string()));
                warn!(iteration = self.iteration, error = %e, "run failed");
                // best effort: persist the last good state
                if let Err(final_err) = self.emit(&mut sink, SnapshotStage::Final, true, &mut tally)
                {
                    warn!(error = %final_err, "final snapshot after failure not written");
                }
                if let Err(flush_err) = sink.flush() {
                    warn!(error = %flush_err, "sink flush after failure failed");
                }
                Err(e)
            }
        }
    }

    fn drive<S, C>(
        &mut self,
        sink: &mut S,
        stop: &mut C,
        started: Instant,
        tally: &mut RunTally,
    ) -> Result<TerminationReason, SimulationError>
    where
        S: SnapshotSink,
        C: StopCondition,
    {
        if !self.initial_snapshot_done {
            self.emit(sink, SnapshotStage::Initial, true, tally)?;
            self.initial_snapshot_done = true;
        }

        let output = self.options.output.clone();

        loop {
            if self.is_finished() {
                return Ok(TerminationReason::MaxIterations);
            }

            let result = self.step()?;
            if result.outcome.is_updated() {
                tally.updates += 1;
            }

            let iteration = self.iteration;
            let opinions_due = due(output.n_output_agents, iteration);
            let network_due = due(output.n_output_network, iteration);
            if opinions_due || network_due {
                self.emit(sink, SnapshotStage::Periodic, network_due, tally)?;
            }

            if due(output.print_progress, iteration) {
                info!(
                    iteration,
                    spread = self.agents.opinion_spread(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "progress"
                );
            }

            if self.is_finished() {
                return Ok(TerminationReason::MaxIterations);
            }

            let progress = RunProgress {
                iteration,
                iterations_this_run: iteration - tally.start_iteration,
                elapsed: started.elapsed(),
                agents: &self.agents,
            };
            if stop.should_stop(&progress) {
                return Ok(TerminationReason::Stopped);
            }
        }
    }

    fn emit<S: SnapshotSink>(
        &mut self,
        sink: &mut S,
        stage: SnapshotStage,
        include_network: bool,
        tally: &mut RunTally,
    ) -> Result<(), SimulationError> {
        let includes_network = include_network && self.network.is_enabled();
        let view = SnapshotView {
            iteration: self.iteration,
            stage,
            agents: &self.agents,
            network: includes_network.then_some(&self.network),
        };
        sink.write_snapshot(&view)?;
        tally.snapshots += 1;

        debug!(iteration = self.iteration, ?stage, includes_network, "snapshot");
        if self.options.output.record_events {
            self.event_log.log(Event::Snapshot {
                iteration: self.iteration,
                stage,
                includes_network,
            });
        }
        Ok(())
    }

    fn summary(&self, reason: TerminationReason, started: Instant, tally: &RunTally) -> RunSummary {
        RunSummary {
            reason,
            final_iteration: self.iteration,
            iterations_run: self.iteration - tally.start_iteration,
            updates: tally.updates,
            snapshots_written: tally.snapshots,
            opinion_spread: self.agents.opinion_spread(),
            elapsed: started.elapsed(),
        }
    }
}

/// Per-run counters
struct RunTally {
    start_iteration: usize,
    updates: usize,
    snapshots: usize,
}

fn due(interval: Option<usize>, iteration: usize) -> bool {
    matches!(interval, Some(n) if n > 0 && iteration % n == 0)
}

impl std::fmt::Debug for SimulationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationEngine")
            .field("iteration", &self.iteration)
            .field("state", &self.state)
            .field("rng_seed", &self.rng_seed)
            .field("agent_count", &self.agents.size())
            .field("network", &self.network.kind())
            .field("event_count", &self.event_log.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::control::NeverStop;
    use crate::output::{MemorySink, NullSink};

    fn options(seed: u64, max_iterations: Option<usize>) -> SimulationOptions {
        let mut options = SimulationOptions::default();
        options.rng_seed = Some(seed);
        options.model.max_iterations = max_iterations;
        options
    }

    fn engine(max_iterations: Option<usize>) -> SimulationEngine {
        let agents = AgentStore::from_opinions(vec![0.0, 0.1, 0.15, 0.9, 1.0]);
        SimulationEngine::new(options(7, max_iterations), agents, Network::disabled(5)).unwrap()
    }

    fn assert_send<T: Send>() {}

    #[test]
    fn test_engine_is_send() {
        assert_send::<SimulationEngine>();
    }

    #[test]
    fn test_network_size_mismatch_rejected() {
        let agents = AgentStore::from_opinions(vec![0.0, 0.5, 1.0]);
        let result = SimulationEngine::new(options(1, None), agents, Network::disabled(4));
        assert!(matches!(result, Err(SimulationError::Configuration(_))));
    }

    #[test]
    fn test_seed_recorded_when_unset() {
        let agents = AgentStore::from_opinions(vec![0.0, 1.0]);
        let engine =
            SimulationEngine::new(SimulationOptions::default(), agents, Network::disabled(2))
                .unwrap();
        assert_eq!(engine.options().rng_seed, Some(engine.rng_seed()));
    }

    #[test]
    fn test_step_counts_rejected_attempts() {
        let mut engine = engine(None);
        let result = engine.interact(0, 4).unwrap();
        assert_eq!(result.iteration, 1);
        assert!(!result.outcome.is_updated());
        assert_eq!(engine.get_opinion(0).unwrap(), 0.0);
        assert_eq!(engine.get_opinion(4).unwrap(), 1.0);
    }

    #[test]
    fn test_interact_out_of_range_changes_nothing() {
        let mut engine = engine(None);
        let before = engine.agents().clone();
        assert!(matches!(
            engine.interact(0, 5),
            Err(SimulationError::IndexOutOfRange { index: 5, size: 5 })
        ));
        assert_eq!(engine.agents(), &before);
        assert_eq!(engine.iteration(), 0);
    }

    #[test]
    fn test_step_after_limit_is_invalid() {
        let mut engine = engine(Some(2));
        engine.step().unwrap();
        engine.step().unwrap();
        assert!(matches!(engine.step(), Err(SimulationError::InvalidState(_))));
    }

    #[test]
    fn test_run_emits_initial_periodic_final() {
        let mut engine = engine(Some(10));
        engine.options_mut().unwrap().output.n_output_agents = Some(5);
        let mut sink = MemorySink::new();
        let summary = engine.run(&mut sink, NeverStop).unwrap();

        assert_eq!(summary.reason, TerminationReason::MaxIterations);
        assert_eq!(summary.iterations_run, 10);
        assert_eq!(summary.snapshots_written, 4);
        assert_eq!(sink.iterations(), vec![0, 5, 10, 10]);
        assert_eq!(sink.snapshots()[0].stage, SnapshotStage::Initial);
        assert_eq!(sink.snapshots()[3].stage, SnapshotStage::Final);
        assert!(engine.options_mut().is_err());
    }

    #[test]
    fn test_finished_run_returns_immediately() {
        let mut engine = engine(Some(3));
        engine.run(NullSink, NeverStop).unwrap();
        let summary = engine.run(NullSink, NeverStop).unwrap();
        assert_eq!(summary.iterations_run, 0);
        assert_eq!(engine.iteration(), 3);
    }

    #[test]
    fn test_due() {
        assert!(!due(None, 10));
        assert!(due(Some(5), 10));
        assert!(!due(Some(3), 10));
    }
}
