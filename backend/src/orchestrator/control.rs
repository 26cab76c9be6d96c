//! Run control
//!
//! A [`StopCondition`] is polled by [`SimulationEngine::run`] once after every
//! completed iteration. Returning `true` ends the run with
//! [`TerminationReason::Stopped`]; the engine keeps its state and a later
//! `run` call continues from the same iteration.
//!
//! Unbounded runs (`max_iterations = None`) end only through a stop
//! condition. The engine has no built-in convergence criterion; callers opt
//! in with [`ConvergenceMonitor`].
//!
//! [`SimulationEngine::run`]: crate::orchestrator::SimulationEngine::run
//! [`TerminationReason::Stopped`]: crate::orchestrator::TerminationReason::Stopped

use crate::models::AgentStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// State passed to a stop condition after each iteration
#[derive(Debug, Clone, Copy)]
pub struct RunProgress<'a> {
    /// Iterations completed since the engine was created
    pub iteration: usize,

    /// Iterations completed by the current `run` call
    pub iterations_this_run: usize,

    /// Wall-clock time since the current `run` call started
    pub elapsed: Duration,

    /// Current opinions
    pub agents: &'a AgentStore,
}

/// Decides when an unbounded or long run should end
pub trait StopCondition {
    fn should_stop(&mut self, progress: &RunProgress<'_>) -> bool;

    /// Stop as soon as either condition fires
    fn or<B: StopCondition>(self, other: B) -> AnyOf<Self, B>
    where
        Self: Sized,
    {
        AnyOf(self, other)
    }
}

impl<F> StopCondition for F
where
    F: FnMut(&RunProgress<'_>) -> bool,
{
    fn should_stop(&mut self, progress: &RunProgress<'_>) -> bool {
        self(progress)
    }
}

/// Never stops; the run ends at `max_iterations`
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverStop;

impl StopCondition for NeverStop {
    fn should_stop(&mut self, _progress: &RunProgress<'_>) -> bool {
        false
    }
}

/// Pair of conditions, see [`StopCondition::or`]
#[derive(Debug, Clone)]
pub struct AnyOf<A, B>(A, B);

impl<A: StopCondition, B: StopCondition> StopCondition for AnyOf<A, B> {
    fn should_stop(&mut self, progress: &RunProgress<'_>) -> bool {
        // evaluate both so stateful conditions see every iteration
        let first = self.0.should_stop(progress);
        let second = self.1.should_stop(progress);
        first || second
    }
}

/// Cooperative cancellation flag shared across threads
///
/// # Example
///
/// ```rust
/// use deffuant_core_rs::orchestrator::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// std::thread::spawn(move || handle.cancel()).join().unwrap();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the run to stop after the current iteration
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Clear the flag so a stopped run can be resumed with the same token
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Relaxed);
    }
}

impl StopCondition for CancellationToken {
    fn should_stop(&mut self, _progress: &RunProgress<'_>) -> bool {
        self.is_cancelled()
    }
}

/// Wall-clock limit
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    /// Deadline `timeout` from now
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
        }
    }
}

impl StopCondition for Deadline {
    fn should_stop(&mut self, _progress: &RunProgress<'_>) -> bool {
        Instant::now() >= self.at
    }
}

/// Stops once all opinions lie within `epsilon` of each other
///
/// The spread is O(n), so it is only computed every `check_every`
/// iterations.
#[derive(Debug, Clone)]
pub struct ConvergenceMonitor {
    epsilon: f64,
    check_every: usize,
    converged_at: Option<usize>,
}

impl ConvergenceMonitor {
    pub fn new(epsilon: f64, check_every: usize) -> Self {
        Self {
            epsilon,
            check_every: check_every.max(1),
            converged_at: None,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn check_every(&self) -> usize {
        self.check_every
    }

    /// Iteration at which convergence was detected
    pub fn converged_at(&self) -> Option<usize> {
        self.converged_at
    }
}

impl StopCondition for ConvergenceMonitor {
    fn should_stop(&mut self, progress: &RunProgress<'_>) -> bool {
        if progress.iteration % self.check_every != 0 {
            return false;
        }
        if progress.agents.opinion_spread() < self.epsilon {
            self.converged_at = Some(progress.iteration);
            return true;
        }
        false
    }
}
