//! Agent Store
//!
//! Dense, index-addressable container holding every agent of a run.
//!
//! # Critical Invariants
//!
//! 1. **Fixed population**: the store never grows or shrinks during a run
//! 2. **Bounds checking**: every accessor rejects indices outside `[0, size)`
//!    with [`SimulationError::IndexOutOfRange`]

use crate::error::SimulationError;
use crate::models::agent::Agent;
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};

/// Opinion state of the whole population
///
/// # Example
///
/// ```rust
/// use deffuant_core_rs::AgentStore;
///
/// let mut store = AgentStore::from_opinions(vec![0.0, 0.1, 0.9, 1.0]);
/// assert_eq!(store.size(), 4);
///
/// store.set_opinion(2, 0.5).unwrap();
/// assert_eq!(store.get_opinion(2).unwrap(), 0.5);
/// assert!(store.get_opinion(4).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStore {
    agents: Vec<Agent>,
}

impl AgentStore {
    /// Wrap an existing population
    pub fn new(agents: Vec<Agent>) -> Self {
        Self { agents }
    }

    /// Build a population from bare opinion values
    pub fn from_opinions(opinions: Vec<f64>) -> Self {
        Self {
            agents: opinions.into_iter().map(Agent::new).collect(),
        }
    }

    /// Draw `n` opinions uniformly from [0, 1)
    pub fn random_uniform(n: usize, rng: &mut RngManager) -> Self {
        Self {
            agents: (0..n).map(|_| Agent::new(rng.next_f64())).collect(),
        }
    }

    /// Number of agents
    pub fn size(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Map a signed index (as received from bindings or the CLI) into the store
    pub fn resolve_index(&self, index: i64) -> Result<usize, SimulationError> {
        match usize::try_from(index) {
            Ok(i) if i < self.agents.len() => Ok(i),
            _ => Err(SimulationError::IndexOutOfRange {
                index,
                size: self.agents.len(),
            }),
        }
    }

    /// Get reference to an agent
    pub fn get(&self, index: usize) -> Result<&Agent, SimulationError> {
        self.agents.get(index).ok_or(SimulationError::IndexOutOfRange {
            index: index as i64,
            size: self.agents.len(),
        })
    }

    /// Opinion of agent `index`
    pub fn get_opinion(&self, index: usize) -> Result<f64, SimulationError> {
        self.get(index).map(Agent::opinion)
    }

    /// Overwrite the opinion of agent `index`
    ///
    /// The new value is visible to the very next interaction.
    pub fn set_opinion(&mut self, index: usize, opinion: f64) -> Result<(), SimulationError> {
        let size = self.agents.len();
        let agent = self
            .agents
            .get_mut(index)
            .ok_or(SimulationError::IndexOutOfRange {
                index: index as i64,
                size,
            })?;
        agent.set_opinion(opinion);
        Ok(())
    }

    /// Write the outcome of one interaction
    ///
    /// Both indices are validated before either agent is touched, so a
    /// failure never leaves a half-applied pair behind.
    pub fn set_pair(
        &mut self,
        (i, opinion_i): (usize, f64),
        (j, opinion_j): (usize, f64),
    ) -> Result<(), SimulationError> {
        self.get(i)?;
        self.get(j)?;
        self.agents[i].set_opinion(opinion_i);
        self.agents[j].set_opinion(opinion_j);
        Ok(())
    }

    /// All agents in index order
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Iterate over opinions in index order
    pub fn iter_opinions(&self) -> impl Iterator<Item = f64> + '_ {
        self.agents.iter().map(Agent::opinion)
    }

    /// Copy of all opinions in index order
    pub fn opinions(&self) -> Vec<f64> {
        self.iter_opinions().collect()
    }

    /// Sum of all opinions (conserved by the rule at mu = 0.5)
    pub fn total_opinion(&self) -> f64 {
        self.iter_opinions().sum()
    }

    /// Difference between the largest and smallest opinion
    ///
    /// Returns 0.0 for an empty store.
    pub fn opinion_spread(&self) -> f64 {
        let mut iter = self.iter_opinions();
        let Some(first) = iter.next() else {
            return 0.0;
        };
        let (min, max) = iter.fold((first, first), |(lo, hi), x| (lo.min(x), hi.max(x)));
        max - min
    }
}
