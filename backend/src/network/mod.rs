//! Interaction network
//!
//! Restricts which agent pairs may meet. The three topologies are variants
//! of a single enum so that pair selection is an exhaustive match:
//!
//! - **Disabled**: any two distinct agents may interact. The complete graph
//!   is implicit and never materialised.
//! - **Lattice**: square grid, see [`SquareLattice`].
//! - **Explicit**: arbitrary neighbour lists, see [`ExplicitNetwork`].
//!
//! # Critical Invariants
//!
//! 1. Every neighbour index is `< agent_count()`
//! 2. `agent_count()` equals the agent store size of the run using it
//!    (checked when the engine is constructed)

mod explicit;
mod lattice;

pub use explicit::ExplicitNetwork;
pub use lattice::{integer_sqrt, LatticeBoundary, SquareLattice};

use crate::error::SimulationError;
use serde::{Deserialize, Serialize};

/// Agent adjacency for one run
#[derive(Debug, Clone, PartialEq)]
pub enum Network {
    /// Fully mixed population of `n_agents`
    Disabled { n_agents: usize },
    /// Square lattice
    Lattice(SquareLattice),
    /// Explicit neighbour lists
    Explicit(ExplicitNetwork),
}

/// Topology discriminant, used for logging and snapshot metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkKind {
    Disabled,
    Lattice,
    Explicit,
}

impl std::fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkKind::Disabled => write!(f, "disabled"),
            NetworkKind::Lattice => write!(f, "lattice"),
            NetworkKind::Explicit => write!(f, "explicit"),
        }
    }
}

impl Network {
    /// Fully mixed population
    pub fn disabled(n_agents: usize) -> Self {
        Network::Disabled { n_agents }
    }

    /// Square lattice over `n_agents`
    ///
    /// # Errors
    /// `Configuration` unless `n_agents` is a non-zero perfect square
    ///
    /// # Example
    /// ```
    /// use deffuant_core_rs::{LatticeBoundary, Network};
    ///
    /// let net = Network::square_lattice(16, LatticeBoundary::Open).unwrap();
    /// assert_eq!(net.agent_count(), 16);
    /// assert_eq!(net.neighbors_of(0).unwrap().len(), 2);
    /// assert!(Network::square_lattice(15, LatticeBoundary::Open).is_err());
    /// ```
    pub fn square_lattice(
        n_agents: usize,
        boundary: LatticeBoundary,
    ) -> Result<Self, SimulationError> {
        SquareLattice::new(n_agents, boundary).map(Network::Lattice)
    }

    /// Explicit neighbour lists with optional per-edge weights
    pub fn explicit(
        neighbours: Vec<Vec<usize>>,
        weights: Option<Vec<Vec<f64>>>,
    ) -> Result<Self, SimulationError> {
        ExplicitNetwork::new(neighbours, weights).map(Network::Explicit)
    }

    pub fn kind(&self) -> NetworkKind {
        match self {
            Network::Disabled { .. } => NetworkKind::Disabled,
            Network::Lattice(_) => NetworkKind::Lattice,
            Network::Explicit(_) => NetworkKind::Explicit,
        }
    }

    /// Whether interactions are restricted to listed neighbours
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Network::Disabled { .. })
    }

    pub fn agent_count(&self) -> usize {
        match self {
            Network::Disabled { n_agents } => *n_agents,
            Network::Lattice(lattice) => lattice.agent_count(),
            Network::Explicit(explicit) => explicit.agent_count(),
        }
    }

    /// Neighbours agent `index` may interact with
    ///
    /// Always empty for `Disabled`; the selector then samples from the whole
    /// population instead.
    pub fn neighbors_of(&self, index: usize) -> Result<&[usize], SimulationError> {
        let out_of_range = || SimulationError::IndexOutOfRange {
            index: index as i64,
            size: self.agent_count(),
        };
        match self {
            Network::Disabled { n_agents } => {
                if index < *n_agents {
                    Ok(&[])
                } else {
                    Err(out_of_range())
                }
            }
            Network::Lattice(lattice) => lattice.neighbours(index).ok_or_else(out_of_range),
            Network::Explicit(explicit) => explicit.neighbours(index).ok_or_else(out_of_range),
        }
    }

    /// Per-edge weights of agent `index` (explicit weighted networks only)
    pub fn weights_of(&self, index: usize) -> Option<&[f64]> {
        match self {
            Network::Explicit(explicit) => explicit.weights(index),
            _ => None,
        }
    }

    /// Agents that cannot be paired with anyone
    ///
    /// A neighbour list containing only the agent itself counts as isolated.
    /// Empty for `Disabled` networks with at least two agents.
    pub fn isolated_agents(&self) -> Vec<usize> {
        match self {
            Network::Disabled { n_agents } => {
                if *n_agents < 2 {
                    (0..*n_agents).collect()
                } else {
                    Vec::new()
                }
            }
            _ => (0..self.agent_count())
                .filter(|&i| {
                    self.neighbors_of(i)
                        .map(|list| list.iter().all(|&j| j == i))
                        .unwrap_or(true)
                })
                .collect(),
        }
    }

    /// Check the network against the agent store size
    pub fn ensure_agent_count(&self, expected: usize) -> Result<(), SimulationError> {
        if self.agent_count() != expected {
            return Err(SimulationError::Configuration(format!(
                "{} network has {} agents but the agent store holds {}",
                self.kind(),
                self.agent_count(),
                expected
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_has_no_explicit_neighbours() {
        let net = Network::disabled(5);
        assert_eq!(net.neighbors_of(3).unwrap(), &[] as &[usize]);
        assert!(net.neighbors_of(5).is_err());
        assert!(!net.is_enabled());
    }

    #[test]
    fn test_isolated_agents_explicit() {
        let net = Network::explicit(vec![vec![1], vec![0], vec![2], vec![]], None).unwrap();
        assert_eq!(net.isolated_agents(), vec![2, 3]);
    }

    #[test]
    fn test_ensure_agent_count() {
        let net = Network::disabled(4);
        assert!(net.ensure_agent_count(4).is_ok());
        assert!(matches!(
            net.ensure_agent_count(5),
            Err(SimulationError::Configuration(_))
        ));
    }
}
