//! Explicit adjacency loaded from a network description
//!
//! Each agent holds an ordered list of incoming neighbours and, optionally,
//! one weight per neighbour. Weights are carried so that a loaded network can
//! be written back unchanged; the Deffuant rule does not use them.

use crate::error::SimulationError;

#[derive(Debug, Clone, PartialEq)]
pub struct ExplicitNetwork {
    neighbours: Vec<Vec<usize>>,
    weights: Option<Vec<Vec<f64>>>,
}

impl ExplicitNetwork {
    /// Validate and wrap neighbour lists
    ///
    /// Every index must be smaller than `neighbours.len()`. When weights are
    /// supplied there must be exactly one weight per neighbour.
    pub fn new(
        neighbours: Vec<Vec<usize>>,
        weights: Option<Vec<Vec<f64>>>,
    ) -> Result<Self, SimulationError> {
        let n = neighbours.len();
        for (i, list) in neighbours.iter().enumerate() {
            if let Some(&bad) = list.iter().find(|&&j| j >= n) {
                return Err(SimulationError::Configuration(format!(
                    "agent {} lists neighbour {} but the network has {} agents",
                    i, bad, n
                )));
            }
        }

        if let Some(w) = &weights {
            if w.len() != n {
                return Err(SimulationError::Configuration(format!(
                    "{} weight rows supplied for {} agents",
                    w.len(),
                    n
                )));
            }
            for (i, (list, row)) in neighbours.iter().zip(w).enumerate() {
                if list.len() != row.len() {
                    return Err(SimulationError::Configuration(format!(
                        "agent {} has {} neighbours but {} weights",
                        i,
                        list.len(),
                        row.len()
                    )));
                }
            }
        }

        Ok(Self {
            neighbours,
            weights,
        })
    }

    pub fn agent_count(&self) -> usize {
        self.neighbours.len()
    }

    pub fn neighbours(&self, index: usize) -> Option<&[usize]> {
        self.neighbours.get(index).map(Vec::as_slice)
    }

    /// Per-edge weights of agent `index`, if the network carries weights
    pub fn weights(&self, index: usize) -> Option<&[f64]> {
        self.weights
            .as_ref()
            .and_then(|w| w.get(index))
            .map(Vec::as_slice)
    }

    pub fn has_weights(&self) -> bool {
        self.weights.is_some()
    }

    /// Total number of directed edges
    pub fn edge_count(&self) -> usize {
        self.neighbours.iter().map(Vec::len).sum()
    }
}
