//! Square lattice topology
//!
//! Agents are laid out row-major on a `side × side` grid; agent `i` sits at
//! row `i / side`, column `i % side`. Neighbour lists are precomputed in the
//! fixed order up, down, left, right so that selection is deterministic for a
//! given RNG stream.

use crate::error::SimulationError;
use serde::{Deserialize, Serialize};

/// Behaviour at the lattice border
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatticeBoundary {
    /// Hard edges: corners have 2 neighbours, edges 3, interior agents 4
    #[default]
    Open,
    /// Toroidal wraparound: every agent has up to 4 distinct neighbours
    Periodic,
}

/// Precomputed square lattice adjacency
#[derive(Debug, Clone, PartialEq)]
pub struct SquareLattice {
    side: usize,
    boundary: LatticeBoundary,
    neighbours: Vec<Vec<usize>>,
}

impl SquareLattice {
    /// Build a lattice over `n_agents`, which must be a non-zero perfect square
    pub fn new(n_agents: usize, boundary: LatticeBoundary) -> Result<Self, SimulationError> {
        let side = integer_sqrt(n_agents).ok_or_else(|| {
            SimulationError::Configuration(format!(
                "square lattice requires a perfect-square agent count, got {}",
                n_agents
            ))
        })?;

        let neighbours = (0..n_agents)
            .map(|i| lattice_neighbours(i, side, boundary))
            .collect();

        Ok(Self {
            side,
            boundary,
            neighbours,
        })
    }

    /// Number of agents along one side
    pub fn side(&self) -> usize {
        self.side
    }

    pub fn boundary(&self) -> LatticeBoundary {
        self.boundary
    }

    pub fn agent_count(&self) -> usize {
        self.neighbours.len()
    }

    pub fn neighbours(&self, index: usize) -> Option<&[usize]> {
        self.neighbours.get(index).map(Vec::as_slice)
    }
}

/// Exact integer square root, `None` when `n` is zero or not a perfect square
pub fn integer_sqrt(n: usize) -> Option<usize> {
    if n == 0 {
        return None;
    }
    let mut root = (n as f64).sqrt() as usize;
    // f64 rounding can be off by one for very large n
    while root * root > n {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    (root * root == n).then_some(root)
}

fn lattice_neighbours(index: usize, side: usize, boundary: LatticeBoundary) -> Vec<usize> {
    let row = index / side;
    let col = index % side;
    let at = |r: usize, c: usize| r * side + c;

    let candidates: [Option<usize>; 4] = match boundary {
        LatticeBoundary::Open => [
            (row > 0).then(|| at(row - 1, col)),
            (row + 1 < side).then(|| at(row + 1, col)),
            (col > 0).then(|| at(row, col - 1)),
            (col + 1 < side).then(|| at(row, col + 1)),
        ],
        LatticeBoundary::Periodic => [
            Some(at((row + side - 1) % side, col)),
            Some(at((row + 1) % side, col)),
            Some(at(row, (col + side - 1) % side)),
            Some(at(row, (col + 1) % side)),
        ],
    };

    let mut out = Vec::with_capacity(4);
    for j in candidates.into_iter().flatten() {
        // small periodic grids wrap onto themselves or repeat a neighbour
        if j != index && !out.contains(&j) {
            out.push(j);
        }
    }
    out
}
