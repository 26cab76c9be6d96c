//! Random interaction selector
//!
//! Draws an ordered `(focal, partner)` pair per iteration:
//!
//! 1. focal `i` uniformly from `[0, n)`
//! 2. `Disabled` network: partner uniformly from `[0, n) \ {i}`
//! 3. otherwise: partner uniformly from `neighbors_of(i) \ {i}`; an agent
//!    without usable neighbours causes `i` to be re-drawn, at most
//!    [`MAX_SELECTION_RETRIES`] times
//!
//! Selection is memoryless: each call depends only on the network and the
//! RNG stream, never on previously drawn pairs.

use crate::error::SimulationError;
use crate::network::Network;
use crate::rng::RngManager;

/// Upper bound on focal re-draws before giving up on a degenerate network
pub const MAX_SELECTION_RETRIES: usize = 1000;

/// Source of interacting pairs
///
/// The engine uses [`RandomSelector`]; embedders can supply their own
/// implementation (e.g. replaying a recorded pair sequence).
pub trait InteractionSelector: Send + Sync {
    /// Draw the next ordered pair. Implementations must return `i != j`,
    /// both in `[0, network.agent_count())`.
    fn next_pair(
        &mut self,
        network: &Network,
        rng: &mut RngManager,
    ) -> Result<(usize, usize), SimulationError>;
}

/// Uniform random pair selection honouring the network
#[derive(Debug, Clone, Copy)]
pub struct RandomSelector {
    max_retries: usize,
}

impl RandomSelector {
    pub fn new() -> Self {
        Self {
            max_retries: MAX_SELECTION_RETRIES,
        }
    }

    /// Selector with a custom retry bound (at least one attempt is made)
    pub fn with_max_retries(max_retries: usize) -> Self {
        Self {
            max_retries: max_retries.max(1),
        }
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }
}

impl Default for RandomSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionSelector for RandomSelector {
    fn next_pair(
        &mut self,
        network: &Network,
        rng: &mut RngManager,
    ) -> Result<(usize, usize), SimulationError> {
        let n = network.agent_count();
        if n < 2 {
            return Err(SimulationError::NoValidInteraction { retries: 0 });
        }

        match network {
            Network::Disabled { .. } => {
                let i = rng.index(n);
                // draw from n-1 slots and skip over i
                let mut j = rng.index(n - 1);
                if j >= i {
                    j += 1;
                }
                Ok((i, j))
            }
            Network::Lattice(_) | Network::Explicit(_) => {
                for _ in 0..self.max_retries {
                    let i = rng.index(n);
                    let neighbours = network.neighbors_of(i)?;
                    let usable = neighbours.iter().filter(|&&j| j != i).count();
                    if usable == 0 {
                        continue;
                    }
                    let pick = rng.index(usable);
                    if let Some(&j) = neighbours.iter().filter(|&&j| j != i).nth(pick) {
                        return Ok((i, j));
                    }
                }
                Err(SimulationError::NoValidInteraction {
                    retries: self.max_retries,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::LatticeBoundary;

    #[test]
    fn test_disabled_never_pairs_agent_with_itself() {
        let net = Network::disabled(3);
        let mut rng = RngManager::new(5);
        let mut selector = RandomSelector::new();
        for _ in 0..2000 {
            let (i, j) = selector.next_pair(&net, &mut rng).unwrap();
            assert_ne!(i, j);
            assert!(i < 3 && j < 3);
        }
    }

    #[test]
    fn test_disabled_covers_all_partners() {
        let net = Network::disabled(4);
        let mut rng = RngManager::new(11);
        let mut selector = RandomSelector::new();
        let mut seen = [[false; 4]; 4];
        for _ in 0..5000 {
            let (i, j) = selector.next_pair(&net, &mut rng).unwrap();
            seen[i][j] = true;
        }
        for (i, row) in seen.iter().enumerate() {
            for (j, hit) in row.iter().enumerate() {
                assert_eq!(*hit, i != j, "pair ({}, {})", i, j);
            }
        }
    }

    #[test]
    fn test_lattice_pairs_are_neighbours() {
        let net = Network::square_lattice(16, LatticeBoundary::Open).unwrap();
        let mut rng = RngManager::new(3);
        let mut selector = RandomSelector::new();
        for _ in 0..1000 {
            let (i, j) = selector.next_pair(&net, &mut rng).unwrap();
            assert!(net.neighbors_of(i).unwrap().contains(&j));
        }
    }

    #[test]
    fn test_isolated_agents_are_redrawn() {
        // only agents 0 and 1 are connected
        let net = Network::explicit(vec![vec![1], vec![0], vec![], vec![3]], None).unwrap();
        let mut rng = RngManager::new(8);
        let mut selector = RandomSelector::new();
        for _ in 0..500 {
            let pair = selector.next_pair(&net, &mut rng).unwrap();
            assert!(pair == (0, 1) || pair == (1, 0));
        }
    }

    #[test]
    fn test_fully_isolated_network_exhausts_retries() {
        let net = Network::explicit(vec![vec![], vec![1], vec![]], None).unwrap();
        let mut rng = RngManager::new(1);
        let mut selector = RandomSelector::with_max_retries(25);
        let err = selector.next_pair(&net, &mut rng).unwrap_err();
        assert!(matches!(err, SimulationError::NoValidInteraction { retries: 25 }));
    }

    #[test]
    fn test_single_agent_population_has_no_pair() {
        let net = Network::disabled(1);
        let mut rng = RngManager::new(1);
        assert!(RandomSelector::new().next_pair(&net, &mut rng).is_err());
    }
}
