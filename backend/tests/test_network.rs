//! Tests for interaction topologies and pair selection

use deffuant_core_rs::interaction::{InteractionSelector, RandomSelector};
use deffuant_core_rs::rng::RngManager;
use deffuant_core_rs::{LatticeBoundary, Network, NetworkKind, SimulationError};

// ============================================================================
// Square lattice
// ============================================================================

#[test]
fn test_lattice_16_neighbour_counts() {
    let net = Network::square_lattice(16, LatticeBoundary::Open).unwrap();
    assert_eq!(net.kind(), NetworkKind::Lattice);
    assert_eq!(net.agent_count(), 16);

    // corners
    for i in [0, 3, 12, 15] {
        assert_eq!(net.neighbors_of(i).unwrap().len(), 2, "corner {}", i);
    }
    // edges
    for i in [1, 2, 4, 8, 7, 11, 13, 14] {
        assert_eq!(net.neighbors_of(i).unwrap().len(), 3, "edge {}", i);
    }
    // interior
    for i in [5, 6, 9, 10] {
        assert_eq!(net.neighbors_of(i).unwrap().len(), 4, "interior {}", i);
    }
}

#[test]
fn test_lattice_neighbour_order_is_up_down_left_right() {
    let net = Network::square_lattice(16, LatticeBoundary::Open).unwrap();
    assert_eq!(net.neighbors_of(5).unwrap(), &[1, 9, 4, 6]);
    assert_eq!(net.neighbors_of(0).unwrap(), &[4, 1]);
    assert_eq!(net.neighbors_of(15).unwrap(), &[11, 14]);
}

#[test]
fn test_lattice_15_is_configuration_error() {
    let result = Network::square_lattice(15, LatticeBoundary::Open);
    assert!(matches!(result, Err(SimulationError::Configuration(_))));
}

#[test]
fn test_periodic_lattice_all_have_four() {
    let net = Network::square_lattice(16, LatticeBoundary::Periodic).unwrap();
    for i in 0..16 {
        assert_eq!(net.neighbors_of(i).unwrap().len(), 4);
    }
    assert_eq!(net.neighbors_of(0).unwrap(), &[12, 4, 3, 1]);
}

#[test]
fn test_lattice_neighbours_are_symmetric() {
    for boundary in [LatticeBoundary::Open, LatticeBoundary::Periodic] {
        let net = Network::square_lattice(25, boundary).unwrap();
        for i in 0..25 {
            for &j in net.neighbors_of(i).unwrap() {
                assert!(net.neighbors_of(j).unwrap().contains(&i));
            }
        }
    }
}

#[test]
fn test_neighbors_of_out_of_range() {
    let net = Network::square_lattice(4, LatticeBoundary::Open).unwrap();
    assert!(matches!(
        net.neighbors_of(4),
        Err(SimulationError::IndexOutOfRange { index: 4, size: 4 })
    ));
}

// ============================================================================
// Explicit networks
// ============================================================================

#[test]
fn test_explicit_rejects_out_of_range_neighbour() {
    let result = Network::explicit(vec![vec![1], vec![2]], None);
    assert!(matches!(result, Err(SimulationError::Configuration(_))));
}

#[test]
fn test_explicit_rejects_weight_count_mismatch() {
    let result = Network::explicit(vec![vec![1], vec![0]], Some(vec![vec![1.0], vec![]]));
    assert!(matches!(result, Err(SimulationError::Configuration(_))));
}

#[test]
fn test_explicit_weights_are_kept() {
    let net =
        Network::explicit(vec![vec![1], vec![0]], Some(vec![vec![0.5], vec![2.0]])).unwrap();
    assert_eq!(net.weights_of(1), Some(&[2.0][..]));
}

// ============================================================================
// Pair selection
// ============================================================================

#[test]
fn test_selector_respects_lattice() {
    let net = Network::square_lattice(16, LatticeBoundary::Open).unwrap();
    let mut rng = RngManager::new(2024);
    let mut selector = RandomSelector::new();

    for _ in 0..5000 {
        let (i, j) = selector.next_pair(&net, &mut rng).unwrap();
        assert_ne!(i, j);
        assert!(net.neighbors_of(i).unwrap().contains(&j));
    }
}

#[test]
fn test_selector_skips_isolated_agents() {
    // agent 2 has no neighbours; agent 3 only lists itself
    let net = Network::explicit(vec![vec![1], vec![0], vec![], vec![3]], None).unwrap();
    let mut rng = RngManager::new(8);
    let mut selector = RandomSelector::new();

    for _ in 0..1000 {
        let pair = selector.next_pair(&net, &mut rng).unwrap();
        assert!(pair == (0, 1) || pair == (1, 0), "{:?}", pair);
    }
}

#[test]
fn test_selector_gives_up_on_empty_network() {
    let net = Network::explicit(vec![vec![], vec![], vec![]], None).unwrap();
    let mut rng = RngManager::new(8);
    let mut selector = RandomSelector::with_max_retries(25);

    assert!(matches!(
        selector.next_pair(&net, &mut rng),
        Err(SimulationError::NoValidInteraction { retries: 25 })
    ));
}

#[test]
fn test_selection_is_deterministic_per_seed() {
    let net = Network::square_lattice(9, LatticeBoundary::Periodic).unwrap();
    let draw = |seed: u64| {
        let mut rng = RngManager::new(seed);
        let mut selector = RandomSelector::new();
        (0..200)
            .map(|_| selector.next_pair(&net, &mut rng).unwrap())
            .collect::<Vec<_>>()
    };
    assert_eq!(draw(31), draw(31));
    assert_ne!(draw(31), draw(32));
}
