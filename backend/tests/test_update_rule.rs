//! Tests for the Deffuant update rule
//!
//! Properties are checked with proptest over the unit interval.

use deffuant_core_rs::interaction::{deffuant_update, interact, InteractionOutcome};
use proptest::prelude::*;

const EPS: f64 = 1e-12;

#[test]
fn test_worked_examples() {
    assert_eq!(deffuant_update(0.0, 0.1, 0.2, 0.5), (0.05, 0.05));
    assert_eq!(deffuant_update(0.9, 1.0, 0.2, 0.5), (0.95, 0.95));
    assert_eq!(deffuant_update(0.1, 0.9, 0.2, 0.5), (0.1, 0.9));
}

#[test]
fn test_distance_equal_to_threshold_is_rejected() {
    let outcome = interact(0.25, 0.75, 0.5, 0.5);
    assert_eq!(outcome, InteractionOutcome::Rejected { distance: 0.5 });
}

#[test]
fn test_zero_threshold_rejects_everything() {
    assert_eq!(deffuant_update(0.3, 0.3, 0.0, 0.5), (0.3, 0.3));
}

#[test]
fn test_nan_opinion_is_rejected() {
    assert!(!interact(f64::NAN, 0.5, 0.2, 0.5).is_updated());
}

#[test]
fn test_small_mu_moves_partially() {
    let (a, b) = deffuant_update(0.4, 0.5, 0.2, 0.1);
    assert!((a - 0.41).abs() < EPS);
    assert!((b - 0.49).abs() < EPS);
}

proptest! {
    #[test]
    fn prop_far_pairs_unchanged(
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
        threshold in 0.0f64..=1.0,
        mu in 0.0f64..=0.5,
    ) {
        prop_assume!((a - b).abs() >= threshold);
        prop_assert_eq!(deffuant_update(a, b, threshold, mu), (a, b));
    }

    #[test]
    fn prop_half_mu_meets_at_midpoint(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
        prop_assume!((a - b).abs() < 0.3);
        let (new_a, new_b) = deffuant_update(a, b, 0.3, 0.5);
        let mid = (a + b) / 2.0;
        prop_assert!((new_a - mid).abs() < EPS);
        prop_assert!((new_b - mid).abs() < EPS);
    }

    #[test]
    fn prop_symmetric_in_focal_order(
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
        threshold in 0.0f64..=1.0,
        mu in 0.0f64..=0.5,
    ) {
        let (ab_a, ab_b) = deffuant_update(a, b, threshold, mu);
        let (ba_b, ba_a) = deffuant_update(b, a, threshold, mu);
        prop_assert!((ab_a - ba_a).abs() < EPS);
        prop_assert!((ab_b - ba_b).abs() < EPS);
    }

    #[test]
    fn prop_mass_conserved(
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
        threshold in 0.0f64..=1.0,
        mu in 0.0f64..=1.0,
    ) {
        let (new_a, new_b) = deffuant_update(a, b, threshold, mu);
        prop_assert!(((new_a + new_b) - (a + b)).abs() < EPS);
    }

    #[test]
    fn prop_stable_mu_never_widens_gap(
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
        threshold in 0.0f64..=1.0,
        mu in 0.0f64..=0.5,
    ) {
        let (new_a, new_b) = deffuant_update(a, b, threshold, mu);
        prop_assert!((new_a - new_b).abs() <= (a - b).abs() + EPS);
        let lo = a.min(b) - EPS;
        let hi = a.max(b) + EPS;
        prop_assert!(new_a >= lo && new_a <= hi);
        prop_assert!(new_b >= lo && new_b <= hi);
    }
}
