//! Deffuant bounded-confidence update rule
//!
//! Two agents whose opinions differ by less than the homophily threshold move
//! towards each other by a fraction `mu` of their gap:
//!
//! ```text
//! d = |a - b|
//! d >= threshold  →  (a, b)                             unchanged
//! d <  threshold  →  (a + mu (b - a), b + mu (a - b))
//! ```
//!
//! Both new values are computed from the pre-update pair, so the result does
//! not depend on which agent is focal. At `mu = 0.5` both land exactly on the
//! midpoint and the pair's opinion mass is conserved. Values of `mu` above
//! 0.5 overshoot and may oscillate; they are accepted.

/// Result of applying the rule to one pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionOutcome {
    /// Agents were close enough and both opinions moved
    Updated { new_a: f64, new_b: f64, distance: f64 },
    /// Agents were too far apart; nothing changed
    Rejected { distance: f64 },
}

impl InteractionOutcome {
    pub fn distance(&self) -> f64 {
        match self {
            InteractionOutcome::Updated { distance, .. }
            | InteractionOutcome::Rejected { distance } => *distance,
        }
    }

    pub fn is_updated(&self) -> bool {
        matches!(self, InteractionOutcome::Updated { .. })
    }
}

/// Pure Deffuant update: returns the pair's new opinions
///
/// # Example
/// ```
/// use deffuant_core_rs::interaction::deffuant_update;
///
/// assert_eq!(deffuant_update(0.0, 0.1, 0.2, 0.5), (0.05, 0.05));
/// assert_eq!(deffuant_update(0.0, 0.9, 0.2, 0.5), (0.0, 0.9));
/// ```
pub fn deffuant_update(a: f64, b: f64, homophily_threshold: f64, mu: f64) -> (f64, f64) {
    match interact(a, b, homophily_threshold, mu) {
        InteractionOutcome::Updated { new_a, new_b, .. } => (new_a, new_b),
        InteractionOutcome::Rejected { .. } => (a, b),
    }
}

/// Apply the rule and report whether the pair actually interacted
pub fn interact(a: f64, b: f64, homophily_threshold: f64, mu: f64) -> InteractionOutcome {
    let distance = (a - b).abs();
    // NaN distances compare false and fall through to rejection
    if !(distance < homophily_threshold) {
        return InteractionOutcome::Rejected { distance };
    }
    InteractionOutcome::Updated {
        new_a: a + mu * (b - a),
        new_b: b + mu * (a - b),
        distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_exclusive() {
        let outcome = interact(0.0, 0.25, 0.25, 0.5);
        assert!(!outcome.is_updated());
        assert_eq!(outcome.distance(), 0.25);
    }

    #[test]
    fn test_midpoint_at_half() {
        let (a, b) = deffuant_update(0.2, 0.4, 0.5, 0.5);
        assert!((a - 0.3).abs() < 1e-12);
        assert!((b - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_partial_convergence() {
        let (a, b) = deffuant_update(0.0, 1.0, 2.0, 0.25);
        assert!((a - 0.25).abs() < 1e-12);
        assert!((b - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_overshoot_accepted() {
        let (a, b) = deffuant_update(0.0, 1.0, 2.0, 0.75);
        assert!((a - 0.75).abs() < 1e-12);
        assert!((b - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_zero_threshold_never_updates() {
        assert!(!interact(0.5, 0.5, 0.0, 0.5).is_updated());
    }

    #[test]
    fn test_nan_rejected() {
        assert!(!interact(f64::NAN, 0.5, 1.0, 0.5).is_updated());
    }
}
