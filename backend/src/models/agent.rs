//! Agent model
//!
//! An agent is identified by its position in the [`AgentStore`] and holds a
//! single continuous opinion. The optional `activity` field is auxiliary data
//! carried through agent files; the Deffuant rule never reads it.
//!
//! [`AgentStore`]: crate::models::state::AgentStore

use serde::{Deserialize, Serialize};

/// A single agent in the population
///
/// # Example
/// ```
/// use deffuant_core_rs::Agent;
///
/// let mut agent = Agent::new(0.25);
/// assert_eq!(agent.opinion(), 0.25);
///
/// agent.set_opinion(0.5);
/// assert_eq!(agent.opinion(), 0.5);
/// assert_eq!(agent.activity(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Current opinion (unrestricted real)
    opinion: f64,

    /// Auxiliary engagement value, not interpreted by the engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    activity: Option<f64>,
}

impl Agent {
    /// Create an agent holding `opinion`
    pub fn new(opinion: f64) -> Self {
        Self {
            opinion,
            activity: None,
        }
    }

    /// Create an agent with an auxiliary activity value
    pub fn with_activity(opinion: f64, activity: f64) -> Self {
        Self {
            opinion,
            activity: Some(activity),
        }
    }

    pub fn opinion(&self) -> f64 {
        self.opinion
    }

    pub fn set_opinion(&mut self, opinion: f64) {
        self.opinion = opinion;
    }

    pub fn activity(&self) -> Option<f64> {
        self.activity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_preserved_across_opinion_change() {
        let mut agent = Agent::with_activity(0.1, 3.0);
        agent.set_opinion(0.9);
        assert_eq!(agent.opinion(), 0.9);
        assert_eq!(agent.activity(), Some(3.0));
    }

    #[test]
    fn test_activity_skipped_in_json_when_absent() {
        let json = serde_json::to_string(&Agent::new(0.5)).unwrap();
        assert_eq!(json, r#"{"opinion":0.5}"#);
    }
}
