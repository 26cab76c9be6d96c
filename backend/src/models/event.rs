//! Event logging for simulation replay and auditing.
//!
//! When `OutputSettings::record_events` is enabled the engine records every
//! interaction attempt, every manual opinion override and every snapshot
//! handed to the output adapter. Events enable:
//! - Verifying that two seeded runs visit the same sequence of pairs
//! - Debugging cluster formation (which pairs were rejected and why)
//! - Auditing manual perturbations made between runs
//!
//! # Example
//!
//! ```rust
//! use deffuant_core_rs::models::{Event, EventLog};
//!
//! let mut log = EventLog::new();
//! log.log(Event::Interaction {
//!     iteration: 1,
//!     focal: 0,
//!     partner: 1,
//!     distance: 0.1,
//!     updated: true,
//! });
//!
//! assert_eq!(log.interaction_pairs(), vec![(0, 1)]);
//! ```

use crate::output::SnapshotStage;

/// Simulation event capturing a state change or an attempted one.
///
/// Every event carries the iteration count at which it happened. Interaction
/// events use the iteration number *after* the step completed (1-based), the
/// others use the counter value at the time they were recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// One interaction attempt between a focal agent and its partner
    Interaction {
        iteration: usize,
        focal: usize,
        partner: usize,
        distance: f64,
        updated: bool,
    },

    /// Opinion overwritten through the manual override accessor
    OpinionOverride {
        iteration: usize,
        agent: usize,
        old_opinion: f64,
        new_opinion: f64,
    },

    /// State handed to the snapshot sink
    Snapshot {
        iteration: usize,
        stage: SnapshotStage,
        includes_network: bool,
    },
}

impl Event {
    /// Iteration count at which the event was recorded
    pub fn iteration(&self) -> usize {
        match self {
            Event::Interaction { iteration, .. }
            | Event::OpinionOverride { iteration, .. }
            | Event::Snapshot { iteration, .. } => *iteration,
        }
    }

    /// Event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::Interaction { .. } => "Interaction",
            Event::OpinionOverride { .. } => "OpinionOverride",
            Event::Snapshot { .. } => "Snapshot",
        }
    }

    /// Whether the event involves agent `index`
    pub fn involves_agent(&self, index: usize) -> bool {
        match self {
            Event::Interaction { focal, partner, .. } => *focal == index || *partner == index,
            Event::OpinionOverride { agent, .. } => *agent == index,
            Event::Snapshot { .. } => false,
        }
    }
}

/// Append-only event log
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Log an event
    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get events recorded at a specific iteration
    pub fn events_at_iteration(&self, iteration: usize) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.iteration() == iteration)
            .collect()
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get events involving a specific agent
    pub fn events_for_agent(&self, index: usize) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.involves_agent(index))
            .collect()
    }

    /// Ordered sequence of `(focal, partner)` pairs that were drawn
    pub fn interaction_pairs(&self) -> Vec<(usize, usize)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Interaction { focal, partner, .. } => Some((*focal, *partner)),
                _ => None,
            })
            .collect()
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interaction(iteration: usize, focal: usize, partner: usize, updated: bool) -> Event {
        Event::Interaction {
            iteration,
            focal,
            partner,
            distance: 0.1,
            updated,
        }
    }

    #[test]
    fn test_event_type() {
        assert_eq!(interaction(1, 0, 1, true).event_type(), "Interaction");
        let event = Event::Snapshot {
            iteration: 0,
            stage: SnapshotStage::Initial,
            includes_network: true,
        };
        assert_eq!(event.event_type(), "Snapshot");
    }

    #[test]
    fn test_event_log_query_by_iteration() {
        let mut log = EventLog::new();
        log.log(interaction(1, 0, 1, true));
        log.log(interaction(2, 2, 3, false));
        log.log(Event::OpinionOverride {
            iteration: 2,
            agent: 3,
            old_opinion: 0.9,
            new_opinion: 0.1,
        });

        assert_eq!(log.events_at_iteration(1).len(), 1);
        assert_eq!(log.events_at_iteration(2).len(), 2);
    }

    #[test]
    fn test_event_log_query_by_agent() {
        let mut log = EventLog::new();
        log.log(interaction(1, 0, 1, true));
        log.log(interaction(2, 1, 2, true));
        log.log(interaction(3, 2, 3, true));

        assert_eq!(log.events_for_agent(1).len(), 2);
        assert_eq!(log.events_for_agent(3).len(), 1);
    }

    #[test]
    fn test_interaction_pairs_skip_other_events() {
        let mut log = EventLog::new();
        log.log(Event::Snapshot {
            iteration: 0,
            stage: SnapshotStage::Initial,
            includes_network: false,
        });
        log.log(interaction(1, 0, 1, true));
        log.log(interaction(2, 3, 2, false));

        assert_eq!(log.interaction_pairs(), vec![(0, 1), (3, 2)]);
        assert_eq!(log.events_of_type("Interaction").len(), 2);

        log.clear();
        assert!(log.is_empty());
    }
}
