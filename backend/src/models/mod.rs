//! Domain models for the opinion dynamics engine

pub mod agent;
pub mod event;
pub mod state;

// Re-exports
pub use agent::Agent;
pub use event::{Event, EventLog};
pub use state::AgentStore;
