//! Pairwise interaction: who meets whom, and how opinions change

pub mod rule;
pub mod selector;

pub use rule::{deffuant_update, interact, InteractionOutcome};
pub use selector::{InteractionSelector, RandomSelector, MAX_SELECTION_RETRIES};
