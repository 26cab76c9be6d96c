//! Agent file format
//!
//! ```text
//! # idx_agent, opinion[, activity]
//! 0, 0.25
//! 1, 0.75
//! ```
//!
//! A single column holds only the opinion and the index is implied by
//! record order. Every record must have the same number of columns; explicit
//! indices must cover `0..n` exactly once, in any order.

use super::data_fields;
use crate::error::SimulationError;
use crate::models::{Agent, AgentStore};
use std::fs;
use std::path::Path;

fn load_error(line: usize, reason: impl Into<String>) -> SimulationError {
    SimulationError::AgentLoad {
        line,
        reason: reason.into(),
    }
}

fn parse_f64(field: &str, what: &str, line: usize) -> Result<f64, SimulationError> {
    field
        .parse::<f64>()
        .map_err(|_| load_error(line, format!("invalid {} value '{}'", what, field)))
}

/// Parse an agent description
pub fn parse_agents(content: &str) -> Result<AgentStore, SimulationError> {
    let mut columns: Option<usize> = None;
    // (line, explicit index, agent)
    let mut records: Vec<(usize, Option<usize>, Agent)> = Vec::new();

    for (offset, raw) in content.lines().enumerate() {
        let line = offset + 1;
        let Some(fields) = data_fields(raw) else {
            continue;
        };

        let expected = *columns.get_or_insert(fields.len());
        if fields.len() != expected {
            return Err(load_error(
                line,
                format!("expected {} columns, found {}", expected, fields.len()),
            ));
        }

        let record = match fields.as_slice() {
            [opinion] => (line, None, Agent::new(parse_f64(opinion, "opinion", line)?)),
            [idx, opinion] => (
                line,
                Some(parse_index(idx, line)?),
                Agent::new(parse_f64(opinion, "opinion", line)?),
            ),
            [idx, opinion, activity] => (
                line,
                Some(parse_index(idx, line)?),
                Agent::with_activity(
                    parse_f64(opinion, "opinion", line)?,
                    parse_f64(activity, "activity", line)?,
                ),
            ),
            _ => {
                return Err(load_error(
                    line,
                    format!("expected 1 to 3 columns, found {}", fields.len()),
                ))
            }
        };
        records.push(record);
    }

    if records.is_empty() {
        return Err(load_error(0, "no agent records found"));
    }

    let n = records.len();
    let mut slots: Vec<Option<Agent>> = vec![None; n];
    for (position, (line, idx, agent)) in records.into_iter().enumerate() {
        let idx = idx.unwrap_or(position);
        let slot = slots.get_mut(idx).ok_or_else(|| {
            load_error(line, format!("agent index {} out of range for {} agents", idx, n))
        })?;
        if slot.is_some() {
            return Err(load_error(line, format!("duplicate agent index {}", idx)));
        }
        *slot = Some(agent);
    }

    // n records landed in n distinct slots, so every slot is filled
    Ok(AgentStore::new(slots.into_iter().flatten().collect()))
}

fn parse_index(field: &str, line: usize) -> Result<usize, SimulationError> {
    field
        .parse::<usize>()
        .map_err(|_| load_error(line, format!("invalid agent index '{}'", field)))
}

/// Read and parse an agent file
pub fn load_agents(path: impl AsRef<Path>) -> Result<AgentStore, SimulationError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| SimulationError::io(path, e))?;
    parse_agents(&content)
}

/// Render agents in the file format
///
/// The activity column is written only when every agent carries one.
pub fn format_agents(agents: &AgentStore) -> String {
    let with_activity = !agents.is_empty() && agents.agents().iter().all(|a| a.activity().is_some());

    let mut out = String::with_capacity(agents.size() * 24 + 32);
    if with_activity {
        out.push_str("# idx_agent, opinion, activity\n");
    } else {
        out.push_str("# idx_agent, opinion\n");
    }
    for (i, agent) in agents.agents().iter().enumerate() {
        match agent.activity() {
            Some(activity) if with_activity => {
                out.push_str(&format!("{}, {}, {}\n", i, agent.opinion(), activity))
            }
            _ => out.push_str(&format!("{}, {}\n", i, agent.opinion())),
        }
    }
    out
}

/// Write agents to `path`
pub fn write_agents(path: impl AsRef<Path>, agents: &AgentStore) -> Result<(), SimulationError> {
    let path = path.as_ref();
    fs::write(path, format_agents(agents)).map_err(|e| SimulationError::io(path, e))
}
