//! Network file format
//!
//! ```text
//! # idx_agent, n_neighbours_in, indices_neighbours_in[...], weights_in[...]
//! 0, 2, 1, 2, 0.5, 0.5
//! 1, 1, 0, 1.0
//! 2, 0
//! ```
//!
//! Each row lists the incoming neighbours of one agent, optionally followed
//! by one weight per neighbour. Either all non-empty rows carry weights or
//! none do. Rows may appear in any order but must cover `0..n` exactly once.

use super::data_fields;
use crate::error::SimulationError;
use crate::network::Network;
use std::fs;
use std::path::Path;

fn load_error(line: usize, reason: impl Into<String>) -> SimulationError {
    SimulationError::NetworkLoad {
        line,
        reason: reason.into(),
    }
}

struct Row {
    line: usize,
    idx: usize,
    neighbours: Vec<usize>,
    weights: Option<Vec<f64>>,
}

fn parse_row(fields: &[&str], line: usize) -> Result<Row, SimulationError> {
    let [idx, count, rest @ ..] = fields else {
        return Err(load_error(
            line,
            "expected at least agent index and neighbour count",
        ));
    };

    let idx = idx
        .parse::<usize>()
        .map_err(|_| load_error(line, format!("invalid agent index '{}'", idx)))?;
    let count = count
        .parse::<usize>()
        .map_err(|_| load_error(line, format!("invalid neighbour count '{}'", count)))?;

    let weighted = if rest.len() == count {
        false
    } else if rest.len() == 2 * count {
        true
    } else {
        return Err(load_error(
            line,
            format!(
                "agent {} declares {} neighbours but has {} trailing fields",
                idx,
                count,
                rest.len()
            ),
        ));
    };

    let neighbours = rest[..count]
        .iter()
        .map(|f| {
            f.parse::<usize>()
                .map_err(|_| load_error(line, format!("invalid neighbour index '{}'", f)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let weights = if weighted && count > 0 {
        Some(
            rest[count..]
                .iter()
                .map(|f| {
                    f.parse::<f64>()
                        .map_err(|_| load_error(line, format!("invalid weight '{}'", f)))
                })
                .collect::<Result<Vec<_>, _>>()?,
        )
    } else {
        None
    };

    Ok(Row {
        line,
        idx,
        neighbours,
        weights,
    })
}

/// Parse a network description
///
/// When `expected_agents` is given the network must describe exactly that
/// many agents (normally the size of the agent store it will be paired with).
pub fn parse_network(
    content: &str,
    expected_agents: Option<usize>,
) -> Result<Network, SimulationError> {
    let mut rows = Vec::new();
    for (offset, raw) in content.lines().enumerate() {
        if let Some(fields) = data_fields(raw) {
            rows.push(parse_row(&fields, offset + 1)?);
        }
    }

    if rows.is_empty() {
        return Err(load_error(0, "no network rows found"));
    }

    let n = rows.len();
    if let Some(expected) = expected_agents {
        if n != expected {
            return Err(load_error(
                0,
                format!("network describes {} agents but {} were expected", n, expected),
            ));
        }
    }

    // weighted-ness is decided by the first row that has neighbours
    let weighted = rows
        .iter()
        .find(|r| !r.neighbours.is_empty())
        .map(|r| r.weights.is_some())
        .unwrap_or(false);

    let mut neighbours: Vec<Option<Vec<usize>>> = vec![None; n];
    let mut weights: Vec<Vec<f64>> = vec![Vec::new(); n];

    for row in rows {
        if row.idx >= n {
            return Err(load_error(
                row.line,
                format!("agent index {} out of range for {} agents", row.idx, n),
            ));
        }
        if let Some(&bad) = row.neighbours.iter().find(|&&j| j >= n) {
            return Err(load_error(
                row.line,
                format!("neighbour index {} out of range for {} agents", bad, n),
            ));
        }
        if !row.neighbours.is_empty() && row.weights.is_some() != weighted {
            return Err(load_error(
                row.line,
                "rows must either all carry weights or all omit them",
            ));
        }
        if neighbours[row.idx].is_some() {
            return Err(load_error(
                row.line,
                format!("duplicate row for agent {}", row.idx),
            ));
        }
        weights[row.idx] = row.weights.unwrap_or_default();
        neighbours[row.idx] = Some(row.neighbours);
    }

    // n rows with distinct in-range indices fill every slot
    let neighbours: Vec<Vec<usize>> = neighbours.into_iter().flatten().collect();
    let weights = weighted.then_some(weights);

    Network::explicit(neighbours, weights).map_err(|e| load_error(0, e.to_string()))
}

/// Read and parse a network file
pub fn load_network(
    path: impl AsRef<Path>,
    expected_agents: Option<usize>,
) -> Result<Network, SimulationError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| SimulationError::io(path, e))?;
    parse_network(&content, expected_agents)
}

/// Render a network in the file format
///
/// Returns `None` for a disabled network, whose complete graph is never
/// materialised.
pub fn format_network(network: &Network) -> Option<String> {
    if !network.is_enabled() {
        return None;
    }

    let mut out = String::from("# idx_agent, n_neighbours_in, indices_neighbours_in[...], weights_in[...]\n");
    for i in 0..network.agent_count() {
        let neighbours = network.neighbors_of(i).unwrap_or(&[]);
        let mut fields = vec![i.to_string(), neighbours.len().to_string()];
        fields.extend(neighbours.iter().map(|j| j.to_string()));
        if let Some(weights) = network.weights_of(i) {
            fields.extend(weights.iter().map(|w| w.to_string()));
        }
        out.push_str(&fields.join(", "));
        out.push('\n');
    }
    Some(out)
}

/// Write a network to `path`
///
/// Returns `false` (and writes nothing) for a disabled network.
pub fn write_network(path: impl AsRef<Path>, network: &Network) -> Result<bool, SimulationError> {
    let path = path.as_ref();
    match format_network(network) {
        Some(text) => {
            fs::write(path, text).map_err(|e| SimulationError::io(path, e))?;
            Ok(true)
        }
        None => Ok(false),
    }
}
