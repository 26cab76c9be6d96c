//! Text formats for agents and networks
//!
//! Both formats are line oriented and comma separated. Lines starting with
//! `#` are comments, blank lines are ignored. Files written by this module
//! can be read back unchanged (floats use Rust's shortest round-trip
//! representation).

pub mod agents;
pub mod network;

pub use agents::{format_agents, load_agents, parse_agents, write_agents};
pub use network::{format_network, load_network, parse_network, write_network};

/// Split a data line into trimmed fields, skipping comments and blanks
pub(crate) fn data_fields(line: &str) -> Option<Vec<&str>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    Some(line.split(',').map(str::trim).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_fields() {
        assert_eq!(data_fields("  # comment"), None);
        assert_eq!(data_fields("   "), None);
        assert_eq!(data_fields("0, 0.5 ,1"), Some(vec!["0", "0.5", "1"]));
    }
}
