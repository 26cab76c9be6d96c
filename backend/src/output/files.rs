//! Directory-based snapshot writer
//!
//! File naming:
//! - `opinions_{iteration}.txt` / `network_{iteration}.txt` for initial and
//!   periodic snapshots
//! - `opinions_final.txt` / `network_final.txt` for the final snapshot
//!
//! A disabled network is never written.

use super::{SnapshotSink, SnapshotStage, SnapshotView};
use crate::error::SimulationError;
use crate::io::{write_agents, write_network};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes snapshots as text files into an existing directory
#[derive(Debug, Clone)]
pub struct DirectoryWriter {
    dir: PathBuf,
    files_written: usize,
}

impl DirectoryWriter {
    /// Writer targeting `dir`, which must already exist
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files_written: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of files written so far
    pub fn files_written(&self) -> usize {
        self.files_written
    }

    fn suffix(view: &SnapshotView<'_>) -> String {
        match view.stage {
            SnapshotStage::Final => "final".to_string(),
            SnapshotStage::Initial | SnapshotStage::Periodic => view.iteration.to_string(),
        }
    }
}

impl SnapshotSink for DirectoryWriter {
    fn write_snapshot(&mut self, view: &SnapshotView<'_>) -> Result<(), SimulationError> {
        let suffix = Self::suffix(view);

        let opinions_path = self.dir.join(format!("opinions_{}.txt", suffix));
        write_agents(&opinions_path, view.agents)?;
        self.files_written += 1;

        if let Some(network) = view.network {
            let network_path = self.dir.join(format!("network_{}.txt", suffix));
            if write_network(&network_path, network)? {
                self.files_written += 1;
            }
        }

        debug!(
            iteration = view.iteration,
            dir = %self.dir.display(),
            "wrote snapshot files"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AgentStore;
    use crate::network::{LatticeBoundary, Network};

    #[test]
    fn test_writes_named_files() {
        let dir = tempfile::tempdir().unwrap();
        let agents = AgentStore::from_opinions(vec![0.0, 0.25, 0.5, 0.75]);
        let network = Network::square_lattice(4, LatticeBoundary::Open).unwrap();
        let mut writer = DirectoryWriter::new(dir.path());

        writer
            .write_snapshot(&SnapshotView {
                iteration: 10,
                stage: SnapshotStage::Periodic,
                agents: &agents,
                network: Some(&network),
            })
            .unwrap();
        writer
            .write_snapshot(&SnapshotView {
                iteration: 12,
                stage: SnapshotStage::Final,
                agents: &agents,
                network: None,
            })
            .unwrap();

        assert!(dir.path().join("opinions_10.txt").exists());
        assert!(dir.path().join("network_10.txt").exists());
        assert!(dir.path().join("opinions_final.txt").exists());
        assert!(!dir.path().join("network_final.txt").exists());
        assert_eq!(writer.files_written(), 3);
    }

    #[test]
    fn test_disabled_network_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let agents = AgentStore::from_opinions(vec![0.0, 1.0]);
        let network = Network::disabled(2);
        let mut writer = DirectoryWriter::new(dir.path());
        writer
            .write_snapshot(&SnapshotView {
                iteration: 0,
                stage: SnapshotStage::Initial,
                agents: &agents,
                network: Some(&network),
            })
            .unwrap();
        assert!(!dir.path().join("network_0.txt").exists());
        assert_eq!(writer.files_written(), 1);
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let agents = AgentStore::from_opinions(vec![0.0, 1.0]);
        let mut writer = DirectoryWriter::new(dir.path().join("does-not-exist"));
        let err = writer
            .write_snapshot(&SnapshotView {
                iteration: 0,
                stage: SnapshotStage::Initial,
                agents: &agents,
                network: None,
            })
            .unwrap_err();
        assert!(matches!(err, SimulationError::Io { .. }));
    }
}
