//! Snapshot output adapter
//!
//! The engine never decides file names or formats. At iteration boundaries
//! it hands a read-only [`SnapshotView`] to a [`SnapshotSink`]; sinks decide
//! what to do with it:
//!
//! - [`DirectoryWriter`]: writes agent/network text files into a directory
//! - [`BackgroundSink`]: copies the view and forwards it to another sink on a
//!   writer thread, so file I/O never stalls the interaction loop
//! - [`MemorySink`]: keeps owned copies in memory
//! - [`NullSink`]: discards everything

mod background;
mod files;

pub use background::BackgroundSink;
pub use files::DirectoryWriter;

use crate::error::SimulationError;
use crate::models::AgentStore;
use crate::network::Network;

/// Point in the run at which a snapshot was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotStage {
    /// Before the first interaction of a run
    Initial,
    /// Periodic snapshot at a configured interval
    Periodic,
    /// After the run terminated (successfully or not)
    Final,
}

/// Read-only view of the state at an iteration boundary
#[derive(Debug, Clone, Copy)]
pub struct SnapshotView<'a> {
    pub iteration: usize,
    pub stage: SnapshotStage,
    pub agents: &'a AgentStore,
    /// Present only when this snapshot should include the network
    pub network: Option<&'a Network>,
}

impl SnapshotView<'_> {
    /// Copy the view into an owned snapshot
    pub fn to_owned_snapshot(&self) -> OwnedSnapshot {
        OwnedSnapshot {
            iteration: self.iteration,
            stage: self.stage,
            agents: self.agents.clone(),
            network: self.network.cloned(),
        }
    }
}

/// Owned copy of a [`SnapshotView`]
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedSnapshot {
    pub iteration: usize,
    pub stage: SnapshotStage,
    pub agents: AgentStore,
    pub network: Option<Network>,
}

impl OwnedSnapshot {
    pub fn view(&self) -> SnapshotView<'_> {
        SnapshotView {
            iteration: self.iteration,
            stage: self.stage,
            agents: &self.agents,
            network: self.network.as_ref(),
        }
    }
}

/// Receiver of periodic state snapshots
pub trait SnapshotSink {
    /// Handle one snapshot. An error aborts the run.
    fn write_snapshot(&mut self, view: &SnapshotView<'_>) -> Result<(), SimulationError>;

    /// Called once at the end of every `run`, after the final snapshot
    fn flush(&mut self) -> Result<(), SimulationError> {
        Ok(())
    }
}

impl<S: SnapshotSink + ?Sized> SnapshotSink for &mut S {
    fn write_snapshot(&mut self, view: &SnapshotView<'_>) -> Result<(), SimulationError> {
        (**self).write_snapshot(view)
    }

    fn flush(&mut self) -> Result<(), SimulationError> {
        (**self).flush()
    }
}

impl<S: SnapshotSink + ?Sized> SnapshotSink for Box<S> {
    fn write_snapshot(&mut self, view: &SnapshotView<'_>) -> Result<(), SimulationError> {
        (**self).write_snapshot(view)
    }

    fn flush(&mut self) -> Result<(), SimulationError> {
        (**self).flush()
    }
}

/// Sink that discards every snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn write_snapshot(&mut self, _view: &SnapshotView<'_>) -> Result<(), SimulationError> {
        Ok(())
    }
}

/// Sink that keeps every snapshot in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    snapshots: Vec<OwnedSnapshot>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> &[OwnedSnapshot] {
        &self.snapshots
    }

    /// Iterations at which snapshots were taken, in order
    pub fn iterations(&self) -> Vec<usize> {
        self.snapshots.iter().map(|s| s.iteration).collect()
    }
}

impl SnapshotSink for MemorySink {
    fn write_snapshot(&mut self, view: &SnapshotView<'_>) -> Result<(), SimulationError> {
        self.snapshots.push(view.to_owned_snapshot());
        Ok(())
    }
}
