//! Background snapshot writer
//!
//! Snapshots are copied on the simulation thread at iteration boundaries and
//! sent over a bounded channel to a dedicated writer thread that owns the
//! inner sink. The loop only blocks when the channel is full.
//!
//! A failure in the inner sink is recorded and reported on the next
//! `write_snapshot`, `flush` or `finish` call; snapshots queued after a
//! failure are dropped. The writer thread is joined on `finish` and on drop.

use super::{OwnedSnapshot, SnapshotSink, SnapshotView};
use crate::error::SimulationError;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Default number of snapshots that may wait in the channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 8;

enum Command {
    Write(OwnedSnapshot),
    Flush(SyncSender<()>),
}

type Failure = Arc<Mutex<Option<String>>>;

/// Runs another sink on a writer thread
pub struct BackgroundSink<S: SnapshotSink + Send + 'static> {
    sender: Option<SyncSender<Command>>,
    worker: Option<JoinHandle<S>>,
    failure: Failure,
}

impl<S: SnapshotSink + Send + 'static> BackgroundSink<S> {
    /// Spawn a writer thread around `inner` with the default capacity
    pub fn new(inner: S) -> Result<Self, SimulationError> {
        Self::with_capacity(inner, DEFAULT_CHANNEL_CAPACITY)
    }

    /// Spawn a writer thread around `inner`
    pub fn with_capacity(inner: S, capacity: usize) -> Result<Self, SimulationError> {
        let (sender, receiver) = mpsc::sync_channel(capacity.max(1));
        let failure: Failure = Arc::new(Mutex::new(None));
        let worker_failure = Arc::clone(&failure);

        let worker = thread::Builder::new()
            .name("snapshot-writer".to_string())
            .spawn(move || writer_loop(inner, receiver, worker_failure))
            .map_err(|e| SimulationError::Output(format!("failed to spawn writer thread: {}", e)))?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            failure,
        })
    }

    fn check_failure(&self) -> Result<(), SimulationError> {
        let failure = self.failure.lock().unwrap_or_else(|p| p.into_inner());
        match failure.as_ref() {
            Some(message) => Err(SimulationError::Output(message.clone())),
            None => Ok(()),
        }
    }

    fn send(&self, command: Command) -> Result<(), SimulationError> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| SimulationError::Output("background writer already finished".to_string()))?;
        sender
            .send(command)
            .map_err(|_| SimulationError::Output("background writer stopped".to_string()))
    }

    /// Drain the queue, stop the writer thread and return the inner sink
    pub fn finish(mut self) -> Result<S, SimulationError> {
        self.sender.take();
        let worker = self
            .worker
            .take()
            .ok_or_else(|| SimulationError::Output("background writer already finished".to_string()))?;
        let inner = worker
            .join()
            .map_err(|_| SimulationError::Output("background writer panicked".to_string()))?;
        self.check_failure()?;
        Ok(inner)
    }
}

fn writer_loop<S: SnapshotSink>(mut inner: S, receiver: Receiver<Command>, failure: Failure) -> S {
    for command in receiver {
        match command {
            Command::Write(snapshot) => {
                // the lock is never held across the inner write
                if failure.lock().unwrap_or_else(|p| p.into_inner()).is_some() {
                    continue;
                }
                if let Err(e) = inner.write_snapshot(&snapshot.view()) {
                    let mut slot = failure.lock().unwrap_or_else(|p| p.into_inner());
                    slot.get_or_insert_with(|| e.to_string());
                }
            }
            Command::Flush(ack) => {
                if let Err(e) = inner.flush() {
                    let mut slot = failure.lock().unwrap_or_else(|p| p.into_inner());
                    slot.get_or_insert_with(|| e.to_string());
                }
                // the requester may have given up waiting
                let _ = ack.send(());
            }
        }
    }
    inner
}

impl<S: SnapshotSink + Send + 'static> SnapshotSink for BackgroundSink<S> {
    fn write_snapshot(&mut self, view: &SnapshotView<'_>) -> Result<(), SimulationError> {
        self.check_failure()?;
        self.send(Command::Write(view.to_owned_snapshot()))
    }

    /// Block until every queued snapshot has been handled
    fn flush(&mut self) -> Result<(), SimulationError> {
        let (ack_sender, ack_receiver) = mpsc::sync_channel(1);
        self.send(Command::Flush(ack_sender))?;
        ack_receiver
            .recv()
            .map_err(|_| SimulationError::Output("background writer stopped".to_string()))?;
        self.check_failure()
    }
}

impl<S: SnapshotSink + Send + 'static> Drop for BackgroundSink<S> {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl<S: SnapshotSink + Send + 'static> std::fmt::Debug for BackgroundSink<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundSink")
            .field("running", &self.worker.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AgentStore;
    use crate::output::{MemorySink, SnapshotStage};
    use std::time::{Duration, Instant};

    fn view(iteration: usize, agents: &AgentStore) -> SnapshotView<'_> {
        SnapshotView {
            iteration,
            stage: SnapshotStage::Periodic,
            agents,
            network: None,
        }
    }

    struct FailingSink;

    impl SnapshotSink for FailingSink {
        fn write_snapshot(&mut self, _view: &SnapshotView<'_>) -> Result<(), SimulationError> {
            Err(SimulationError::Output("disk full".to_string()))
        }
    }

    /// Inner sink that takes a while per snapshot
    struct SlowSink {
        delay: Duration,
        written: usize,
    }

    impl SnapshotSink for SlowSink {
        fn write_snapshot(&mut self, _view: &SnapshotView<'_>) -> Result<(), SimulationError> {
            thread::sleep(self.delay);
            self.written += 1;
            Ok(())
        }
    }

    #[test]
    fn test_slow_inner_sink_does_not_block_sender() {
        let agents = AgentStore::from_opinions(vec![0.1, 0.2]);
        let slow = SlowSink {
            delay: Duration::from_millis(500),
            written: 0,
        };
        let mut sink = BackgroundSink::with_capacity(slow, 8).unwrap();

        sink.write_snapshot(&view(0, &agents)).unwrap();
        // let the writer thread pick up the first snapshot
        thread::sleep(Duration::from_millis(50));

        let started = Instant::now();
        sink.write_snapshot(&view(1, &agents)).unwrap();
        let waited = started.elapsed();
        assert!(
            waited < Duration::from_millis(200),
            "write_snapshot with free channel slots blocked for {:?}",
            waited
        );

        let inner = sink.finish().unwrap();
        assert_eq!(inner.written, 2);
    }

    #[test]
    fn test_snapshots_arrive_in_order() {
        let agents = AgentStore::from_opinions(vec![0.1, 0.2]);
        let mut sink = BackgroundSink::with_capacity(MemorySink::new(), 2).unwrap();
        for i in 0..20 {
            sink.write_snapshot(&view(i, &agents)).unwrap();
        }
        sink.flush().unwrap();
        let inner = sink.finish().unwrap();
        assert_eq!(inner.iterations(), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_failure_surfaces_on_flush() {
        let agents = AgentStore::from_opinions(vec![0.1, 0.2]);
        let mut sink = BackgroundSink::new(FailingSink).unwrap();
        sink.write_snapshot(&view(0, &agents)).unwrap();
        let err = sink.flush().unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert!(sink.write_snapshot(&view(1, &agents)).is_err());
    }

    #[test]
    fn test_failure_surfaces_on_finish() {
        let agents = AgentStore::from_opinions(vec![0.1, 0.2]);
        let mut sink = BackgroundSink::new(FailingSink).unwrap();
        sink.write_snapshot(&view(0, &agents)).unwrap();
        assert!(sink.finish().is_err());
    }
}
