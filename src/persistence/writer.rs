//! Background snapshot writer.
//!
//! Mutations hand snapshots over without waiting. A single task applies them
//! in submission order, one `save` at a time, and collapses a backlog down to
//! the newest snapshot.

use super::snapshot::Snapshot;
use super::PersistencePort;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

enum Command {
    Save(Snapshot),
    Flush(oneshot::Sender<()>),
}

pub struct SnapshotWriter {
    tx: mpsc::UnboundedSender<Command>,
}

impl SnapshotWriter {
    /// Start the writer task. Must be called from within a tokio runtime.
    ///
    /// The task exits once the writer is dropped and its queue is drained.
    pub fn spawn(port: Arc<dyn PersistencePort>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(port, rx));
        Self { tx }
    }

    pub fn submit(&self, snapshot: Snapshot) {
        if self.tx.send(Command::Save(snapshot)).is_err() {
            warn!("snapshot writer is gone, dropping cache snapshot");
        }
    }

    /// Wait until every snapshot submitted before this call has been saved.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}

async fn run(port: Arc<dyn PersistencePort>, mut rx: mpsc::UnboundedReceiver<Command>) {
    while let Some(cmd) = rx.recv().await {
        let mut latest = None;
        let mut waiters = Vec::new();
        match cmd {
            Command::Save(s) => latest = Some(s),
            Command::Flush(w) => waiters.push(w),
        }
        while let Ok(next) = rx.try_recv() {
            match next {
                Command::Save(s) => latest = Some(s),
                Command::Flush(w) => waiters.push(w),
            }
        }
        if let Some(snapshot) = latest {
            let n = snapshot.len();
            match port.save(&snapshot).await {
                Ok(()) => debug!(entries = n, backend = port.name(), "cache snapshot saved"),
                Err(e) => warn!(error = %e, backend = port.name(), "failed to save cache snapshot"),
            }
        }
        for w in waiters {
            let _ = w.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheEntry, CacheKey};
    use crate::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        saves: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl PersistencePort for Recording {
        async fn load(&self) -> Result<Snapshot> {
            Ok(Vec::new())
        }
        async fn save(&self, entries: &[(CacheKey, CacheEntry)]) -> Result<()> {
            self.saves.lock().unwrap().push(entries.len());
            Ok(())
        }
        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn snapshot(n: usize) -> Snapshot {
        (0..n)
            .map(|i| (CacheKey::from(format!("k{i}")), CacheEntry::new("r", 1, i as u64)))
            .collect()
    }

    #[tokio::test]
    async fn test_flush_waits_for_latest_snapshot() {
        let port = Arc::new(Recording::default());
        let writer = SnapshotWriter::spawn(port.clone());
        for n in 1..=5 {
            writer.submit(snapshot(n));
        }
        writer.flush().await;
        let saves = port.saves.lock().unwrap().clone();
        assert!(!saves.is_empty());
        assert!(saves.len() <= 5);
        assert_eq!(saves.last(), Some(&5));
        assert!(saves.windows(2).all(|w| w[0] < w[1]), "saves out of order: {saves:?}");
    }

    #[tokio::test]
    async fn test_flush_without_pending_saves_returns() {
        let port = Arc::new(Recording::default());
        let writer = SnapshotWriter::spawn(port.clone());
        writer.flush().await;
        assert!(port.saves.lock().unwrap().is_empty());
    }
}
