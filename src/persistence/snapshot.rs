//! JSON snapshot codec and the blob-backed persistence adapter.
//!
//! A snapshot is a JSON array of `[key, entry]` pairs.

use super::blob::BlobStore;
use super::PersistencePort;
use crate::cache::{CacheEntry, CacheKey};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

pub type Snapshot = Vec<(CacheKey, CacheEntry)>;

pub fn encode_snapshot(entries: &[(CacheKey, CacheEntry)]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(entries)?)
}

/// Decode a snapshot, skipping individual pairs that do not parse.
///
/// Fails only when the payload is not a JSON array at all.
pub fn decode_snapshot(bytes: &[u8]) -> Result<Snapshot> {
    let items: Vec<serde_json::Value> = serde_json::from_slice(bytes)?;
    let mut out = Vec::with_capacity(items.len());
    let mut skipped = 0usize;
    for (idx, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<(CacheKey, CacheEntry)>(item) {
            Ok(pair) => out.push(pair),
            Err(e) => {
                skipped += 1;
                warn!(index = idx, error = %e, "skipping malformed cache entry");
            }
        }
    }
    if skipped > 0 {
        warn!(skipped, kept = out.len(), "cache snapshot contained malformed entries");
    }
    Ok(out)
}

/// Persists snapshots as one blob under a fixed namespace.
pub struct SnapshotPersistence {
    blobs: Arc<dyn BlobStore>,
    namespace: String,
}

impl SnapshotPersistence {
    pub fn new(blobs: Arc<dyn BlobStore>, namespace: impl Into<String>) -> Self {
        Self {
            blobs,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

#[async_trait]
impl PersistencePort for SnapshotPersistence {
    async fn load(&self) -> Result<Snapshot> {
        match self.blobs.get(&self.namespace).await? {
            Some(bytes) => decode_snapshot(&bytes),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, entries: &[(CacheKey, CacheEntry)]) -> Result<()> {
        let bytes = encode_snapshot(entries)?;
        self.blobs.set(&self.namespace, &bytes).await
    }

    fn name(&self) -> &'static str {
        self.blobs.name()
    }
}
