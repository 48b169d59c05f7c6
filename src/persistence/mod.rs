//! 持久化模块：缓存快照的加载与保存，适配多种存储介质。
//!
//! # Persistence Module
//!
//! The response cache keeps its state in memory; this module moves snapshots
//! of that state to and from durable storage without the cache knowing which
//! medium is behind it.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`PersistencePort`] | `load` / `save` of a full cache snapshot |
//! | [`SnapshotPersistence`] | JSON snapshot stored as one blob in a [`BlobStore`] |
//! | [`BlobStore`] | get/set of opaque bytes keyed by namespace |
//! | [`FileBlobStore`] | `<dir>/<namespace>.json`, atomic rename on write |
//! | [`MemoryBlobStore`] | In-process blobs, for tests and ephemeral caches |
//! | [`NullPersistence`] | Loads nothing, saves nothing |
//! | [`SnapshotWriter`] | Serialized fire-and-forget saves on a background task |
//!
//! ## Failure policy
//!
//! A failed or malformed load yields an empty cache; malformed individual
//! pairs are skipped. Save failures are logged and never reach the caller.

mod blob;
mod snapshot;
mod writer;

pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use snapshot::{decode_snapshot, encode_snapshot, Snapshot, SnapshotPersistence};
pub use writer::SnapshotWriter;

use crate::cache::{CacheEntry, CacheKey};
use crate::Result;
use async_trait::async_trait;

/// Blob namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "ai_response_cache";

#[async_trait]
pub trait PersistencePort: Send + Sync {
    async fn load(&self) -> Result<Snapshot>;
    async fn save(&self, entries: &[(CacheKey, CacheEntry)]) -> Result<()>;
    fn name(&self) -> &'static str;
}

pub struct NullPersistence;
impl NullPersistence {
    pub fn new() -> Self {
        Self
    }
}
impl Default for NullPersistence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistencePort for NullPersistence {
    async fn load(&self) -> Result<Snapshot> {
        Ok(Vec::new())
    }
    async fn save(&self, _: &[(CacheKey, CacheEntry)]) -> Result<()> {
        Ok(())
    }
    fn name(&self) -> &'static str {
        "null"
    }
}
