//! Cache manager.

use super::clock::{Clock, SystemClock};
use super::key::{CacheKey, CacheKeyGenerator};
use super::stats::CacheStats;
use super::store::{CacheEntry, CacheStore};
use crate::config::CacheConfig;
use crate::persistence::{PersistencePort, SnapshotWriter};
use crate::tokens::TokenPricing;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Thread-safe response cache.
///
/// All store operations run under one mutex. Mutations (`put`, `clear`, a
/// sweep that removed something) enqueue a snapshot to the background writer
/// while the lock is still held, so snapshots reach storage in mutation order.
/// Hit counters and lazily reaped entries ride along with the next snapshot.
pub struct ResponseCache {
    store: Mutex<CacheStore>,
    keys: CacheKeyGenerator,
    pricing: TokenPricing,
    clock: Arc<dyn Clock>,
    writer: Option<SnapshotWriter>,
}

impl ResponseCache {
    /// Purely in-memory cache on the system clock.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            store: Mutex::new(CacheStore::new(config.capacity, config.ttl())),
            keys: key_generator(config),
            pricing: config.pricing(),
            clock: Arc::new(SystemClock),
            writer: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Load the persisted snapshot and keep saving to `persistence`.
    ///
    /// A failed load is logged and the cache starts empty. Expired entries
    /// from the snapshot are swept straight away. Must be called from within
    /// a tokio runtime.
    pub async fn open(
        config: &CacheConfig,
        persistence: Arc<dyn PersistencePort>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut store = CacheStore::new(config.capacity, config.ttl());
        match persistence.load().await {
            Ok(entries) => {
                let loaded = entries.len();
                store.restore(entries);
                info!(
                    loaded,
                    resident = store.len(),
                    backend = persistence.name(),
                    "response cache loaded"
                );
            }
            Err(e) => {
                warn!(error = %e, backend = persistence.name(), "failed to load response cache, starting empty");
            }
        }
        let cache = Self {
            store: Mutex::new(store),
            keys: key_generator(config),
            pricing: config.pricing(),
            clock,
            writer: Some(SnapshotWriter::spawn(persistence)),
        };
        cache.cleanup_expired();
        cache
    }

    pub fn keys(&self) -> &CacheKeyGenerator {
        &self.keys
    }

    pub fn key_for(&self, system_prompt: Option<&str>, user_prompt: &str) -> CacheKey {
        self.keys.generate(system_prompt, user_prompt)
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let now = self.clock.now_millis();
        let hit = self.lock().get(key, now);
        match &hit {
            Some(e) => debug!(key = %key.short(), hits = e.hit_count, "cache hit"),
            None => debug!(key = %key.short(), "cache miss"),
        }
        hit
    }

    pub fn put(&self, key: CacheKey, response: impl Into<String>, token_count: u64) {
        let now = self.clock.now_millis();
        let mut store = self.lock();
        if let Some(evicted) = store.put(key, response, token_count, now) {
            debug!(evicted = %evicted.short(), "cache at capacity, evicted oldest entry");
        }
        self.persist(&store);
    }

    /// Hash and look up in one step.
    pub fn get_prompt(&self, user_prompt: &str, system_prompt: Option<&str>) -> Option<String> {
        self.get(&self.key_for(system_prompt, user_prompt))
            .map(|e| e.response)
    }

    /// Hash and store in one step.
    pub fn put_prompt(
        &self,
        user_prompt: &str,
        response: impl Into<String>,
        token_count: u64,
        system_prompt: Option<&str>,
    ) {
        self.put(self.key_for(system_prompt, user_prompt), response, token_count);
    }

    pub fn clear(&self) -> usize {
        let mut store = self.lock();
        let removed = store.clear();
        self.persist(&store);
        info!(removed, "response cache cleared");
        removed
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut store = self.lock();
        let removed = store.cleanup_expired(now);
        if removed > 0 {
            self.persist(&store);
            info!(removed, "expired cache entries swept");
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let store = self.lock();
        CacheStats::from_entries(store.entries().map(|(_, e)| e), &self.pricing)
    }

    pub fn snapshot(&self) -> Vec<(CacheKey, CacheEntry)> {
        self.lock().snapshot()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    pub fn ttl(&self) -> Duration {
        self.lock().ttl()
    }

    pub fn is_persistent(&self) -> bool {
        self.writer.is_some()
    }

    /// Wait for all snapshots queued so far to be written.
    pub async fn flush(&self) {
        if let Some(w) = &self.writer {
            w.flush().await;
        }
    }

    fn persist(&self, store: &CacheStore) {
        if let Some(w) = &self.writer {
            w.submit(store.snapshot());
        }
    }

    // Every mutation is a single map operation, so a poisoned lock still
    // guards a consistent store.
    fn lock(&self) -> MutexGuard<'_, CacheStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn key_generator(config: &CacheConfig) -> CacheKeyGenerator {
    if config.namespace_keys {
        CacheKeyGenerator::new().with_namespace(config.namespace.clone())
    } else {
        CacheKeyGenerator::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::persistence::{MemoryBlobStore, SnapshotPersistence};

    fn cache_with(capacity: usize, ttl_secs: u64) -> (ResponseCache, ManualClock) {
        let clock = ManualClock::new(1_000_000);
        let cfg = CacheConfig::default()
            .with_capacity(capacity)
            .with_ttl(Duration::from_secs(ttl_secs));
        let cache = ResponseCache::new(&cfg).with_clock(Arc::new(clock.clone()));
        (cache, clock)
    }

    #[test]
    fn test_get_put_roundtrip() {
        let (cache, _) = cache_with(10, 1);
        let key = cache.key_for(None, "hello");
        assert!(cache.get(&key).is_none());
        cache.put(key.clone(), "R", 42);
        let hit = cache.get(&key).unwrap();
        assert_eq!((hit.response.as_str(), hit.token_count, hit.hit_count), ("R", 42, 1));
        assert_eq!(cache.get(&key).unwrap().hit_count, 2);
    }

    #[test]
    fn test_ttl_expiry_with_manual_clock() {
        let (cache, clock) = cache_with(10, 1);
        cache.put_prompt("p", "r", 5, None);
        clock.advance_millis(1_001);
        assert_eq!(cache.get_prompt("p", None), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_fractional_ttl_reaches_the_store() {
        let clock = ManualClock::new(0);
        let cfg = CacheConfig::default().with_ttl(Duration::from_millis(1_500));
        let cache = ResponseCache::new(&cfg).with_clock(Arc::new(clock.clone()));
        assert_eq!(cache.ttl(), Duration::from_millis(1_500));

        cache.put_prompt("p", "r", 5, None);
        clock.advance_millis(1_200);
        assert_eq!(cache.get_prompt("p", None).as_deref(), Some("r"));
        clock.advance_millis(301);
        assert_eq!(cache.get_prompt("p", None), None);
    }

    #[test]
    fn test_sweep() {
        let (cache, clock) = cache_with(10, 1);
        cache.put_prompt("a", "r", 5, None);
        clock.advance_millis(600);
        cache.put_prompt("b", "r", 5, None);
        clock.advance_millis(600);
        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.get_prompt("b", None).as_deref(), Some("r"));
    }

    #[test]
    fn test_stats_follow_hits() {
        let (cache, _) = cache_with(10, 60);
        cache.put_prompt("a", "ra", 100, None);
        cache.put_prompt("b", "rb", 200, Some("sys"));
        cache.get_prompt("a", None);
        cache.get_prompt("a", None);
        cache.get_prompt("b", Some("sys"));
        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.tokens_saved, 400);
        assert!((stats.hit_rate - 1.5).abs() < 1e-12);
        assert!((stats.estimated_cost_saved - 0.0008).abs() < 1e-12);
        assert_eq!(cache.clear(), 2);
        assert_eq!(cache.stats().tokens_saved, 0);
    }

    #[test]
    fn test_concurrent_puts_respect_capacity() {
        let (cache, _) = cache_with(8, 60);
        let cache = Arc::new(cache);
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        cache.put_prompt(&format!("{t}-{i}"), "r", 1, None);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 8);
    }

    #[tokio::test]
    async fn test_open_restores_and_sweeps() {
        let blobs = MemoryBlobStore::new();
        let port: Arc<dyn PersistencePort> =
            Arc::new(SnapshotPersistence::new(Arc::new(blobs.clone()), "ns"));
        let clock = ManualClock::new(10_000_000);
        let cfg = CacheConfig::default().with_ttl(Duration::from_secs(10));

        let first = ResponseCache::open(&cfg, port.clone(), Arc::new(clock.clone())).await;
        first.put_prompt("old", "r1", 1, None);
        clock.advance_millis(8_000);
        first.put_prompt("new", "r2", 2, None);
        first.flush().await;

        clock.advance_millis(5_000);
        let second = ResponseCache::open(&cfg, port, Arc::new(clock.clone())).await;
        assert_eq!(second.len(), 1);
        assert_eq!(second.get_prompt("new", None).as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_open_survives_corrupt_snapshot() {
        use crate::persistence::BlobStore;
        let blobs = MemoryBlobStore::new();
        blobs.set("ns", b"{corrupt").await.unwrap();
        let port = Arc::new(SnapshotPersistence::new(Arc::new(blobs), "ns"));
        let cache = ResponseCache::open(
            &CacheConfig::default(),
            port,
            Arc::new(ManualClock::new(0)),
        )
        .await;
        assert!(cache.is_empty());
        assert!(cache.is_persistent());
    }
}
