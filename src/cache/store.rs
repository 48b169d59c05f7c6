//! Bounded key → entry store with TTL expiry and insertion-order eviction.
//!
//! The store is a plain single-owner structure; callers pass the current time
//! in explicitly. Concurrency and persistence live one level up in
//! [`ResponseCache`](super::ResponseCache).

use super::key::CacheKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// A single cached completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The completion text.
    pub response: String,
    /// Unix timestamp (ms) when the entry was inserted. Never refreshed on hit.
    #[serde(alias = "timestamp", alias = "createdAt")]
    pub created_at: u64,
    /// Provider-reported token usage of the request that produced the entry.
    #[serde(alias = "tokens", alias = "tokenCount")]
    pub token_count: u64,
    /// Number of times the entry has been served.
    #[serde(default, alias = "hitCount")]
    pub hit_count: u64,
}

impl CacheEntry {
    pub fn new(response: impl Into<String>, token_count: u64, created_at: u64) -> Self {
        Self {
            response: response.into(),
            created_at,
            token_count,
            hit_count: 0,
        }
    }

    pub fn age_millis(&self, now: u64) -> u64 {
        now.saturating_sub(self.created_at)
    }

    /// Tokens notionally avoided by serving this entry from cache.
    pub fn tokens_saved(&self) -> u64 {
        self.token_count.saturating_mul(self.hit_count)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    entry: CacheEntry,
    // breaks ties between entries created in the same millisecond
    seq: u64,
}

#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<CacheKey, Slot>,
    capacity: usize,
    ttl_millis: u64,
    next_seq: u64,
}

impl CacheStore {
    /// Create an empty store. `capacity` is clamped to at least 1.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            ttl_millis: ttl.as_millis() as u64,
            next_seq: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_millis)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_expired(&self, entry: &CacheEntry, now: u64) -> bool {
        entry.age_millis(now) > self.ttl_millis
    }

    /// Look up `key`, counting a hit on success.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get(&mut self, key: &CacheKey, now: u64) -> Option<CacheEntry> {
        let expired = self
            .entries
            .get(key)
            .map(|slot| self.is_expired(&slot.entry, now))?;
        if expired {
            debug!(key = %key.short(), "cache entry expired, removing");
            self.entries.remove(key);
            return None;
        }
        let slot = self.entries.get_mut(key)?;
        slot.entry.hit_count = slot.entry.hit_count.saturating_add(1);
        Some(slot.entry.clone())
    }

    /// Look up without counting a hit or reaping.
    pub fn peek(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key).map(|slot| &slot.entry)
    }

    /// Insert a fresh entry, evicting the longest-resident one when full.
    ///
    /// Returns the evicted key, if any. Replacing a resident key never evicts.
    pub fn put(
        &mut self,
        key: CacheKey,
        response: impl Into<String>,
        token_count: u64,
        now: u64,
    ) -> Option<CacheKey> {
        let evicted = if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity
        {
            self.evict_oldest()
        } else {
            None
        };
        let seq = self.bump_seq();
        self.entries.insert(
            key,
            Slot {
                entry: CacheEntry::new(response, token_count, now),
                seq,
            },
        );
        evicted
    }

    /// Remove every entry. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    /// Remove every entry older than the TTL. Returns how many were dropped.
    pub fn cleanup_expired(&mut self, now: u64) -> usize {
        let ttl = self.ttl_millis;
        let before = self.entries.len();
        self.entries
            .retain(|_, slot| slot.entry.age_millis(now) <= ttl);
        before - self.entries.len()
    }

    /// Load previously persisted entries, oldest first, honoring capacity.
    ///
    /// Existing contents are discarded. Hit counts and timestamps are kept
    /// as persisted.
    pub fn restore(&mut self, mut entries: Vec<(CacheKey, CacheEntry)>) {
        self.entries.clear();
        entries.sort_by_key(|(_, e)| e.created_at);
        for (key, entry) in entries {
            if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
                self.evict_oldest();
            }
            let seq = self.bump_seq();
            self.entries.insert(key, Slot { entry, seq });
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&CacheKey, &CacheEntry)> {
        self.entries.iter().map(|(k, slot)| (k, &slot.entry))
    }

    /// Owned copy of the contents, oldest first.
    pub fn snapshot(&self) -> Vec<(CacheKey, CacheEntry)> {
        let mut slots: Vec<(&CacheKey, &Slot)> = self.entries.iter().collect();
        slots.sort_by_key(|(_, slot)| (slot.entry.created_at, slot.seq));
        slots
            .into_iter()
            .map(|(k, slot)| (k.clone(), slot.entry.clone()))
            .collect()
    }

    fn evict_oldest(&mut self) -> Option<CacheKey> {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, slot)| (slot.entry.created_at, slot.seq))
            .map(|(k, _)| k.clone())?;
        debug!(key = %oldest.short(), "evicting oldest cache entry");
        self.entries.remove(&oldest);
        Some(oldest)
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_millis(1_000);

    fn key(s: &str) -> CacheKey {
        CacheKey::from(s)
    }

    #[test]
    fn test_miss_on_unknown_key() {
        let mut store = CacheStore::new(10, TTL);
        assert!(store.get(&key("never"), 0).is_none());
    }

    #[test]
    fn test_hit_returns_entry_and_counts() {
        let mut store = CacheStore::new(10, TTL);
        store.put(key("k"), "R", 42, 0);
        for expected in 1..=3 {
            let hit = store.get(&key("k"), 10).unwrap();
            assert_eq!(hit.response, "R");
            assert_eq!(hit.token_count, 42);
            assert_eq!(hit.hit_count, expected);
        }
    }

    #[test]
    fn test_capacity_evicts_oldest_created() {
        let mut store = CacheStore::new(2, TTL);
        store.put(key("A"), "a", 1, 100);
        store.put(key("B"), "b", 1, 200);
        let evicted = store.put(key("C"), "c", 1, 300);
        assert_eq!(evicted, Some(key("A")));
        assert_eq!(store.len(), 2);
        assert!(store.peek(&key("A")).is_none());
        assert!(store.peek(&key("B")).is_some());
        assert!(store.peek(&key("C")).is_some());
    }

    #[test]
    fn test_eviction_ignores_hits() {
        // Hits do not refresh created_at, so a busy entry is still evicted first.
        let mut store = CacheStore::new(2, Duration::from_secs(60));
        store.put(key("A"), "a", 1, 100);
        store.put(key("B"), "b", 1, 200);
        for _ in 0..5 {
            store.get(&key("A"), 250);
        }
        store.put(key("C"), "c", 1, 300);
        assert!(store.peek(&key("A")).is_none());
    }

    #[test]
    fn test_same_millisecond_evicts_in_insertion_order() {
        let mut store = CacheStore::new(2, TTL);
        store.put(key("A"), "a", 1, 5);
        store.put(key("B"), "b", 1, 5);
        store.put(key("C"), "c", 1, 5);
        assert!(store.peek(&key("A")).is_none());
        assert!(store.peek(&key("B")).is_some());
    }

    #[test]
    fn test_replacing_resident_key_does_not_evict() {
        let mut store = CacheStore::new(2, TTL);
        store.put(key("A"), "a", 1, 1);
        store.put(key("B"), "b", 1, 2);
        store.get(&key("B"), 3);
        assert_eq!(store.put(key("B"), "b2", 7, 4), None);
        assert_eq!(store.len(), 2);
        let b = store.peek(&key("B")).unwrap();
        assert_eq!(b.response, "b2");
        assert_eq!(b.hit_count, 0);
        assert_eq!(b.created_at, 4);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut store = CacheStore::new(0, TTL);
        assert_eq!(store.capacity(), 1);
        store.put(key("A"), "a", 1, 0);
        store.put(key("B"), "b", 1, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_lazy_expiry_on_get() {
        let mut store = CacheStore::new(10, TTL);
        store.put(key("k"), "r", 1, 0);
        assert!(store.get(&key("k"), 1_000).is_some(), "age == ttl is still live");
        assert!(store.get(&key("k"), 1_001).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_cleanup_expired_counts_removed() {
        let mut store = CacheStore::new(10, TTL);
        store.put(key("old1"), "r", 1, 0);
        store.put(key("old2"), "r", 1, 100);
        store.put(key("fresh"), "r", 1, 900);
        assert_eq!(store.cleanup_expired(1_500), 2);
        assert_eq!(store.len(), 1);
        assert!(store.peek(&key("fresh")).is_some());
        assert_eq!(store.cleanup_expired(1_500), 0);
    }

    #[test]
    fn test_clear() {
        let mut store = CacheStore::new(10, TTL);
        store.put(key("a"), "r", 1, 0);
        store.put(key("b"), "r", 1, 0);
        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_restore_keeps_newest_when_over_capacity() {
        let mut store = CacheStore::new(2, TTL);
        let mut e = CacheEntry::new("x", 3, 30);
        e.hit_count = 4;
        store.restore(vec![
            (key("c"), e.clone()),
            (key("a"), CacheEntry::new("x", 1, 10)),
            (key("b"), CacheEntry::new("x", 2, 20)),
        ]);
        assert_eq!(store.len(), 2);
        assert!(store.peek(&key("a")).is_none());
        assert_eq!(store.peek(&key("c")), Some(&e));
    }

    #[test]
    fn test_snapshot_is_oldest_first() {
        let mut store = CacheStore::new(10, TTL);
        store.put(key("b"), "r", 1, 20);
        store.put(key("a"), "r", 1, 10);
        let keys: Vec<_> = store.snapshot().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![key("a"), key("b")]);
    }

    #[test]
    fn test_entry_reads_legacy_field_names() {
        let json = r#"{"response":"hi","timestamp":5,"tokens":9,"hitCount":2}"#;
        let entry: CacheEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.created_at, 5);
        assert_eq!(entry.token_count, 9);
        assert_eq!(entry.hit_count, 2);
        assert_eq!(entry.tokens_saved(), 18);
    }
}
