//! 响应缓存模块：基于内容寻址的有界缓存，减少重复的模型调用。
//!
//! # Response Caching Module
//!
//! A bounded, content-addressed cache for completion responses. Identical
//! (system prompt, user prompt) pairs map to the same key; resident entries
//! expire after a fixed TTL and the longest-resident entry is evicted when
//! the cache is full.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ResponseCache`] | Thread-safe cache with persistence wiring and statistics |
//! | [`CacheStore`] | The bounded map itself: get/put/clear, lazy and swept TTL expiry |
//! | [`CacheEntry`] | Response text, creation time, token count and hit count |
//! | [`CacheKey`] / [`CacheKeyGenerator`] | Deterministic SHA-256 prompt keys |
//! | [`CacheStats`] | Size, hits, tokens saved, hit rate and cost saved |
//! | [`Clock`] | Time source; [`ManualClock`] drives tests |
//!
//! ## Example
//!
//! ```rust
//! use ai_response_cache::cache::ResponseCache;
//! use ai_response_cache::CacheConfig;
//!
//! let cache = ResponseCache::new(&CacheConfig::default().with_capacity(100));
//! let key = cache.key_for(Some("You are terse."), "What is Rust?");
//! assert!(cache.get(&key).is_none());
//!
//! cache.put(key.clone(), "A systems language.", 42);
//! let hit = cache.get(&key).unwrap();
//! assert_eq!(hit.response, "A systems language.");
//! assert_eq!(cache.stats().tokens_saved, 42);
//! ```
//!
//! ## Eviction
//!
//! Eviction picks the smallest `created_at`, which is never refreshed on a
//! hit. The policy is therefore insertion order with a TTL overlay rather
//! than least-recently-used.

mod clock;
mod key;
mod manager;
mod stats;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use key::{CacheKey, CacheKeyGenerator};
pub use manager::ResponseCache;
pub use stats::CacheStats;
pub use store::{CacheEntry, CacheStore};
