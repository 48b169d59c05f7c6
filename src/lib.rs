//! # ai-response-cache
//!
//! 面向大模型补全接口的有界响应缓存：减少重复调用、统计节省的 Token 与成本，并预测月度用量。
//!
//! A bounded, content-addressed response cache that sits between application
//! code and an LLM completion endpoint.
//!
//! ## Overview
//!
//! - **Content-addressed**: byte-identical (system prompt, user prompt) pairs
//!   share one SHA-256 key; there is no semantic matching.
//! - **Bounded**: at most `capacity` entries; the longest-resident entry is
//!   evicted first, and entries older than the TTL are never served.
//! - **Accounted**: tokens saved, hit rate and cost saved are derived from the
//!   resident entries; a monthly token counter feeds a linear quota projection.
//! - **Persistent**: snapshots are saved in the background through a
//!   pluggable [`persistence::PersistencePort`].
//!
//! ## Quick Start
//!
//! ```rust
//! use ai_response_cache::{CacheConfig, ResponseCache};
//!
//! let cache = ResponseCache::new(&CacheConfig::default());
//! cache.put_prompt("hello", "Hi there!", 12, None);
//! assert_eq!(cache.get_prompt("hello", None).as_deref(), Some("Hi there!"));
//!
//! let stats = cache.stats();
//! assert_eq!(stats.size, 1);
//! assert_eq!(stats.tokens_saved, 12);
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Keys, the bounded store, TTL reaping, statistics |
//! | [`persistence`] | Persistence port, blob adapters, background writer |
//! | [`client`] | Cached completion orchestrator |
//! | [`provider`] | Completion provider trait and HTTP adapter |
//! | [`tokens`] | Pricing and monthly quota projection |
//! | [`config`] | Configuration with YAML and environment overrides |
//! | [`types`] | Chat message types |

pub mod cache;
pub mod client;
pub mod config;
pub mod persistence;
pub mod provider;
pub mod tokens;
pub mod types;

// Re-export main types for convenience
pub use cache::{CacheEntry, CacheKey, CacheStats, ResponseCache};
pub use client::{CachedClient, CachedClientBuilder, CompletionOptions, CompletionResult};
pub use config::CacheConfig;
pub use provider::{CompletionProvider, HttpCompletionProvider};
pub use tokens::{QuotaProjector, QuotaStatus};
pub use types::{Message, MessageRole};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
