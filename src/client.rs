//! 客户端模块：带缓存的补全调用入口。
//!
//! # Cached Completion Client
//!
//! [`CachedClient`] is the public entry point: it hashes the prompt pair,
//! serves cache hits directly, calls the provider on a miss, stores
//! successful non-empty answers and keeps the monthly token counter used for
//! quota projection.
//!
//! ```rust,no_run
//! use ai_response_cache::{CachedClient, CompletionOptions, HttpCompletionProvider};
//! use std::sync::Arc;
//!
//! # async fn run() -> ai_response_cache::Result<()> {
//! let provider = HttpCompletionProvider::openai_compatible("https://api.openai.com/v1")?
//!     .with_model("gpt-3.5-turbo")
//!     .with_api_key_from("openai");
//! let client = CachedClient::builder()
//!     .provider(Arc::new(provider))
//!     .persistence_dir(".ai-cache")
//!     .build()
//!     .await?;
//!
//! let first = client.complete("hello", None, CompletionOptions::default()).await?;
//! let again = client.complete("hello", None, CompletionOptions::default()).await?;
//! assert!(!first.cached && again.cached);
//! # Ok(())
//! # }
//! ```

mod builder;
mod core;
mod options;

pub use builder::CachedClientBuilder;
pub use self::core::CachedClient;
pub use options::{CompletionOptions, CompletionResult};
