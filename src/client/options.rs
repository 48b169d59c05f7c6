use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Per-call options for [`CachedClient::complete`](super::CachedClient::complete).
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    /// Falls back to the configured default (500) when unset.
    pub max_tokens: Option<u32>,
    /// Falls back to the configured default (0.7) when unset.
    pub temperature: Option<f64>,
    /// Read from and write to the cache. Defaults to true.
    pub use_cache: bool,
    /// Upper bound on the provider call.
    pub timeout: Option<Duration>,
    /// Abandons the provider call when cancelled.
    pub cancel_token: Option<CancellationToken>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: None,
            temperature: None,
            use_cache: true,
            timeout: None,
            cancel_token: None,
        }
    }
}

impl CompletionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn temperature(mut self, temp: f64) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn use_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    pub fn no_cache(self) -> Self {
        self.use_cache(false)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }
}

/// Uniform result of a completion, cached or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionResult {
    pub response: String,
    pub cached: bool,
    /// Provider tokens consumed by this call; 0 for cache hits.
    pub tokens_used: u64,
}
