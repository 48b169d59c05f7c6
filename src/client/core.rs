use super::options::{CompletionOptions, CompletionResult};
use crate::cache::{CacheStats, ResponseCache};
use crate::provider::{CompletionProvider, CompletionRequest, CompletionResponse};
use crate::tokens::{MonthlyUsage, QuotaProjector, QuotaStatus};
use crate::types::Message;
use crate::{Error, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Completion client that answers from the response cache when it can.
pub struct CachedClient {
    pub(crate) cache: Arc<ResponseCache>,
    pub(crate) provider: Arc<dyn CompletionProvider>,
    pub(crate) usage: Mutex<MonthlyUsage>,
    pub(crate) projector: QuotaProjector,
    pub(crate) default_max_tokens: u32,
    pub(crate) default_temperature: f64,
}

impl CachedClient {
    pub fn builder() -> super::CachedClientBuilder {
        super::CachedClientBuilder::new()
    }

    /// Answer `user_prompt`, from cache if possible.
    ///
    /// On a hit the result is `cached = true, tokens_used = 0`. On a miss
    /// the provider is called; a non-empty answer is stored when caching is
    /// enabled and its token usage is added to the monthly counter either
    /// way. Provider errors are returned as-is and leave the cache untouched.
    pub async fn complete(
        &self,
        user_prompt: &str,
        system_prompt: Option<&str>,
        options: CompletionOptions,
    ) -> Result<CompletionResult> {
        let key = self.cache.key_for(system_prompt, user_prompt);

        if options.use_cache {
            if let Some(hit) = self.cache.get(&key) {
                return Ok(CompletionResult {
                    response: hit.response,
                    cached: true,
                    tokens_used: 0,
                });
            }
        }

        let request = CompletionRequest::new(
            Message::prompt_pair(system_prompt, user_prompt),
            options.max_tokens.unwrap_or(self.default_max_tokens),
            options.temperature.unwrap_or(self.default_temperature),
        );
        let response = self.call_provider(&request, &options).await?;
        let tokens = response.usage.total_tokens;
        self.record_usage(tokens);

        if options.use_cache && !response.content.is_empty() {
            self.cache.put(key, response.content.clone(), tokens);
        } else if response.content.is_empty() {
            debug!(provider = self.provider.name(), "empty completion, not caching");
        }

        Ok(CompletionResult {
            response: response.content,
            cached: false,
            tokens_used: tokens,
        })
    }

    async fn call_provider(
        &self,
        request: &CompletionRequest,
        options: &CompletionOptions,
    ) -> Result<CompletionResponse> {
        let call = async {
            match options.timeout {
                Some(limit) => {
                    match tokio::time::timeout(limit, self.provider.complete(request)).await {
                        Ok(r) => r,
                        Err(_) => Err(Error::Timeout(limit)),
                    }
                }
                None => self.provider.complete(request).await,
            }
        };
        match &options.cancel_token {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    info!(provider = self.provider.name(), "completion cancelled");
                    Err(Error::Cancelled)
                }
                r = call => r,
            },
            None => call.await,
        }
    }

    /// Cached answer for the prompt pair, without calling the provider.
    pub fn cached_response(&self, user_prompt: &str, system_prompt: Option<&str>) -> Option<String> {
        self.cache.get_prompt(user_prompt, system_prompt)
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cleanup_expired(&self) -> usize {
        self.cache.cleanup_expired()
    }

    pub fn tokens_used_this_month(&self) -> u64 {
        let today = self.cache.clock().today();
        self.usage().tokens_for(today)
    }

    /// Seed the monthly counter, e.g. from an external usage store.
    pub fn set_tokens_used(&self, tokens: u64) {
        let today = self.cache.clock().today();
        self.usage().set(tokens, today);
    }

    pub fn quota_status(&self) -> QuotaStatus {
        let today = self.cache.clock().today();
        let used = self.usage().tokens_for(today);
        self.projector.project(used, today)
    }

    fn record_usage(&self, tokens: u64) {
        let today = self.cache.clock().today();
        self.usage().record(tokens, today);
    }

    fn usage(&self) -> MutexGuard<'_, MonthlyUsage> {
        self.usage.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
