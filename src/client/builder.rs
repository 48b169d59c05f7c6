use super::core::CachedClient;
use crate::cache::{Clock, ResponseCache, SystemClock};
use crate::config::CacheConfig;
use crate::persistence::{FileBlobStore, PersistencePort, SnapshotPersistence};
use crate::provider::CompletionProvider;
use crate::tokens::MonthlyUsage;
use crate::{Error, ErrorContext, Result};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Builder for [`CachedClient`].
pub struct CachedClientBuilder {
    config: CacheConfig,
    provider: Option<Arc<dyn CompletionProvider>>,
    persistence: Option<Arc<dyn PersistencePort>>,
    persistence_dir: Option<PathBuf>,
    clock: Option<Arc<dyn Clock>>,
}

impl CachedClientBuilder {
    pub fn new() -> Self {
        Self {
            config: CacheConfig::default(),
            provider: None,
            persistence: None,
            persistence_dir: None,
            clock: None,
        }
    }

    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn persistence(mut self, persistence: Arc<dyn PersistencePort>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Persist snapshots as `<dir>/<namespace>.json`.
    pub fn persistence_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.persistence_dir = Some(dir.into());
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate the configuration and open the cache.
    ///
    /// With persistence configured this loads the stored snapshot and must
    /// run inside a tokio runtime.
    pub async fn build(self) -> Result<CachedClient> {
        self.config.validate()?;
        let provider = self.provider.ok_or_else(|| {
            Error::configuration_with_context(
                "a completion provider is required",
                ErrorContext::new()
                    .with_field_path("provider")
                    .with_source("cached_client_builder"),
            )
        })?;
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let persistence = match (self.persistence, self.persistence_dir) {
            (Some(p), _) => Some(p),
            (None, Some(dir)) => Some(Arc::new(SnapshotPersistence::new(
                Arc::new(FileBlobStore::new(dir)),
                self.config.namespace.clone(),
            )) as Arc<dyn PersistencePort>),
            (None, None) => None,
        };
        let cache = match persistence {
            Some(p) => ResponseCache::open(&self.config, p, clock).await,
            None => ResponseCache::new(&self.config).with_clock(clock),
        };

        Ok(CachedClient {
            cache: Arc::new(cache),
            provider,
            usage: Mutex::new(MonthlyUsage::default()),
            projector: self.config.quota_projector(),
            default_max_tokens: self.config.default_max_tokens,
            default_temperature: self.config.default_temperature,
        })
    }
}

impl Default for CachedClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
