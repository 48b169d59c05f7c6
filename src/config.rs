//! Cache configuration.
//!
//! Every field has a default, so an empty YAML document is a valid config.
//! Environment variables override file values; unparseable values are ignored.

use crate::persistence::DEFAULT_NAMESPACE;
use crate::tokens::{QuotaProjector, TokenPricing};
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of resident entries.
    pub capacity: usize,
    /// Entry time-to-live in seconds.
    pub ttl_secs: u64,
    /// Entry time-to-live in milliseconds. Takes precedence over `ttl_secs` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_millis: Option<u64>,
    /// Price per 1K tokens used to value saved tokens.
    pub price_per_thousand_tokens: f64,
    /// Monthly token budget for quota projection.
    pub monthly_token_limit: u64,
    /// Persistence namespace, also mixed into cache keys when `namespace_keys` is set.
    pub namespace: String,
    pub namespace_keys: bool,
    pub default_max_tokens: u32,
    pub default_temperature: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            ttl_secs: 24 * 60 * 60,
            ttl_millis: None,
            price_per_thousand_tokens: 0.002,
            monthly_token_limit: 1_000_000,
            namespace: DEFAULT_NAMESPACE.to_string(),
            namespace_keys: false,
            default_max_tokens: 500,
            default_temperature: 0.7,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Defaults overlaid with `AI_CACHE_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_parse::<usize>("AI_CACHE_CAPACITY") {
            self.capacity = v;
        }
        if let Some(v) = env_parse::<u64>("AI_CACHE_TTL_SECS") {
            self.ttl_secs = v;
            self.ttl_millis = None;
        }
        if let Some(v) = env_parse::<f64>("AI_CACHE_PRICE_PER_1K") {
            self.price_per_thousand_tokens = v;
        }
        if let Some(v) = env_parse::<u64>("AI_CACHE_MONTHLY_TOKEN_LIMIT") {
            self.monthly_token_limit = v;
        }
        if let Ok(v) = env::var("AI_CACHE_NAMESPACE") {
            if !v.trim().is_empty() {
                self.namespace = v.trim().to_string();
            }
        }
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = ttl.as_secs();
        self.ttl_millis = Some(ttl.as_millis().min(u64::MAX as u128) as u64);
        self
    }
    pub fn with_price_per_thousand_tokens(mut self, price: f64) -> Self {
        self.price_per_thousand_tokens = price;
        self
    }
    pub fn with_monthly_token_limit(mut self, limit: u64) -> Self {
        self.monthly_token_limit = limit;
        self
    }
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
    pub fn with_namespace_keys(mut self, enabled: bool) -> Self {
        self.namespace_keys = enabled;
        self
    }

    pub fn ttl(&self) -> Duration {
        match self.ttl_millis {
            Some(ms) => Duration::from_millis(ms),
            None => Duration::from_secs(self.ttl_secs),
        }
    }

    pub fn pricing(&self) -> TokenPricing {
        TokenPricing::new("configured", self.price_per_thousand_tokens)
    }

    pub fn quota_projector(&self) -> QuotaProjector {
        QuotaProjector::new(self.monthly_token_limit)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(invalid("capacity", "capacity must be at least 1", "0"));
        }
        if self.ttl().is_zero() {
            let field = if self.ttl_millis.is_some() { "ttl_millis" } else { "ttl_secs" };
            return Err(invalid(field, "ttl must be at least 1ms", "0"));
        }
        if !self.price_per_thousand_tokens.is_finite() || self.price_per_thousand_tokens < 0.0 {
            return Err(invalid(
                "price_per_thousand_tokens",
                "price must be a non-negative number",
                &self.price_per_thousand_tokens.to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(invalid(
                "default_temperature",
                "temperature must be within 0.0..=2.0",
                &self.default_temperature.to_string(),
            ));
        }
        if self.namespace.trim().is_empty() {
            return Err(invalid("namespace", "namespace must not be empty", "\"\""));
        }
        Ok(())
    }
}

fn invalid(field: &str, msg: &str, actual: &str) -> Error {
    Error::configuration_with_context(
        msg,
        ErrorContext::new()
            .with_field_path(field)
            .with_details(format!("got {}", actual))
            .with_source("cache_config"),
    )
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}
