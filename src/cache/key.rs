//! Cache key generation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Opaque, fixed-width key identifying one (system prompt, user prompt) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
    /// First eight characters, for log lines.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
impl From<String> for CacheKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Deterministic prompt hasher.
///
/// Fields are length-prefixed before hashing so that a separator appearing
/// inside one prompt can never make two different pairs encode identically,
/// and swapping the system and user prompts yields a different key. A missing
/// system prompt hashes the same as an empty one.
#[derive(Debug, Clone, Default)]
pub struct CacheKeyGenerator {
    namespace: Option<String>,
}

impl CacheKeyGenerator {
    pub fn new() -> Self {
        Self { namespace: None }
    }

    /// Mix a fixed namespace into every key, giving independent key spaces
    /// to caches that share one persistence medium.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn generate(&self, system_prompt: Option<&str>, user_prompt: &str) -> CacheKey {
        let mut hasher = Sha256::new();
        if let Some(ns) = self.namespace.as_deref() {
            update_field(&mut hasher, ns);
        }
        update_field(&mut hasher, system_prompt.unwrap_or(""));
        update_field(&mut hasher, user_prompt);
        let hash: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        CacheKey::new(hash)
    }
}

fn update_field(hasher: &mut Sha256, field: &str) {
    hasher.update((field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic_and_fixed_width() {
        let g = CacheKeyGenerator::new();
        let k1 = g.generate(Some("sys"), "hello");
        let k2 = CacheKeyGenerator::new().generate(Some("sys"), "hello");
        assert_eq!(k1, k2);
        assert_eq!(k1.as_str().len(), 64);
        assert!(k1.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_key_is_stable_across_processes() {
        // Any change to the encoding invalidates persisted snapshots.
        let g = CacheKeyGenerator::new();
        assert_eq!(
            g.generate(Some("You are terse."), "What is Rust?").as_str(),
            "fef811a9bc610c76633122a70f746e4e17ef5cd0d4f215d44ce05660fc69fe69"
        );
        assert_eq!(
            g.generate(None, "hello").as_str(),
            "e49773b3ddae167d5fd8e83f8d02fb7525c54e8127a14767c0edbe206315b669"
        );
    }

    #[test]
    fn test_swapped_roles_differ() {
        let g = CacheKeyGenerator::new();
        assert_ne!(g.generate(Some("a"), "b"), g.generate(Some("b"), "a"));
    }

    #[test]
    fn test_missing_system_prompt_equals_empty() {
        let g = CacheKeyGenerator::new();
        assert_eq!(g.generate(None, "hi"), g.generate(Some(""), "hi"));
    }

    #[test]
    fn test_no_separator_collision() {
        let g = CacheKeyGenerator::new();
        assert_ne!(g.generate(Some("a::"), "b"), g.generate(Some("a"), "::b"));
    }

    #[test]
    fn test_namespace_changes_key() {
        let plain = CacheKeyGenerator::new().generate(None, "hello");
        let tenant = CacheKeyGenerator::new()
            .with_namespace("tenant-a")
            .generate(None, "hello");
        assert_ne!(plain, tenant);
    }

    #[test]
    fn test_short_and_display() {
        let k = CacheKey::from("0123456789abcdef");
        assert_eq!(k.short(), "01234567");
        assert_eq!(k.to_string(), "0123456789abcdef");
        assert_eq!(CacheKey::from("abc").short(), "abc");
    }
}
