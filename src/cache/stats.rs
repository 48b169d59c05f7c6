//! Statistics derived from the resident entries.

use super::store::CacheEntry;
use crate::tokens::TokenPricing;
use serde::Serialize;

/// Snapshot of cache effectiveness, recomputed from scratch on every call.
///
/// `hit_rate` is hits per resident entry, not hits per lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub total_hits: u64,
    pub tokens_saved: u64,
    pub hit_rate: f64,
    pub estimated_cost_saved: f64,
}

impl CacheStats {
    pub fn from_entries<'a>(
        entries: impl IntoIterator<Item = &'a CacheEntry>,
        pricing: &TokenPricing,
    ) -> Self {
        let mut size = 0usize;
        let mut total_hits = 0u64;
        let mut tokens_saved = 0u64;
        for e in entries {
            size += 1;
            total_hits = total_hits.saturating_add(e.hit_count);
            tokens_saved = tokens_saved.saturating_add(e.tokens_saved());
        }
        let hit_rate = if size > 0 {
            total_hits as f64 / size as f64
        } else {
            0.0
        };
        Self {
            size,
            total_hits,
            tokens_saved,
            hit_rate,
            estimated_cost_saved: pricing.cost_of(tokens_saved),
        }
    }
}
