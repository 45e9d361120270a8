//! ABOUTME: In-process embedding cache (SPEC_FULL §3) — avoids re-embedding identical chunk text
//! ABOUTME: keyed by model name + text, so the same chunk appearing in two documents costs one call

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Cache sizing/expiry knobs, mirroring `llmspell-rag`'s `CacheConfig`.
#[derive(Debug, Clone)]
pub struct EmbeddingCacheConfig {
    pub max_entries: usize,
    pub ttl: Option<Duration>,
}

impl Default for EmbeddingCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Some(Duration::from_secs(3600)),
        }
    }
}

struct CacheEntry {
    vector: Vec<f32>,
    created_at: Instant,
    last_accessed: Instant,
}

#[derive(Debug, Clone, Default)]
struct CacheStats {
    hits: usize,
    misses: usize,
    evictions: usize,
}

/// LRU-ish cache mapping `(model, text)` to a previously-computed embedding
/// vector. Scoped to one process lifetime — no disk persistence, no
/// cross-process sharing (§5: "Model Registry Cache is process-wide;
/// populated once... refreshed only on explicit request" — this cache
/// follows the same no-background-refresh shape, just for vectors instead
/// of model names).
pub struct EmbeddingCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    config: EmbeddingCacheConfig,
    stats: RwLock<CacheStats>,
}

impl EmbeddingCache {
    #[must_use]
    pub fn new(config: EmbeddingCacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
            stats: RwLock::new(CacheStats::default()),
        }
    }

    fn key(model: Option<&str>, text: &str) -> String {
        format!("{}\u{0}{}", model.unwrap_or("<default>"), text)
    }

    /// Look up a cached vector for `(model, text)`. Expires stale entries
    /// lazily on read rather than running a background sweep.
    #[must_use]
    pub fn get(&self, model: Option<&str>, text: &str) -> Option<Vec<f32>> {
        let key = Self::key(model, text);
        let mut entries = self.entries.write();
        let mut stats = self.stats.write();

        if let Some(entry) = entries.get_mut(&key) {
            if let Some(ttl) = self.config.ttl {
                if entry.created_at.elapsed() > ttl {
                    entries.remove(&key);
                    stats.evictions += 1;
                    stats.misses += 1;
                    return None;
                }
            }
            entry.last_accessed = Instant::now();
            stats.hits += 1;
            Some(entry.vector.clone())
        } else {
            stats.misses += 1;
            None
        }
    }

    /// Store a freshly computed vector, evicting the least-recently-used
    /// entry if the cache is at capacity.
    pub fn put(&self, model: Option<&str>, text: &str, vector: Vec<f32>) {
        let key = Self::key(model, text);
        let mut entries = self.entries.write();
        let mut stats = self.stats.write();

        if entries.len() >= self.config.max_entries && !entries.contains_key(&key) {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.last_accessed)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
                stats.evictions += 1;
            }
        }

        let now = Instant::now();
        entries.insert(
            key,
            CacheEntry {
                vector,
                created_at: now,
                last_accessed: now,
            },
        );
    }

    /// `(hits, misses, hit_rate)`.
    #[must_use]
    pub fn stats(&self) -> (usize, usize, f64) {
        let stats = self.stats.read();
        let total = stats.hits + stats.misses;
        #[allow(clippy::cast_precision_loss)]
        let hit_rate = if total > 0 { stats.hits as f64 / total as f64 } else { 0.0 };
        (stats.hits, stats.misses, hit_rate)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let cache = EmbeddingCache::new(EmbeddingCacheConfig::default());
        cache.put(Some("m1"), "hello", vec![1.0, 2.0]);
        assert_eq!(cache.get(Some("m1"), "hello"), Some(vec![1.0, 2.0]));
    }

    #[test]
    fn miss_is_counted_and_returns_none() {
        let cache = EmbeddingCache::new(EmbeddingCacheConfig::default());
        assert_eq!(cache.get(Some("m1"), "missing"), None);
        let (hits, misses, _) = cache.stats();
        assert_eq!(hits, 0);
        assert_eq!(misses, 1);
    }

    #[test]
    fn different_models_are_distinct_keys() {
        let cache = EmbeddingCache::new(EmbeddingCacheConfig::default());
        cache.put(Some("m1"), "text", vec![1.0]);
        assert_eq!(cache.get(Some("m2"), "text"), None);
    }

    #[test]
    fn expired_entry_is_evicted_on_read() {
        let cache = EmbeddingCache::new(EmbeddingCacheConfig {
            max_entries: 10,
            ttl: Some(Duration::from_millis(0)),
        });
        cache.put(Some("m1"), "hello", vec![1.0]);
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(cache.get(Some("m1"), "hello"), None);
    }

    #[test]
    fn eviction_makes_room_at_capacity() {
        let cache = EmbeddingCache::new(EmbeddingCacheConfig {
            max_entries: 1,
            ttl: None,
        });
        cache.put(Some("m1"), "a", vec![1.0]);
        cache.put(Some("m1"), "b", vec![2.0]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(Some("m1"), "b"), Some(vec![2.0]));
    }
}
