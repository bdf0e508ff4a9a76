// Short-TTL cache for expensive auxiliary state (auth tokens, enrichment
// lookups). Each entry carries its own lifetime; expired entries are
// unobservable, so absence and expiry read the same to callers.
use crate::metrics_defs::{TTL_CACHE_HIT, TTL_CACHE_MISS};
use moka::Expiry;
use moka::sync::Cache;
use shared::counter;
use std::time::{Duration, Instant};

const SIZE: u64 = 1000;

#[derive(Clone)]
struct Entry<V> {
    value: V,
    ttl: Duration,
}

struct PerEntryExpiry;

impl<V> Expiry<String, Entry<V>> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    // Overwrites restart the clock with the new entry's lifetime
    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Process-wide cache with per-entry expiry. Shared across concurrent
/// requests; racing writers to the same key both succeed and the later
/// write wins, which is fine for idempotent re-derivations.
pub struct TtlCache<V> {
    cache: Cache<String, Entry<V>>,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(SIZE)
            .expire_after(PerEntryExpiry)
            .build();

        TtlCache { cache }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let hit = self.cache.get(key);
        let metric_def = if hit.is_some() {
            TTL_CACHE_HIT
        } else {
            TTL_CACHE_MISS
        };
        counter!(metric_def).increment(1);
        hit.map(|entry| entry.value)
    }

    /// Inserts a value valid for `ttl` from now. Callers caching upstream
    /// credentials subtract a safety margin from the declared lifetime
    /// before calling this.
    pub fn insert(&self, key: &str, value: V, ttl: Duration) {
        self.cache.insert(key.to_string(), Entry { value, ttl });
    }

    /// True when no live entry exists for `key` (never set, or past its
    /// expiry instant). Callers refresh when this returns true.
    pub fn is_expired(&self, key: &str) -> bool {
        !self.cache.contains_key(key)
    }
}

impl<V> Default for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_entry_is_returned() {
        let cache: TtlCache<String> = TtlCache::new();
        cache.insert("token", "abc".to_string(), Duration::from_secs(60));

        assert_eq!(cache.get("token"), Some("abc".to_string()));
        assert!(!cache.is_expired("token"));
    }

    #[test]
    fn absent_key_reads_as_expired() {
        let cache: TtlCache<String> = TtlCache::new();
        assert!(cache.is_expired("never-set"));
        assert_eq!(cache.get("never-set"), None);
    }

    #[test]
    fn entry_expires_after_its_own_ttl() {
        let cache: TtlCache<u32> = TtlCache::new();
        cache.insert("short", 1, Duration::from_millis(50));
        cache.insert("long", 2, Duration::from_secs(60));

        assert_eq!(cache.get("short"), Some(1));
        std::thread::sleep(Duration::from_millis(80));

        assert!(cache.is_expired("short"));
        assert_eq!(cache.get("short"), None);
        // Sibling entry with a longer lifetime is unaffected
        assert_eq!(cache.get("long"), Some(2));
    }

    #[test]
    fn overwrite_resets_the_clock() {
        let cache: TtlCache<u32> = TtlCache::new();
        cache.insert("k", 1, Duration::from_millis(40));
        cache.insert("k", 2, Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(60));

        assert_eq!(cache.get("k"), Some(2));
    }
}
