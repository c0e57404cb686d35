//! Tag-invalidated cache for derived listing data.
//!
//! Nothing depends on a hit: services always fall back to the database, so the
//! [`NoopCache`] is a valid drop-in.
//!
//! Every tag carries a generation that [`ListingCache::invalidate_tag`] bumps.
//! Readers capture it before querying and hand it back to `set`, so a page
//! computed before a write can never be served after that write.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;

pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// Expired entries are swept once per this many writes.
const SWEEP_EVERY: u64 = 64;

pub trait ListingCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    /// Current generation of `tag`; capture before computing a value to store.
    fn generation(&self, tag: &str) -> u64;
    /// Stores `value` unless `tag` was invalidated after `generation` was read.
    fn set(&self, key: &str, tag: &str, generation: u64, value: Value);
    fn invalidate_tag(&self, tag: &str);
}

struct Entry {
    tag: String,
    generation: u64,
    value: Value,
    expires_at: Instant,
}

pub struct MemoryCache {
    entries: DashMap<String, Entry>,
    generations: DashMap<String, u64>,
    writes: AtomicU64,
    ttl: Duration,
    max_entries: usize,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            generations: DashMap::new(),
            writes: AtomicU64::new(0),
            ttl,
            max_entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sweep_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }
}

impl ListingCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let stale = match self.entries.get(key) {
            Some(entry)
                if entry.expires_at > Instant::now()
                    && entry.generation == self.generation(&entry.tag) =>
            {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if stale {
            self.entries.remove(key);
        }
        None
    }

    fn generation(&self, tag: &str) -> u64 {
        self.generations.get(tag).map_or(0, |g| *g)
    }

    fn set(&self, key: &str, tag: &str, generation: u64, value: Value) {
        if generation != self.generation(tag) {
            tracing::debug!(key, tag, "cache write skipped, tag invalidated meanwhile");
            return;
        }

        let writes = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if writes % SWEEP_EVERY == 0 || self.entries.len() >= self.max_entries {
            self.sweep_expired();
        }
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(key) {
            tracing::debug!(key, entries = self.entries.len(), "cache full, write skipped");
            return;
        }

        self.entries.insert(
            key.to_string(),
            Entry {
                tag: tag.to_string(),
                generation,
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    fn invalidate_tag(&self, tag: &str) {
        *self.generations.entry(tag.to_string()).or_insert(0) += 1;
        self.entries.retain(|_, entry| entry.tag != tag);
        tracing::debug!(tag, "cache tag invalidated");
    }
}

pub struct NoopCache;

impl ListingCache for NoopCache {
    fn get(&self, _key: &str) -> Option<Value> {
        None
    }

    fn generation(&self, _tag: &str) -> u64 {
        0
    }

    fn set(&self, _key: &str, _tag: &str, _generation: u64, _value: Value) {}

    fn invalidate_tag(&self, _tag: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn put(cache: &MemoryCache, key: &str, tag: &str, value: Value) {
        let generation = cache.generation(tag);
        cache.set(key, tag, generation, value);
    }

    #[test]
    fn invalidation_drops_only_the_tag() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        put(&cache, "posts.all.15.1", "posts", json!([1]));
        put(&cache, "other.key", "other", json!([2]));

        assert_eq!(cache.get("posts.all.15.1"), Some(json!([1])));
        cache.invalidate_tag("posts");
        assert_eq!(cache.get("posts.all.15.1"), None);
        assert_eq!(cache.get("other.key"), Some(json!([2])));
    }

    #[test]
    fn page_computed_before_invalidation_is_not_stored() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        let generation = cache.generation("posts");

        // A write lands while the page is being read from the database.
        cache.invalidate_tag("posts");
        cache.set("posts.all.15.1", "posts", generation, json!(["old"]));

        assert_eq!(cache.get("posts.all.15.1"), None);
        assert!(cache.is_empty());

        put(&cache, "posts.all.15.1", "posts", json!(["new"]));
        assert_eq!(cache.get("posts.all.15.1"), Some(json!(["new"])));
    }

    #[test]
    fn expired_entries_are_evicted() {
        let cache = MemoryCache::new(Duration::ZERO);
        put(&cache, "k", "t", json!(true));
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn unread_expired_entries_are_swept() {
        let cache = MemoryCache::new(Duration::ZERO);
        for page in 0..10_000 {
            put(&cache, &format!("posts.all.15.{page}"), "posts", json!(page));
        }
        assert!(cache.len() < SWEEP_EVERY as usize);
    }

    #[test]
    fn live_entries_are_bounded() {
        let cache = MemoryCache::with_capacity(Duration::from_secs(60), 8);
        for page in 0..100 {
            put(&cache, &format!("posts.all.15.{page}"), "posts", json!(page));
        }
        assert_eq!(cache.len(), 8);
        assert_eq!(cache.get("posts.all.15.0"), Some(json!(0)));
    }

    #[test]
    fn noop_never_hits() {
        let cache = NoopCache;
        cache.set("k", "t", cache.generation("t"), json!(1));
        assert_eq!(cache.get("k"), None);
    }
}
