use std::num::NonZeroUsize;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::ports::cache::ResponseCache;

const FALLBACK_CAPACITY: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// Bounded LRU of backend responses, each entry stale after its TTL.
pub struct MemoryCache {
    inner: RwLock<LruCache<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        let cap = NonZeroUsize::new(max_entries).unwrap_or_else(|| {
            tracing::warn!(
                fallback = FALLBACK_CAPACITY.get(),
                "Cache max_entries was 0, using fallback capacity"
            );
            FALLBACK_CAPACITY
        });
        Self {
            inner: RwLock::new(LruCache::new(cap)),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map_or(0, |c| c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResponseCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let Ok(mut cache) = self.inner.write() else {
            tracing::error!(key, "Cache lock poisoned on get, returning miss");
            return None;
        };
        let entry = cache.get(key)?;
        if Instant::now() >= entry.expires_at {
            cache.pop(key);
            return None;
        }
        Some(entry.value.clone())
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) {
        let Ok(mut cache) = self.inner.write() else {
            tracing::error!(key, "Cache lock poisoned on set, skipping write");
            return;
        };
        cache.put(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    fn invalidate(&self, key: &str) {
        if let Ok(mut cache) = self.inner.write()
            && cache.pop(key).is_some()
        {
            tracing::debug!(key, "Cache entry invalidated");
        }
    }
}
