// src/services/page_cache.rs
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct CacheEntry {
    body: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Full-response cache for public pages, keyed by request URI.
///
/// Entries are never invalidated by writes; they live until their TTL runs
/// out or somebody calls [`PageCache::clear`]. One instance per process.
#[derive(Debug)]
pub struct PageCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.body.clone()),
            None => None,
        }
    }

    pub fn set(&self, key: impl Into<String>, body: Vec<u8>) {
        self.set_with_ttl(key, body, self.ttl);
    }

    pub fn set_with_ttl(&self, key: impl Into<String>, body: Vec<u8>, ttl: Duration) {
        let entry = CacheEntry {
            body,
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().insert(key.into(), entry);
    }

    /// Evict one page by hand, e.g. from an admin task; handlers never do.
    pub fn remove(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Drop expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_until_cleared() {
        let cache = PageCache::new(Duration::from_secs(20));
        cache.set("/", b"one".to_vec());
        assert_eq!(cache.get("/").as_deref(), Some(&b"one"[..]));
        assert!(cache.get("/?page=2").is_none());

        cache.clear();
        assert!(cache.get("/").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_ttl_entries_expire_immediately() {
        let cache = PageCache::new(Duration::from_secs(20));
        cache.set_with_ttl("/", b"stale".to_vec(), Duration::ZERO);
        cache.set("/?page=2", b"fresh".to_vec());

        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.get("/").is_none());
        assert_eq!(cache.get("/?page=2").as_deref(), Some(&b"fresh"[..]));
    }

    #[test]
    fn remove_single_key() {
        let cache = PageCache::new(Duration::from_secs(5));
        cache.set("/", vec![1]);
        assert!(cache.remove("/"));
        assert!(!cache.remove("/"));
    }
}
