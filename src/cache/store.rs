//! TTL-bounded LRU storage for rendered responses.

use std::{
    sync::Mutex,
    time::{Duration, Instant},
};

use bytes::Bytes;
use lru::LruCache;

use super::config::CacheConfig;
use super::lock::mutex_lock;

const SOURCE: &str = "cache::store";

/// Cached HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

struct Entry {
    response: CachedResponse,
    expires_at: Instant,
}

pub struct ResponseStore {
    ttl: Duration,
    entries: Mutex<LruCache<String, Entry>>,
}

impl ResponseStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            ttl: config.ttl,
            entries: Mutex::new(LruCache::new(config.max_entries_non_zero())),
        }
    }

    /// Stored response for `key` unless it is missing or expired.
    pub fn get(&self, key: &str) -> Option<CachedResponse> {
        self.get_at(key, Instant::now())
    }

    /// Store with the configured TTL. Returns the key evicted to make room, if any.
    pub fn put(&self, key: String, response: CachedResponse) -> Option<String> {
        self.put_at(key, response, self.ttl, Instant::now())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<CachedResponse> {
        let mut entries = mutex_lock(&self.entries, SOURCE, "get");
        match entries.get(key) {
            Some(entry) if now < entry.expires_at => return Some(entry.response.clone()),
            Some(_) => {}
            None => return None,
        }
        entries.pop(key);
        None
    }

    fn put_at(
        &self,
        key: String,
        response: CachedResponse,
        ttl: Duration,
        now: Instant,
    ) -> Option<String> {
        let entry = Entry {
            response,
            expires_at: now + ttl,
        };
        let mut entries = mutex_lock(&self.entries, SOURCE, "put");
        match entries.push(key.clone(), entry) {
            Some((evicted, _)) if evicted != key => Some(evicted),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;

    fn response(body: &'static str) -> CachedResponse {
        CachedResponse {
            status: 200,
            headers: vec![(
                "content-type".to_string(),
                "application/json".to_string(),
            )],
            body: Bytes::from(body),
        }
    }

    fn store(max_entries: usize) -> ResponseStore {
        ResponseStore::new(&CacheConfig {
            max_entries,
            ..Default::default()
        })
    }

    #[test]
    fn entry_is_served_until_ttl_elapses() {
        let store = store(8);
        let start = Instant::now();
        let ttl = Duration::from_secs(10);

        store.put_at("/api/posts?tag=tech".into(), response("a"), ttl, start);

        let hit = store.get_at("/api/posts?tag=tech", start + Duration::from_secs(9));
        assert_eq!(hit, Some(response("a")));

        let miss = store.get_at("/api/posts?tag=tech", start + ttl);
        assert!(miss.is_none());
        assert!(store.is_empty(), "expired entry is evicted on lookup");
    }

    #[test]
    fn missing_key_is_a_silent_miss() {
        let store = store(8);
        assert!(store.get("/api/ping").is_none());
    }

    #[test]
    fn put_overwrites_value_and_expiry() {
        let store = store(8);
        let start = Instant::now();
        let ttl = Duration::from_secs(10);

        store.put_at("/".into(), response("old"), ttl, start);
        store.put_at("/".into(), response("new"), ttl, start + Duration::from_secs(8));

        let later = start + Duration::from_secs(15);
        assert_eq!(store.get_at("/", later), Some(response("new")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn distinct_spellings_are_distinct_keys() {
        let store = store(8);
        store.put("/api/posts?tags=a,b".into(), response("ab"));

        assert!(store.get("/api/posts?tags=a,b").is_some());
        assert!(store.get("/api/posts?tags=b,a").is_none());
        assert!(store.get("/api/posts?tags=a%2Cb").is_none());
    }

    #[test]
    fn least_recently_used_entry_is_evicted_at_capacity() {
        let store = store(2);

        assert!(store.put("one".into(), response("1")).is_none());
        assert!(store.put("two".into(), response("2")).is_none());
        assert!(store.get("one").is_some());

        let evicted = store.put("three".into(), response("3"));
        assert_eq!(evicted.as_deref(), Some("two"));
        assert!(store.get("one").is_some());
        assert!(store.get("two").is_none());
        assert!(store.get("three").is_some());
    }

    #[test]
    fn overwrite_does_not_report_eviction() {
        let store = store(1);
        store.put("one".into(), response("1"));
        assert!(store.put("one".into(), response("again")).is_none());
    }

    #[test]
    fn store_recovers_from_poisoned_lock() {
        let store = store(4);

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = store.entries.lock().expect("entries lock should be acquired");
            panic!("poison entries lock");
        }));

        store.put("/".into(), response("ok"));
        assert!(store.get("/").is_some());
    }
}
