use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use actix_web::web::Bytes;

struct CachedPage {
    body: Bytes,
    expires_at: Instant,
}

/// Rendered pages kept for a fixed time-to-live.
///
/// Entries are served unchanged until they expire or the cache is cleared, so
/// readers inside the window may see pages rendered before a write.
pub struct PageCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedPage>>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Builds a key under `prefix` from the distinguishing parts of a request.
    pub fn key(prefix: &str, parts: &[&str]) -> String {
        let mut key = prefix.to_string();
        for part in parts {
            key.push(':');
            key.push_str(part);
        }
        key
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(page) if page.expires_at > Instant::now() => Some(page.body.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `body` under `key`, dropping every expired entry on the way.
    pub fn insert(&self, key: String, body: Bytes) {
        let now = Instant::now();
        let page = CachedPage {
            body,
            expires_at: now + self.ttl,
        };
        let mut entries = self.lock();
        entries.retain(|_, p| p.expires_at > now);
        entries.insert(key, page);
    }

    pub fn invalidate(&self, key: &str) {
        self.lock().remove(key);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CachedPage>> {
        // A poisoned map only ever holds complete entries.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_stored_body_within_ttl() {
        let cache = PageCache::new(Duration::from_secs(20));
        let key = PageCache::key("index_page", &["1", "anon"]);
        assert_eq!(key, "index_page:1:anon");

        cache.insert(key.clone(), Bytes::from_static(b"<html>1</html>"));
        assert_eq!(cache.get(&key).unwrap(), Bytes::from_static(b"<html>1</html>"));
        assert!(cache.get("index_page:2:anon").is_none());
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = PageCache::new(Duration::from_millis(20));
        cache.insert("k".into(), Bytes::from_static(b"v"));
        std::thread::sleep(Duration::from_millis(40));
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn insert_drops_expired_entries() {
        let cache = PageCache::new(Duration::from_millis(20));
        for n in 0..50 {
            cache.insert(format!("index_page:{}:anon", n), Bytes::from_static(b"old"));
        }
        assert_eq!(cache.len(), 50);

        std::thread::sleep(Duration::from_millis(40));
        cache.insert("index_page:1:anon".into(), Bytes::from_static(b"new"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("index_page:1:anon").unwrap(), Bytes::from_static(b"new"));
    }

    #[test]
    fn invalidation_removes_entries() {
        let cache = PageCache::new(Duration::from_secs(20));
        cache.insert("index_page:1:anon".into(), Bytes::from_static(b"a"));
        cache.insert("index_page:1:7".into(), Bytes::from_static(b"b"));

        cache.invalidate("index_page:1:7");
        assert_eq!(cache.len(), 1);
        assert!(cache.get("index_page:1:7").is_none());

        cache.clear();
        assert!(cache.is_empty());
    }
}
