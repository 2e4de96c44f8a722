use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::Mutex;

use super::CacheStorage;
use crate::error::CacheError;

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(512) {
    Some(capacity) => capacity,
    None => NonZeroUsize::MIN,
};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    ttl: Option<Duration>,
    inserted_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.ttl
            .is_some_and(|ttl| now.duration_since(self.inserted_at) >= ttl)
    }
}

/// An in-process LRU backend. Expired entries are dropped when next read.
#[derive(Clone)]
pub struct InMemoryCache {
    inner: Arc<Mutex<LruCache<String, Entry>>>,
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl InMemoryCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// The TTL the live entry under `key` was written with.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let mut inner = self.inner.lock().await;
        let (expired, ttl) = inner
            .peek(key)
            .map(|entry| (entry.is_expired(Instant::now()), entry.ttl))?;
        if expired {
            inner.pop(key);
            return None;
        }
        ttl
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[async_trait]
impl CacheStorage for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        let value = match inner.get(key) {
            Some(entry) if entry.is_expired(now) => None,
            Some(entry) => return Ok(Some(entry.value.clone())),
            None => return Ok(None),
        };
        inner.pop(key);
        Ok(value)
    }

    async fn insert(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        self.inner.lock().await.put(
            key.to_string(),
            Entry {
                value,
                ttl,
                inserted_at: Instant::now(),
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.inner.lock().await.pop(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_insert_remove() {
        let cache = InMemoryCache::default();
        assert_eq!(cache.get("1").await.unwrap(), None);

        cache
            .insert("1", "payload".to_string(), Some(Duration::from_secs(60)))
            .await
            .unwrap();
        assert_eq!(cache.get("1").await.unwrap().as_deref(), Some("payload"));
        assert_eq!(cache.ttl("1").await, Some(Duration::from_secs(60)));

        cache.remove("1").await.unwrap();
        assert_eq!(cache.get("1").await.unwrap(), None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn expired_entries_are_dropped_on_read() {
        let cache = InMemoryCache::default();
        cache
            .insert("1", "payload".to_string(), Some(Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("1").await.unwrap(), None);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn entries_without_ttl_do_not_expire() {
        let cache = InMemoryCache::default();
        cache.insert("1", "payload".to_string(), None).await.unwrap();
        assert_eq!(cache.ttl("1").await, None);
        assert!(cache.get("1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn least_recently_used_entry_is_evicted() {
        let cache = InMemoryCache::new(NonZeroUsize::new(2).unwrap());
        cache.insert("1", "a".to_string(), None).await.unwrap();
        cache.insert("2", "b".to_string(), None).await.unwrap();
        cache.get("1").await.unwrap();
        cache.insert("3", "c".to_string(), None).await.unwrap();

        assert!(cache.get("1").await.unwrap().is_some());
        assert!(cache.get("2").await.unwrap().is_none());
        assert!(cache.get("3").await.unwrap().is_some());
    }
}
