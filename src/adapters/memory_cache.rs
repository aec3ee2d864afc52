//! In-process cache gateway for normalised recommendation sets.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::domain::model::{CardRecommendation, Fingerprint};
use crate::domain::ports::{CacheError, CacheGateway};

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: String,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<String, CacheEntry>,
    enabled: bool,
    max_entries: Option<usize>,
}

impl CacheInner {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).and_then(|entry| {
            if Instant::now() <= entry.expires_at {
                Some(entry.payload.clone())
            } else {
                None
            }
        })
    }

    fn put(&mut self, key: String, payload: String, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| CacheError::Other(format!("ttl of {}s is out of range", ttl.as_secs())))?;
        if let Some(limit) = self.max_entries {
            if !self.map.contains_key(&key) && self.map.len() >= limit {
                self.make_room(limit);
            }
        }
        self.map.insert(key, CacheEntry { payload, expires_at });
        Ok(())
    }

    /// Purge expired entries, then evict whichever entry expires soonest until under `limit`.
    fn make_room(&mut self, limit: usize) {
        self.clear_expired();
        while self.map.len() >= limit {
            let Some(victim) = self
                .map
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            self.map.remove(&victim);
        }
    }

    fn clear_expired(&mut self) {
        let now = Instant::now();
        self.map.retain(|_, entry| entry.expires_at > now);
    }
}

/// Thread-safe TTL store; entries are kept as JSON and never updated in place.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    inner: Arc<tokio::sync::RwLock<CacheInner>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::build(true, None)
    }

    /// Bounded store; when full, the entry closest to expiry is evicted.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self::build(true, Some(max_entries.max(1)))
    }

    /// Reads always miss and writes are dropped.
    pub fn disabled() -> Self {
        Self::build(false, None)
    }

    fn build(enabled: bool, max_entries: Option<usize>) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner {
                map: HashMap::new(),
                enabled,
                max_entries,
            })),
        }
    }

    #[cfg(test)]
    pub(crate) async fn is_disabled(&self) -> bool {
        !self.inner.read().await.enabled
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear_expired(&self) {
        self.inner.write().await.clear_expired();
    }

    /// Store a raw payload under `key`, bypassing serialisation.
    #[cfg(test)]
    pub(crate) async fn put_raw(&self, key: &Fingerprint, payload: impl Into<String>, ttl: Duration) {
        let mut store = self.inner.write().await;
        if store.enabled {
            let _ = store.put(key.as_str().to_string(), payload.into(), ttl);
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheGateway for MemoryCache {
    async fn read(&self, key: &Fingerprint) -> Result<Option<Vec<CardRecommendation>>, CacheError> {
        let payload = {
            let store = self.inner.read().await;
            if !store.enabled {
                return Ok(None);
            }
            store.get(key.as_str())
        };

        match payload {
            Some(payload) => serde_json::from_str(&payload)
                .map(Some)
                .map_err(|e| CacheError::Corrupt(format!("{key}: {e}"))),
            None => Ok(None),
        }
    }

    async fn write(
        &self,
        key: &Fingerprint,
        cards: &[CardRecommendation],
        ttl: Duration,
    ) -> Result<(), CacheError> {
        if ttl.is_zero() {
            return Ok(());
        }
        let payload = serde_json::to_string(cards).map_err(|e| CacheError::Other(e.to_string()))?;

        let mut store = self.inner.write().await;
        if store.enabled {
            store.put(key.as_str().to_string(), payload, ttl)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::RecommendationRequest;
    use rust_decimal_macros::dec;

    fn key(name: &str) -> Fingerprint {
        RecommendationRequest::new(name, 650, 40000).unwrap().fingerprint()
    }

    fn cards() -> Vec<CardRecommendation> {
        vec![
            CardRecommendation {
                provider: "CSCards".to_string(),
                name: "SuperSaver".to_string(),
                apr: dec!(15.0),
                score: dec!(8.0),
            },
            CardRecommendation {
                provider: "ScoredCards".to_string(),
                name: "PremiumRewards".to_string(),
                apr: dec!(21.9),
                score: dec!(7.5),
            },
        ]
    }

    #[tokio::test]
    async fn test_cache_basic_operations() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(60);

        assert_eq!(cache.read(&key("a")).await.unwrap(), None);

        cache.write(&key("a"), &cards(), ttl).await.unwrap();
        assert_eq!(cache.read(&key("a")).await.unwrap(), Some(cards()));

        // Overwrite
        cache.write(&key("a"), &cards()[..1], ttl).await.unwrap();
        assert_eq!(cache.read(&key("a")).await.unwrap().unwrap().len(), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_cache_expiration() {
        let cache = MemoryCache::new();

        cache
            .write(&key("a"), &cards(), Duration::from_millis(100))
            .await
            .unwrap();
        assert!(cache.read(&key("a")).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.read(&key("a")).await.unwrap().is_none());
        cache.clear_expired().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_cache_disabled() {
        let cache = MemoryCache::disabled();

        assert!(cache.is_disabled().await);
        cache
            .write(&key("a"), &cards(), Duration::from_secs(60))
            .await
            .unwrap();
        assert!(cache.read(&key("a")).await.unwrap().is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_reported() {
        let cache = MemoryCache::new();
        cache
            .put_raw(&key("a"), "{not json", Duration::from_secs(60))
            .await;

        let err = cache.read(&key("a")).await.unwrap_err();
        assert!(matches!(err, CacheError::Corrupt(_)));
        assert!(!err.is_connectivity());
    }

    #[tokio::test]
    async fn test_unrepresentable_ttl_is_a_write_fault() {
        let cache = MemoryCache::new();

        let err = cache
            .write(&key("a"), &cards(), Duration::from_secs(u64::MAX))
            .await
            .unwrap_err();

        assert!(matches!(err, CacheError::Other(_)));
        assert!(!err.is_connectivity());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_bounded_cache_evicts_soonest_expiring() {
        let cache = MemoryCache::with_max_entries(2);

        cache.write(&key("short"), &cards(), Duration::from_secs(10)).await.unwrap();
        cache.write(&key("long"), &cards(), Duration::from_secs(600)).await.unwrap();
        cache.write(&key("new"), &cards(), Duration::from_secs(300)).await.unwrap();

        assert_eq!(cache.len().await, 2);
        assert!(cache.read(&key("short")).await.unwrap().is_none());
        assert!(cache.read(&key("long")).await.unwrap().is_some());
        assert!(cache.read(&key("new")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_writers_on_distinct_keys() {
        let cache = MemoryCache::new();
        let writers = (0..16).map(|i| {
            let cache = cache.clone();
            tokio::spawn(async move {
                let key = key(&format!("customer-{i}"));
                cache.write(&key, &cards(), Duration::from_secs(60)).await.unwrap();
                cache.read(&key).await.unwrap()
            })
        });

        for handle in writers {
            assert_eq!(handle.await.unwrap(), Some(cards()));
        }
        assert_eq!(cache.len().await, 16);
    }
}
