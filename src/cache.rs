//! Result cache for reads and queries.

use crate::error::{GSheetsError, Result};
use crate::models::Frame;
use moka::future::Cache;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, trace};

const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Expiry and size limits applied to cached results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CachePolicy {
    /// How long an entry is kept. `None` keeps entries until evicted by size,
    /// a zero duration disables caching.
    pub ttl: Option<Duration>,
    /// Maximum number of entries, unbounded when `None`.
    pub max_entries: Option<u64>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: Some(DEFAULT_TTL),
            max_entries: None,
        }
    }
}

impl CachePolicy {
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_entries(mut self, max_entries: Option<u64>) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn disabled() -> Self {
        Self::default().with_ttl(Some(Duration::ZERO))
    }

    fn is_disabled(&self) -> bool {
        self.ttl == Some(Duration::ZERO) || self.max_entries == Some(0)
    }

    fn build(&self) -> Cache<String, Frame> {
        let mut builder = Cache::builder();
        if let Some(ttl) = self.ttl {
            builder = builder.time_to_live(ttl);
        }
        if let Some(max_entries) = self.max_entries {
            builder = builder.max_capacity(max_entries);
        }
        builder.build()
    }
}

/// Frames cached by key, with one underlying cache per distinct policy.
#[derive(Default)]
pub struct ResultCache {
    caches: Mutex<HashMap<CachePolicy, Cache<String, Frame>>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn cache_for(&self, policy: CachePolicy) -> Cache<String, Frame> {
        let mut caches = self.caches.lock().unwrap_or_else(PoisonError::into_inner);
        caches.entry(policy).or_insert_with(|| policy.build()).clone()
    }

    /// Return the cached frame for `key`, or run `load` and cache its result.
    ///
    /// Concurrent misses on the same key share a single load. Failed loads
    /// are not cached.
    pub async fn get_or_load<F>(&self, policy: CachePolicy, key: String, load: F) -> Result<Frame>
    where
        F: Future<Output = Result<Frame>>,
    {
        if policy.is_disabled() {
            return load.await;
        }

        let cache = self.cache_for(policy);
        let loading = async {
            trace!("Cache miss for: {}", key);
            load.await
        };

        cache
            .try_get_with(key.clone(), loading)
            .await
            .map_err(|err| {
                // Only waiters that joined a failed load see a shared error.
                Arc::try_unwrap(err).unwrap_or_else(|shared| GSheetsError::Other(shared.into()))
            })
    }

    pub fn invalidate_all(&self) {
        debug!("Invalidating cached results");
        let caches = self.caches.lock().unwrap_or_else(PoisonError::into_inner);
        for cache in caches.values() {
            cache.invalidate_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CsvOptions;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn frame() -> Frame {
        Frame::from_csv(b"a,b\n1,2\n", &CsvOptions::default()).unwrap()
    }

    async fn load(calls: &AtomicUsize) -> Result<Frame> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(frame())
    }

    async fn slow_load(calls: &AtomicUsize) -> Result<Frame> {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(frame())
    }

    #[tokio::test]
    async fn test_second_lookup_is_cached() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);
        let policy = CachePolicy::default();

        cache.get_or_load(policy, "k".into(), load(&calls)).await.unwrap();
        cache.get_or_load(policy, "k".into(), load(&calls)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_load() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);
        let policy = CachePolicy::default();

        let (first, second) = tokio::join!(
            cache.get_or_load(policy, "k".into(), slow_load(&calls)),
            cache.get_or_load(policy, "k".into(), slow_load(&calls)),
        );

        assert_eq!(first.unwrap().num_rows(), 1);
        assert_eq!(second.unwrap().num_rows(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_load_separately() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);
        let policy = CachePolicy::default();

        cache.get_or_load(policy, "a".into(), load(&calls)).await.unwrap();
        cache.get_or_load(policy, "b".into(), load(&calls)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_ttl_bypasses_cache() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);
        let policy = CachePolicy::disabled();

        cache.get_or_load(policy, "k".into(), load(&calls)).await.unwrap();
        cache.get_or_load(policy, "k".into(), load(&calls)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_policies_do_not_share_entries() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);

        cache
            .get_or_load(CachePolicy::default(), "k".into(), load(&calls))
            .await
            .unwrap();
        cache
            .get_or_load(CachePolicy::default().with_ttl(None), "k".into(), load(&calls))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);
        let policy = CachePolicy::default();

        cache.get_or_load(policy, "k".into(), load(&calls)).await.unwrap();
        cache.invalidate_all();
        cache.get_or_load(policy, "k".into(), load(&calls)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);
        let policy = CachePolicy::default();

        let err = cache
            .get_or_load(policy, "k".into(), async {
                Err(GSheetsError::Export("boom".to_string()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GSheetsError::Export(_)));

        cache.get_or_load(policy, "k".into(), load(&calls)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
