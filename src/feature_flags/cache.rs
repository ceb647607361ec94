//! Keyed query cache backing [`FeatureFlags::use_feature_flags`](crate::feature_flags::FeatureFlags::use_feature_flags).
//!
//! Entries never expire on their own; they are replaced by refetches or dropped through
//! [`QueryCache::invalidate`]. Fetches for one key are serialised by a per-entry async
//! mutex, so concurrent readers of an empty entry share a single producer run.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};

use async_lock::Mutex as AsyncMutex;
use chrono::{DateTime, Utc};

/// Lifecycle of a cache entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryState {
    Uninitialized,
    Loading,
    Ready,
}

impl QueryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryState::Uninitialized => "uninitialized",
            QueryState::Loading => "loading",
            QueryState::Ready => "ready",
        }
    }
}

/// Point-in-time view of a cache entry.
#[derive(Debug)]
pub struct QuerySnapshot<V> {
    pub state: QueryState,
    pub value: Option<Arc<V>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub fetch_count: u64,
    pub is_fetching: bool,
}

impl<V> Clone for QuerySnapshot<V> {
    fn clone(&self) -> Self {
        Self {
            state: self.state,
            value: self.value.clone(),
            updated_at: self.updated_at,
            fetch_count: self.fetch_count,
            is_fetching: self.is_fetching,
        }
    }
}

impl<V> QuerySnapshot<V> {
    fn uninitialized() -> Self {
        Self {
            state: QueryState::Uninitialized,
            value: None,
            updated_at: None,
            fetch_count: 0,
            is_fetching: false,
        }
    }
}

struct EntryState<V> {
    value: Option<Arc<V>>,
    updated_at: Option<DateTime<Utc>>,
    fetch_count: u64,
    fetching: bool,
}

struct CacheEntry<V> {
    state: Mutex<EntryState<V>>,
    fetch_lock: AsyncMutex<()>,
}

impl<V> CacheEntry<V> {
    fn new() -> Self {
        Self {
            state: Mutex::new(EntryState {
                value: None,
                updated_at: None,
                fetch_count: 0,
                fetching: false,
            }),
            fetch_lock: AsyncMutex::new(()),
        }
    }

    fn value(&self) -> Option<Arc<V>> {
        self.state.lock().unwrap().value.clone()
    }

    fn snapshot(&self) -> QuerySnapshot<V> {
        let state = self.state.lock().unwrap();
        let query_state = if state.value.is_some() {
            QueryState::Ready
        } else if state.fetching {
            QueryState::Loading
        } else {
            QueryState::Uninitialized
        };
        QuerySnapshot {
            state: query_state,
            value: state.value.clone(),
            updated_at: state.updated_at,
            fetch_count: state.fetch_count,
            is_fetching: state.fetching,
        }
    }
}

/// Clears the in-flight marker even when the producer future is dropped mid-way.
struct FetchingMarker<'a, V> {
    entry: &'a CacheEntry<V>,
}

impl<'a, V> FetchingMarker<'a, V> {
    fn start(entry: &'a CacheEntry<V>) -> Self {
        entry.state.lock().unwrap().fetching = true;
        Self { entry }
    }
}

impl<V> Drop for FetchingMarker<'_, V> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.entry.state.lock() {
            state.fetching = false;
        }
    }
}

pub struct QueryCache<V> {
    entries: Mutex<HashMap<String, Arc<CacheEntry<V>>>>,
}

impl<V> QueryCache<V>
where
    V: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entry(&self, key: &str) -> Arc<CacheEntry<V>> {
        self.entries
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(CacheEntry::new()))
            .clone()
    }

    pub fn snapshot(&self, key: &str) -> QuerySnapshot<V> {
        let entry = self.entries.lock().unwrap().get(key).cloned();
        entry
            .map(|entry| entry.snapshot())
            .unwrap_or_else(QuerySnapshot::uninitialized)
    }

    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let entry = self.entries.lock().unwrap().get(key).cloned();
        entry.and_then(|entry| entry.value())
    }

    /// Returns the cached value, running `producer` only when the entry has none.
    ///
    /// Callers arriving while another caller's producer runs wait for it and share its
    /// result.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, producer: F) -> Arc<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let entry = self.entry(key);
        if let Some(value) = entry.value() {
            return value;
        }

        let _guard = entry.fetch_lock.lock().await;
        if let Some(value) = entry.value() {
            return value;
        }
        Self::run(&entry, producer).await
    }

    /// Runs `producer` and replaces the cached value, even when one is present.
    pub async fn refetch<F, Fut>(&self, key: &str, producer: F) -> Arc<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let entry = self.entry(key);
        let _guard = entry.fetch_lock.lock().await;
        Self::run(&entry, producer).await
    }

    async fn run<F, Fut>(entry: &CacheEntry<V>, producer: F) -> Arc<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let marker = FetchingMarker::start(entry);
        let value = Arc::new(producer().await);
        {
            let mut state = entry.state.lock().unwrap();
            state.value = Some(Arc::clone(&value));
            state.updated_at = Some(Utc::now());
            state.fetch_count += 1;
        }
        drop(marker);
        value
    }

    /// Drops the entry for `key`. Returns whether one existed.
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.lock().unwrap().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> Default for QueryCache<V>
where
    V: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for QueryCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.entries.lock().map(|entries| entries.len()).unwrap_or(0);
        f.debug_struct("QueryCache").field("entries", &len).finish()
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::platform::runtime::sleep;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "current_thread")]
    async fn state_moves_from_uninitialized_to_ready() {
        let cache: QueryCache<u32> = QueryCache::new();
        assert_eq!(cache.snapshot("a").state, QueryState::Uninitialized);

        let value = cache.get_or_fetch("a", || async { 7 }).await;
        assert_eq!(*value, 7);

        let snapshot = cache.snapshot("a");
        assert_eq!(snapshot.state, QueryState::Ready);
        assert_eq!(snapshot.fetch_count, 1);
        assert!(snapshot.updated_at.is_some());
        assert!(!snapshot.is_fetching);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn cached_value_is_not_refetched() {
        let cache: QueryCache<u32> = QueryCache::new();
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        for _ in 0..3 {
            cache
                .get_or_fetch("a", move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    1
                })
                .await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn concurrent_readers_share_one_producer() {
        let cache: Arc<QueryCache<u32>> = Arc::new(QueryCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let run = |cache: Arc<QueryCache<u32>>, calls: Arc<AtomicUsize>| async move {
            cache
                .get_or_fetch("shared", move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    sleep(Duration::from_millis(20)).await;
                    42
                })
                .await
        };

        let (first, second) = futures::join!(
            run(Arc::clone(&cache), Arc::clone(&calls)),
            run(Arc::clone(&cache), Arc::clone(&calls))
        );
        assert_eq!((*first, *second), (42, 42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn loading_is_visible_while_producer_runs() {
        let cache: Arc<QueryCache<u32>> = Arc::new(QueryCache::new());
        let background = Arc::clone(&cache);
        let task = tokio::spawn(async move {
            background
                .get_or_fetch("slow", || async {
                    sleep(Duration::from_millis(50)).await;
                    3
                })
                .await;
        });

        sleep(Duration::from_millis(10)).await;
        assert_eq!(cache.snapshot("slow").state, QueryState::Loading);
        task.await.unwrap();
        assert_eq!(cache.snapshot("slow").state, QueryState::Ready);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn refetch_replaces_value_and_keys_are_independent() {
        let cache: QueryCache<u32> = QueryCache::new();
        cache.get_or_fetch("a", || async { 1 }).await;
        cache.get_or_fetch("b", || async { 10 }).await;

        cache.refetch("a", || async { 2 }).await;

        assert_eq!(cache.get("a").as_deref(), Some(&2));
        assert_eq!(cache.get("b").as_deref(), Some(&10));
        assert_eq!(cache.snapshot("a").fetch_count, 2);
        assert_eq!(cache.snapshot("b").fetch_count, 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn dropped_producer_clears_loading_flag() {
        let cache: QueryCache<u32> = QueryCache::new();
        let pending = cache.get_or_fetch("a", || async {
            sleep(Duration::from_secs(60)).await;
            1
        });
        let _ = tokio::time::timeout(Duration::from_millis(10), pending).await;
        assert_eq!(cache.snapshot("a").state, QueryState::Uninitialized);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn invalidate_drops_entry() {
        let cache: QueryCache<u32> = QueryCache::new();
        cache.get_or_fetch("a", || async { 1 }).await;
        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
        assert_eq!(cache.snapshot("a").state, QueryState::Uninitialized);
        assert!(cache.is_empty());
    }
}
