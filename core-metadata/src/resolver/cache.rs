//! Process-lifetime result memo table

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Key to result map, one per artifact kind.
///
/// Entries are never evicted. [`get_or_compute`](ResultCache::get_or_compute)
/// holds a per-key lock across lookup, computation and store, so concurrent
/// callers with the same key compute once.
pub struct ResultCache<V> {
    entries: Mutex<HashMap<String, V>>,
    key_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<V: Clone> ResultCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.entries.lock().await.get(key).cloned()
    }

    /// Store unconditionally, replacing any previous entry
    pub async fn put(&self, key: impl Into<String>, value: V) {
        self.entries.lock().await.insert(key.into(), value);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Cached value for `key`, or the stored output of `compute`.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let lock = self.key_lock(key).await;
        let _guard = lock.lock().await;

        if let Some(value) = self.get(key).await {
            debug!(key = %key, "Cache hit");
            return value;
        }

        let value = compute().await;
        self.put(key, value.clone()).await;
        value
    }

    /// Recompute and overwrite, under the same per-key lock.
    pub async fn recompute<F, Fut>(&self, key: &str, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let lock = self.key_lock(key).await;
        let _guard = lock.lock().await;

        let value = compute().await;
        self.put(key, value.clone()).await;
        value
    }

    async fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.key_locks.lock().await;
        Arc::clone(locks.entry(key.to_string()).or_default())
    }
}

impl<V: Clone> Default for ResultCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
