use crate::core::cache::Cache;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

struct Entry<V> {
    value: V,
    stored_at: Instant,
    ttl: Option<Duration>,
}

impl<V> Entry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        self.ttl
            .is_none_or(|ttl| now.duration_since(self.stored_at) < ttl)
    }
}

/// Hit and miss counters for a [`MemoryCache`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

struct State<K, V> {
    entries: HashMap<K, Entry<V>>,
    stats: CacheStats,
}

/// Process-local cache for rates and price series. Entries with a TTL are
/// dropped on the first read after expiry and swept on every write.
pub struct MemoryCache<K, V> {
    state: Arc<Mutex<State<K, V>>>,
}

impl<K, V> MemoryCache<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                entries: HashMap::new(),
                stats: CacheStats::default(),
            })),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn stats(&self) -> CacheStats {
        self.state.lock().await.stats
    }
}

impl<K, V> Default for MemoryCache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K, V> Cache<K, V> for MemoryCache<K, V>
where
    K: Eq + Hash + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Option<V> {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        let fresh = state.entries.get(key).map(|entry| entry.is_fresh(now));
        match fresh {
            Some(true) => {
                state.stats.hits += 1;
                debug!(?key, "cache hit");
                state.entries.get(key).map(|entry| entry.value.clone())
            }
            Some(false) => {
                state.entries.remove(key);
                state.stats.misses += 1;
                debug!(?key, "cache entry expired");
                None
            }
            None => {
                state.stats.misses += 1;
                debug!(?key, "cache miss");
                None
            }
        }
    }

    async fn put(&self, key: K, value: V, ttl: Option<Duration>) {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        let before = state.entries.len();
        state.entries.retain(|_, entry| entry.is_fresh(now));
        let swept = before - state.entries.len();
        if swept > 0 {
            debug!(swept, "dropped expired cache entries");
        }

        debug!(?key, ?ttl, "cache put");
        state.entries.insert(
            key,
            Entry {
                value,
                stored_at: now,
                ttl,
            },
        );
    }

    async fn remove(&self, key: &K) {
        self.state.lock().await.entries.remove(key);
    }

    async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.entries.clear();
        state.stats = CacheStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn key(s: &str) -> String {
        s.to_string()
    }

    #[tokio::test]
    async fn test_hits_and_misses_are_counted() {
        let cache = MemoryCache::<String, f64>::new();

        assert!(cache.get(&key("USD-INR")).await.is_none());
        cache.put(key("USD-INR"), 83.1, None).await;
        assert_eq!(cache.get(&key("USD-INR")).await, Some(83.1));
        assert_eq!(cache.get(&key("USD-INR")).await, Some(83.1));
        assert!(cache.get(&key("USD-EUR")).await.is_none());

        assert_eq!(cache.stats().await, CacheStats { hits: 2, misses: 2 });
    }

    #[tokio::test]
    async fn test_expired_entry_is_evicted_on_read() {
        let cache = MemoryCache::<String, f64>::new();

        cache
            .put(key("USD-INR"), 83.1, Some(Duration::from_millis(10)))
            .await;
        assert_eq!(cache.get(&key("USD-INR")).await, Some(83.1));

        sleep(Duration::from_millis(20)).await;
        assert!(cache.get(&key("USD-INR")).await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_put_sweeps_expired_entries() {
        let cache = MemoryCache::<String, f64>::new();

        cache
            .put(key("short"), 1.0, Some(Duration::from_millis(10)))
            .await;
        cache.put(key("forever"), 2.0, None).await;
        sleep(Duration::from_millis(20)).await;

        cache.put(key("new"), 3.0, Some(Duration::from_secs(60))).await;
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get(&key("forever")).await, Some(2.0));
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let cache = MemoryCache::<String, f64>::new();

        cache.put(key("a"), 1.0, None).await;
        cache.put(key("b"), 2.0, None).await;

        cache.remove(&key("a")).await;
        assert!(cache.get(&key("a")).await.is_none());
        assert_eq!(cache.get(&key("b")).await, Some(2.0));

        cache.clear().await;
        assert_eq!(cache.len().await, 0);
        assert_eq!(cache.stats().await, CacheStats::default());
    }
}
