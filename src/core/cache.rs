//! Key-value result cache used by the provider wrappers.
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait Cache<K, V>: Send + Sync
where
    K: Send + Sync,
    V: Clone + Send + Sync,
{
    /// Returns the value for `key` unless it is absent or expired.
    async fn get(&self, key: &K) -> Option<V>;

    /// Stores `value`; `None` keeps it until removed.
    async fn put(&self, key: K, value: V, ttl: Option<Duration>);

    async fn remove(&self, key: &K);

    async fn clear(&self);
}
