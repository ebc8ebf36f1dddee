use crate::core::cache::Cache;
use crate::core::config::Product;
use crate::core::currency::CurrencyRateProvider;
use crate::core::error::Result as SeriesResult;
use crate::core::price::{DateRange, PricePoint, PriceSeriesLoader};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

// Caching for CurrencyRateProvider. Only successful lookups are stored so a
// failed fetch is retried on the next interaction.
pub struct CachingRateProvider<T: CurrencyRateProvider> {
    inner: T,
    cache: Arc<dyn Cache<String, f64>>,
    ttl: Option<Duration>,
}

impl<T: CurrencyRateProvider> CachingRateProvider<T> {
    pub fn new(inner: T, cache: Arc<dyn Cache<String, f64>>, ttl: Option<Duration>) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait]
impl<T: CurrencyRateProvider + Send + Sync> CurrencyRateProvider for CachingRateProvider<T> {
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64> {
        let key = format!("{from}-{to}");
        if let Some(rate) = self.cache.get(&key).await {
            debug!("Cache hit for currency rate: {}", key);
            return Ok(rate);
        }
        debug!("Cache miss for currency rate: {}", key);
        let rate = self.inner.get_rate(from, to).await?;
        self.cache.put(key, rate, self.ttl).await;
        Ok(rate)
    }
}

// Caching for PriceSeriesLoader, keyed by source label, product and range.
pub struct CachingSeriesLoader<T: PriceSeriesLoader> {
    inner: T,
    label: String,
    cache: Arc<dyn Cache<String, Vec<PricePoint>>>,
    ttl: Option<Duration>,
}

impl<T: PriceSeriesLoader> CachingSeriesLoader<T> {
    pub fn new(
        inner: T,
        label: &str,
        cache: Arc<dyn Cache<String, Vec<PricePoint>>>,
        ttl: Option<Duration>,
    ) -> Self {
        Self {
            inner,
            label: label.to_string(),
            cache,
            ttl,
        }
    }
}

#[async_trait]
impl<T: PriceSeriesLoader + Send + Sync> PriceSeriesLoader for CachingSeriesLoader<T> {
    async fn load_series(
        &self,
        product: &Product,
        range: &DateRange,
    ) -> SeriesResult<Vec<PricePoint>> {
        let key = format!(
            "{}:{}:{}:{}",
            self.label, product.ticker, product.csv, range
        );
        if let Some(series) = self.cache.get(&key).await {
            debug!("Cache hit for series: {}", key);
            return Ok(series);
        }
        debug!("Cache miss for series: {}", key);
        let series = self.inner.load_series(product, range).await?;
        self.cache.put(key, series.clone(), self.ttl).await;
        Ok(series)
    }
}
