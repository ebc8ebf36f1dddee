pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::{AppConfig, RateSource};
use crate::core::{CurrencyRateProvider, PricePoint, PriceSeriesLoader, SeriesSource};
use crate::providers::caching::{CachingRateProvider, CachingSeriesLoader};
use crate::providers::csv_file::CsvSeriesLoader;
use crate::providers::exchange_rate::ExchangeRateApiProvider;
use crate::providers::yahoo_finance::{YahooCurrencyProvider, YahooSeriesLoader};
use crate::store::MemoryCache;
use anyhow::Result;
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub enum AppCommand {
    Products,
    Show {
        product: String,
        source: SeriesSource,
        horizon: Option<usize>,
    },
    Dashboard,
}

/// Where "today" comes from when building the trailing date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    Local,
    Fixed(NaiveDate),
}

impl Clock {
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::Local => Local::now().date_naive(),
            Clock::Fixed(date) => *date,
        }
    }
}

/// Providers wired from config, shared by every interaction of a run.
pub struct AppContext {
    pub config: AppConfig,
    pub rate_provider: Box<dyn CurrencyRateProvider + Send + Sync>,
    csv_loader: Box<dyn PriceSeriesLoader + Send + Sync>,
    yahoo_loader: Box<dyn PriceSeriesLoader + Send + Sync>,
    rate_cache: Arc<MemoryCache<String, f64>>,
    series_cache: Arc<MemoryCache<String, Vec<PricePoint>>>,
}

impl AppContext {
    pub fn from_config(config: AppConfig) -> Self {
        let ttl = Some(Duration::from_secs(config.cache.ttl_secs));
        let rate_cache = Arc::new(MemoryCache::<String, f64>::new());
        let series_cache = Arc::new(MemoryCache::<String, Vec<PricePoint>>::new());

        let rate_provider: Box<dyn CurrencyRateProvider + Send + Sync> = match config.rates.provider
        {
            RateSource::ExchangeRateApi => Box::new(CachingRateProvider::new(
                ExchangeRateApiProvider::new(config.providers.exchange_rate_base_url()),
                rate_cache.clone(),
                ttl,
            )),
            RateSource::Yahoo => Box::new(CachingRateProvider::new(
                YahooCurrencyProvider::new(config.providers.yahoo_base_url()),
                rate_cache.clone(),
                ttl,
            )),
        };

        // Static files do not change under a running session, so they never expire.
        let csv_loader = Box::new(CachingSeriesLoader::new(
            CsvSeriesLoader::new(config.data_dir(), &config.currency.source),
            "csv",
            series_cache.clone(),
            None,
        ));
        let yahoo_loader = Box::new(CachingSeriesLoader::new(
            YahooSeriesLoader::new(config.providers.yahoo_base_url()),
            "yahoo",
            series_cache.clone(),
            ttl,
        ));

        AppContext {
            config,
            rate_provider,
            csv_loader,
            yahoo_loader,
            rate_cache,
            series_cache,
        }
    }

    pub async fn log_cache_stats(&self) {
        let rates = self.rate_cache.stats().await;
        let series = self.series_cache.stats().await;
        debug!(
            rate_entries = self.rate_cache.len().await,
            rate_hits = rates.hits,
            rate_misses = rates.misses,
            series_entries = self.series_cache.len().await,
            series_hits = series.hits,
            series_misses = series.misses,
            "Cache usage"
        );
    }

    pub fn loader(&self, source: SeriesSource) -> &(dyn PriceSeriesLoader + Send + Sync) {
        match source {
            SeriesSource::Csv => self.csv_loader.as_ref(),
            SeriesSource::Yahoo => self.yahoo_loader.as_ref(),
        }
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    run_with_clock(command, config_path, Clock::Local).await
}

/// Same as [`run_command`] with a fixed "today" for the remote date range.
pub async fn run_command_as_of(
    command: AppCommand,
    config_path: Option<&str>,
    as_of: NaiveDate,
) -> Result<()> {
    run_with_clock(command, config_path, Clock::Fixed(as_of)).await
}

async fn run_with_clock(command: AppCommand, config_path: Option<&str>, clock: Clock) -> Result<()> {
    info!("Agricultural price predictor starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let ctx = AppContext::from_config(config);

    match command {
        AppCommand::Products => cli::products::run(&ctx.config.products),
        AppCommand::Show {
            product,
            source,
            horizon,
        } => cli::show::run(&ctx, &product, source, horizon, clock.today()).await,
        AppCommand::Dashboard => cli::dashboard::run(&ctx, clock).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_never_moves() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        assert_eq!(Clock::Fixed(date).today(), date);
        assert_eq!(Clock::Fixed(date).today(), date);
    }

    #[test]
    fn test_local_clock_reads_current_date() {
        let before = Local::now().date_naive();
        let today = Clock::Local.today();
        let after = Local::now().date_naive();
        assert!(before <= today && today <= after);
    }

    #[tokio::test]
    async fn test_fresh_context_reports_empty_caches() {
        let ctx = AppContext::from_config(AppConfig::default());
        assert_eq!(ctx.series_cache.len().await, 0);
        assert_eq!(ctx.rate_cache.stats().await, store::CacheStats::default());
        ctx.log_cache_stats().await;
    }
}
