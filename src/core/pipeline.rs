//! One dashboard interaction: rate lookup, series load, projection, statistics.
//!
//! Every input arrives as a parameter so the same request always produces the
//! same view for the same provider responses.

use crate::core::config::{AppConfig, Product};
use crate::core::currency::{self, ConversionRate, CurrencyRateProvider, ResolvedRate};
use crate::core::error::{ForecastError, Result};
use crate::core::price::{DateRange, PriceSeriesLoader, SeriesSource};
use crate::core::projection::{self, ProjectedSeries};
use crate::core::stats::{Outlook, PriceSummary};
use chrono::NaiveDate;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone)]
pub struct ProjectionRequest {
    pub product: Product,
    pub source: SeriesSource,
    pub from_currency: String,
    pub to_currency: String,
    pub fallback_rate: ConversionRate,
    pub horizon: usize,
    pub history_days: u32,
}

impl ProjectionRequest {
    /// Builds a request for `product_name` using the configured currencies,
    /// fallback rate and horizon.
    pub fn from_config(
        config: &AppConfig,
        product_name: &str,
        source: SeriesSource,
        horizon: Option<usize>,
    ) -> Result<Self> {
        let product = config.find_product(product_name)?.clone();
        let fallback_rate = ConversionRate::new(config.currency.fallback_rate).ok_or_else(|| {
            ForecastError::InvalidConfig(format!(
                "configured fallback rate {} is not positive",
                config.currency.fallback_rate
            ))
        })?;
        Ok(Self {
            product,
            source,
            from_currency: config.currency.source.clone(),
            to_currency: config.currency.target.clone(),
            fallback_rate,
            horizon: horizon.unwrap_or(config.projection.horizon_days),
            history_days: config.projection.history_days,
        })
    }
}

#[derive(Debug)]
pub struct DashboardView {
    pub product: Product,
    pub source: SeriesSource,
    pub from_currency: String,
    pub to_currency: String,
    pub rate: ResolvedRate,
    pub projection: ProjectedSeries,
    pub summary: PriceSummary,
    pub outlook: Outlook,
}

/// Runs the pipeline for one request, in order and without concurrency.
///
/// A failed rate lookup never halts the run; the view carries the warning.
/// Missing, empty or too-short series stop the run with the matching error.
#[instrument(
    name = "ProjectionPipeline",
    skip_all,
    fields(product = %request.product.name, source = %request.source)
)]
pub async fn run_pipeline(
    request: &ProjectionRequest,
    rate_provider: &(dyn CurrencyRateProvider + Send + Sync),
    loader: &(dyn PriceSeriesLoader + Send + Sync),
    as_of: NaiveDate,
) -> Result<DashboardView> {
    let rate = currency::resolve_rate(
        rate_provider,
        &request.from_currency,
        &request.to_currency,
        request.fallback_rate,
    )
    .await;

    let range = DateRange::trailing(as_of, request.history_days);
    let series = loader.load_series(&request.product, &range).await?;
    debug!("Loaded {} price points for {}", series.len(), range);
    let series = currency::normalize_series(series, &request.from_currency)?;

    let projection = projection::project(&series, rate.rate, request.horizon)?;
    let summary =
        PriceSummary::from_points(projection.historical()).ok_or(ForecastError::EmptySeries)?;
    let outlook = Outlook::from_predicted(projection.predicted());

    info!(
        slope = projection.fit.slope,
        intercept = projection.fit.intercept,
        "Projected {} days for {}",
        projection.horizon(),
        request.product.name
    );

    Ok(DashboardView {
        product: request.product.clone(),
        source: request.source,
        from_currency: request.from_currency.clone(),
        to_currency: request.to_currency.clone(),
        rate,
        projection,
        summary,
        outlook,
    })
}
