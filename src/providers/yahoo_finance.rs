use crate::core::config::Product;
use crate::core::currency::CurrencyRateProvider;
use crate::core::error::{ForecastError, Result as SeriesResult};
use crate::core::price::{DateRange, PricePoint, PriceSeriesLoader};
use crate::providers::util::{RetryPolicy, with_retry};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, instrument};

const USER_AGENT: &str = "agriprice/0.1";

fn day_start_timestamp(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Pairs timestamps with closes, dropping bars without a usable close.
fn extract_daily_closes(item: &PriceChartItem, currency: &str) -> Vec<PricePoint> {
    let closes = item
        .indicators
        .as_ref()
        .and_then(|inds| inds.quote.first())
        .and_then(|q| q.close.as_ref());

    match (item.timestamp.as_ref(), closes) {
        (Some(timestamps), Some(closes)) => timestamps
            .iter()
            .zip(closes)
            .filter_map(|(ts, close)| {
                let close = close.filter(|c| c.is_finite() && *c > 0.0)?;
                let date = DateTime::from_timestamp(*ts, 0)?.date_naive();
                Some(PricePoint::new(date, close, currency))
            })
            .collect(),
        _ => Vec::new(),
    }
}

// YahooSeriesLoader implementation for PriceSeriesLoader
pub struct YahooSeriesLoader {
    base_url: String,
    retry: RetryPolicy,
}

impl YahooSeriesLoader {
    pub fn new(base_url: &str) -> Self {
        YahooSeriesLoader {
            base_url: base_url.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_chart(&self, ticker: &str, range: &DateRange) -> Result<Vec<PricePoint>> {
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d",
            self.base_url,
            ticker,
            day_start_timestamp(range.start),
            day_start_timestamp(range.end + Duration::days(1)),
        );
        debug!("Requesting price series from {}", url);

        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        let response = with_retry(
            || async {
                let response = client.get(&url).send().await?;
                if response.status().is_server_error() {
                    response.error_for_status()
                } else {
                    Ok(response)
                }
            },
            self.retry,
        )
        .await
        .with_context(|| format!("Request failed for symbol: {ticker}"))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response for symbol: {ticker}"))?;

        // Unknown symbols and empty ranges come back as 404 with a chart error body.
        if status == StatusCode::NOT_FOUND
            && let Ok(data) = serde_json::from_str::<YahooChartResponse>(&text)
            && data.chart.result.is_none()
            && let Some(err) = data.chart.error
        {
            debug!(
                "No data for {}: {} ({})",
                ticker,
                err.code,
                err.description.unwrap_or_default()
            );
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(anyhow!(
                "Request failed for symbol: {}: HTTP error: {}",
                ticker,
                status
            ));
        }

        let data: YahooChartResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", ticker, e))?;

        let Some(item) = data.chart.result.unwrap_or_default().into_iter().next() else {
            debug!("No chart result for {}", ticker);
            return Ok(Vec::new());
        };

        let currency = item.meta.currency.as_deref().unwrap_or("USD");
        Ok(extract_daily_closes(&item, currency))
    }
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: PriceChartResult,
}

#[derive(Deserialize, Debug)]
struct PriceChartResult {
    result: Option<Vec<PriceChartItem>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Deserialize, Debug)]
struct PriceChartItem {
    meta: PriceChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct PriceChartMeta {
    currency: Option<String>,
}

#[async_trait]
impl PriceSeriesLoader for YahooSeriesLoader {
    #[instrument(
        name = "YahooSeriesFetch",
        skip(self, product),
        fields(ticker = %product.ticker)
    )]
    async fn load_series(
        &self,
        product: &Product,
        range: &DateRange,
    ) -> SeriesResult<Vec<PricePoint>> {
        let series = self
            .fetch_chart(&product.ticker, range)
            .await
            .map_err(ForecastError::FetchFailed)?;
        debug!("Received {} closes for {}", series.len(), product.ticker);
        Ok(series)
    }
}

// YahooCurrencyProvider implementation for CurrencyRateProvider
pub struct YahooCurrencyProvider {
    base_url: String,
}

impl YahooCurrencyProvider {
    pub fn new(base_url: &str) -> Self {
        YahooCurrencyProvider {
            base_url: base_url.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct YahooCurrencyResponse {
    chart: CurrencyChartResult,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartResult {
    result: Vec<CurrencyChartItem>,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartItem {
    meta: CurrencyChartMeta,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: f64,
}

#[async_trait]
impl CurrencyRateProvider for YahooCurrencyProvider {
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64> {
        let symbol = format!("{from}{to}=X");
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        debug!("Requesting currency rate from {}", url);

        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for currency pair: {}", e, symbol))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for currency pair: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;
        let data: YahooCurrencyResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

        let item = data
            .chart
            .result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No rate data found for currency pair: {}", symbol))?;

        Ok(item.meta.regular_market_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::default_products;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(symbol: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        let request_path = format!("/v8/finance/chart/{symbol}");

        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn wheat() -> Product {
        default_products().remove(0)
    }

    fn range() -> DateRange {
        DateRange {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        }
    }

    fn no_delay() -> RetryPolicy {
        RetryPolicy {
            retries: 2,
            delay_ms: 0,
        }
    }

    #[tokio::test]
    async fn test_successful_series_fetch() {
        // 2024-01-02, 2024-01-03 (null close), 2024-01-04 at 05:00 UTC
        let mock_response = r#"{
            "chart": {
                "result": [{
                    "meta": { "currency": "USX", "regularMarketPrice": 601.5 },
                    "timestamp": [1704171600, 1704258000, 1704344400],
                    "indicators": { "quote": [{ "close": [598.25, null, 601.5] }] }
                }]
            }
        }"#;
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/ZW=F"))
            .and(query_param("interval", "1d"))
            .and(query_param("period1", "1704067200"))
            .and(query_param("period2", "1704931200"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        let loader = YahooSeriesLoader::new(&mock_server.uri());
        let series = loader.load_series(&wheat(), &range()).await.unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(series[0].price, 598.25);
        assert_eq!(series[0].currency, "USX");
        assert_eq!(series[1].date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert_eq!(series[1].price, 601.5);
    }

    #[tokio::test]
    async fn test_empty_result_is_empty_series() {
        let mock_server = create_mock_server("ZW=F", 200, r#"{"chart": {"result": []}}"#).await;
        let loader = YahooSeriesLoader::new(&mock_server.uri());
        let series = loader.load_series(&wheat(), &range()).await.unwrap();
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn test_result_without_bars_is_empty_series() {
        let mock_response = r#"{
            "chart": { "result": [{ "meta": { "currency": "USX" } }], "error": null }
        }"#;
        let mock_server = create_mock_server("ZW=F", 200, mock_response).await;
        let loader = YahooSeriesLoader::new(&mock_server.uri());
        let series = loader.load_series(&wheat(), &range()).await.unwrap();
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_retried_then_fails() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/ZW=F"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&mock_server)
            .await;

        let loader = YahooSeriesLoader::new(&mock_server.uri()).with_retry_policy(no_delay());
        let result = loader.load_series(&wheat(), &range()).await;
        match result {
            Err(ForecastError::FetchFailed(e)) => {
                assert!(e.to_string().contains("Request failed for symbol: ZW=F"))
            }
            other => panic!("Expected FetchFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_symbol_404_is_empty_series() {
        let mock_response = r#"{
            "chart": {
                "result": null,
                "error": {
                    "code": "Not Found",
                    "description": "No data found, symbol may be delisted"
                }
            }
        }"#;
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/ZR=F"))
            .respond_with(ResponseTemplate::new(404).set_body_string(mock_response))
            .expect(1)
            .mount(&mock_server)
            .await;

        let rice = default_products().remove(1);
        let loader = YahooSeriesLoader::new(&mock_server.uri()).with_retry_policy(no_delay());
        let series = loader.load_series(&rice, &range()).await.unwrap();
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/ZW=F"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let loader = YahooSeriesLoader::new(&mock_server.uri()).with_retry_policy(no_delay());
        match loader.load_series(&wheat(), &range()).await {
            Err(ForecastError::FetchFailed(e)) => {
                assert!(e.to_string().contains("403 Forbidden"))
            }
            other => panic!("Expected FetchFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_positive_closes_are_dropped() {
        let mock_response = r#"{
            "chart": {
                "result": [{
                    "meta": { "currency": "USX" },
                    "timestamp": [1704171600, 1704258000, 1704344400],
                    "indicators": { "quote": [{ "close": [0.0, -3.5, 601.5] }] }
                }]
            }
        }"#;
        let mock_server = create_mock_server("ZW=F", 200, mock_response).await;
        let loader = YahooSeriesLoader::new(&mock_server.uri());
        let series = loader.load_series(&wheat(), &range()).await.unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].price, 601.5);
    }

    #[tokio::test]
    async fn test_malformed_series_response() {
        let mock_server = create_mock_server("ZW=F", 200, "not json").await;
        let loader = YahooSeriesLoader::new(&mock_server.uri());
        let result = loader.load_series(&wheat(), &range()).await;
        match result {
            Err(ForecastError::FetchFailed(e)) => assert!(
                e.to_string()
                    .contains("Failed to parse JSON response for ZW=F")
            ),
            other => panic!("Expected FetchFailed, got {other:?}"),
        }
    }

    // Tests for YahooCurrencyProvider (CurrencyRateProvider)
    #[tokio::test]
    async fn test_successful_rate_fetch() {
        let mock_response = r#"{
            "chart": { "result": [{ "meta": { "regularMarketPrice": 83.4512 } }] }
        }"#;
        let mock_server = create_mock_server("USDINR=X", 200, mock_response).await;
        let provider = YahooCurrencyProvider::new(&mock_server.uri());

        let rate = provider
            .get_rate("USD", "INR")
            .await
            .expect("Failed to get rate");
        assert_eq!(rate, 83.4512);
    }

    #[tokio::test]
    async fn test_no_currency_rate_found() {
        let mock_server = create_mock_server("USDINR=X", 200, r#"{"chart": {"result": []}}"#).await;
        let provider = YahooCurrencyProvider::new(&mock_server.uri());

        let result = provider.get_rate("USD", "INR").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No rate data found for currency pair: USDINR=X"
        );
    }

    #[tokio::test]
    async fn test_yahoo_currency_api_error_response() {
        let mock_server = create_mock_server("USDINR=X", 500, "").await;
        let provider = YahooCurrencyProvider::new(&mock_server.uri());

        let result = provider.get_rate("USD", "INR").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 500 Internal Server Error for currency pair: USDINR=X"
        );
    }
}
