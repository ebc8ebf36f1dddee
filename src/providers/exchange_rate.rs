//! Rates from the exchangerate-api.com `latest` endpoint.
use crate::core::currency::CurrencyRateProvider;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

pub struct ExchangeRateApiProvider {
    base_url: String,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str) -> Self {
        ExchangeRateApiProvider {
            base_url: base_url.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: HashMap<String, f64>,
}

#[async_trait]
impl CurrencyRateProvider for ExchangeRateApiProvider {
    #[instrument(name = "ExchangeRateFetch", skip(self))]
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64> {
        let url = format!("{}/v4/latest/{}", self.base_url, from);
        debug!("Requesting latest rates from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("agriprice/0.1")
            .build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request error for base currency: {from}"))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for base currency: {}",
                response.status(),
                from
            ));
        }

        let text = response.text().await?;
        let data: LatestRatesResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse rates response for {}: {}", from, e))?;

        data.rates
            .get(to)
            .copied()
            .ok_or_else(|| anyhow!("No {} rate in response for base currency: {}", to, from))
    }
}
