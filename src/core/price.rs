//! Price series abstractions and core types

use crate::core::config::Product;
use crate::core::error::Result;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// A single observed closing price in the source currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
    pub currency: String,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64, currency: &str) -> Self {
        Self {
            date,
            price,
            currency: currency.to_string(),
        }
    }
}

/// Inclusive calendar range requested from a loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// The `days` calendar days leading up to and including `end`.
    pub fn trailing(end: NaiveDate, days: u32) -> Self {
        Self {
            start: end - Duration::days(i64::from(days)),
            end,
        }
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesSource {
    Csv,
    Yahoo,
}

impl Display for SeriesSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SeriesSource::Csv => "CSV",
                SeriesSource::Yahoo => "Yahoo Finance",
            }
        )
    }
}

impl FromStr for SeriesSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" | "file" => Ok(SeriesSource::Csv),
            "yahoo" | "yahoo finance" | "remote" => Ok(SeriesSource::Yahoo),
            _ => Err(anyhow::anyhow!("Invalid data source: {}", s)),
        }
    }
}

#[async_trait]
pub trait PriceSeriesLoader: Send + Sync {
    /// Loads the closing price series for `product`.
    ///
    /// An empty vector means the source had no rows for the request; it is not
    /// an error at this layer.
    async fn load_series(&self, product: &Product, range: &DateRange) -> Result<Vec<PricePoint>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_source_from_str() {
        assert_eq!("CSV".parse::<SeriesSource>().unwrap(), SeriesSource::Csv);
        assert_eq!(
            " yahoo ".parse::<SeriesSource>().unwrap(),
            SeriesSource::Yahoo
        );
        assert_eq!(
            "Yahoo Finance".parse::<SeriesSource>().unwrap(),
            SeriesSource::Yahoo
        );
        assert!("bloomberg".parse::<SeriesSource>().is_err());
    }

    #[test]
    fn test_trailing_range() {
        let end = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let range = DateRange::trailing(end, 180);
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(range.end, end);
        assert_eq!(range.to_string(), "2024-01-03:2024-07-01");
    }
}
