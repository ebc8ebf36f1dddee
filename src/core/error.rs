//! Error taxonomy for the price pipeline.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("No price data available")]
    EmptySeries,
    #[error("At least 2 price points are needed to fit a trend, got {points}")]
    InsufficientData { points: usize },
    #[error("Price file not found: {}", .0.display())]
    ResourceNotFound(PathBuf),
    #[error("Failed to fetch exchange rate: {0}")]
    RateFetchFailed(String),
    #[error("Malformed price data: {0}")]
    MalformedData(String),
    #[error("Failed to fetch price data: {0:#}")]
    FetchFailed(anyhow::Error),
    #[error("Unknown product: {0}")]
    UnknownProduct(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ForecastError>;
