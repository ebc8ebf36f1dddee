//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod currency;
pub mod error;
pub mod log;
pub mod pipeline;
pub mod price;
pub mod projection;
pub mod stats;

// Re-export main types for cleaner imports
pub use currency::{ConversionRate, CurrencyRateProvider, ResolvedRate};
pub use error::ForecastError;
pub use price::{DateRange, PricePoint, PriceSeriesLoader, SeriesSource};
pub use projection::{PointKind, ProjectedSeries};
