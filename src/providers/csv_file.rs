//! Static price tables: one `Date,Price` CSV file per product.
use crate::core::config::Product;
use crate::core::error::{ForecastError, Result};
use crate::core::price::{DateRange, PricePoint, PriceSeriesLoader};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::path::PathBuf;
use tracing::debug;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y"];
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
                .ok()
                .map(|dt| dt.date())
        })
}

/// Parses a two-column table. Header names are ignored; the columns are read
/// positionally as date and price.
pub fn parse_price_table(contents: &str, currency: &str) -> Result<Vec<PricePoint>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(contents.as_bytes());

    let mut series = Vec::new();
    for (index, record) in reader.records().enumerate() {
        // Header is line 1
        let line = index + 2;
        let record = record.map_err(|e| ForecastError::MalformedData(e.to_string()))?;
        if record.len() != 2 {
            return Err(ForecastError::MalformedData(format!(
                "line {line}: expected 2 columns, found {}",
                record.len()
            )));
        }

        let date = parse_date(&record[0]).ok_or_else(|| {
            ForecastError::MalformedData(format!("line {line}: invalid date '{}'", &record[0]))
        })?;
        let price = record[1]
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| {
                ForecastError::MalformedData(format!("line {line}: invalid price '{}'", &record[1]))
            })?;

        series.push(PricePoint::new(date, price, currency));
    }
    Ok(series)
}

pub struct CsvSeriesLoader {
    data_dir: PathBuf,
    currency: String,
}

impl CsvSeriesLoader {
    pub fn new(data_dir: impl Into<PathBuf>, currency: &str) -> Self {
        CsvSeriesLoader {
            data_dir: data_dir.into(),
            currency: currency.to_string(),
        }
    }

    pub fn path_for(&self, product: &Product) -> PathBuf {
        self.data_dir.join(&product.csv)
    }
}

#[async_trait]
impl PriceSeriesLoader for CsvSeriesLoader {
    /// Reads the whole file; the requested range does not narrow it.
    async fn load_series(&self, product: &Product, _range: &DateRange) -> Result<Vec<PricePoint>> {
        let path = self.path_for(product);
        debug!("Reading price table {}", path.display());

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ForecastError::ResourceNotFound(path));
            }
            Err(e) => {
                return Err(ForecastError::FetchFailed(anyhow::Error::new(e).context(
                    format!("Failed to read price table: {}", path.display()),
                )));
            }
        };

        let series = parse_price_table(&contents, &self.currency)?;
        debug!("Parsed {} rows from {}", series.len(), path.display());
        Ok(series)
    }
}
