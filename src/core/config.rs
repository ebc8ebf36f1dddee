use crate::core::error::ForecastError;
use crate::core::projection::DEFAULT_HORIZON_DAYS;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Product {
    pub name: String,
    pub ticker: String,
    pub csv: String,
    /// Known data issue shown alongside the product.
    pub note: Option<String>,
}

impl Product {
    fn new(name: &str, ticker: &str, csv: &str) -> Self {
        Product {
            name: name.to_string(),
            ticker: ticker.to_string(),
            csv: csv.to_string(),
            note: None,
        }
    }
}

/// The commodity catalog used when the config file does not list products.
pub fn default_products() -> Vec<Product> {
    let mut rice = Product::new("Rice", "ZR=F", "rice.csv");
    rice.note = Some(
        "Ticker is inconsistent across catalog sources (ZR=F vs. another listed symbol); \
         verify the Yahoo series before relying on it"
            .to_string(),
    );

    vec![
        Product::new("Wheat", "ZW=F", "wheat.csv"),
        rice,
        Product::new("Corn", "ZC=F", "corn.csv"),
        Product::new("Soybean", "ZS=F", "soybean.csv"),
        Product::new("Cotton", "CT=F", "cotton.csv"),
        Product::new("Sugar", "SB=F", "sugar.csv"),
        Product::new("Coffee", "KC=F", "coffee.csv"),
        Product::new("Cocoa", "CC=F", "cocoa.csv"),
        Product::new("Oats", "ZO=F", "oats.csv"),
        Product::new("Orange Juice", "OJ=F", "orange_juice.csv"),
    ]
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeRateProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
    pub exchange_rate: Option<ExchangeRateProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
            exchange_rate: Some(ExchangeRateProviderConfig {
                base_url: "https://api.exchangerate-api.com".to_string(),
            }),
        }
    }
}

impl ProvidersConfig {
    pub fn yahoo_base_url(&self) -> &str {
        self.yahoo
            .as_ref()
            .map_or("https://query1.finance.yahoo.com", |p| &p.base_url)
    }

    pub fn exchange_rate_base_url(&self) -> &str {
        self.exchange_rate
            .as_ref()
            .map_or("https://api.exchangerate-api.com", |p| &p.base_url)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    #[default]
    ExchangeRateApi,
    Yahoo,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RatesConfig {
    #[serde(default)]
    pub provider: RateSource,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CurrencyConfig {
    pub source: String,
    pub target: String,
    pub fallback_rate: f64,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        CurrencyConfig {
            source: "USD".to_string(),
            target: "INR".to_string(),
            fallback_rate: 75.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProjectionConfig {
    pub horizon_days: usize,
    /// Trailing window requested from remote sources.
    pub history_days: u32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        ProjectionConfig {
            horizon_days: DEFAULT_HORIZON_DAYS,
            history_days: 180,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig { ttl_secs: 3600 }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_products")]
    pub products: Vec<Product>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub rates: RatesConfig,
    #[serde(default)]
    pub currency: CurrencyConfig,
    #[serde(default)]
    pub projection: ProjectionConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Directory holding the per-product CSV files.
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            products: default_products(),
            providers: ProvidersConfig::default(),
            rates: RatesConfig::default(),
            currency: CurrencyConfig::default(),
            projection: ProjectionConfig::default(),
            cache: CacheConfig::default(),
            data_path: None,
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, or built-in defaults when
    /// no file has been set up yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "agriprice", "agriprice")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    /// Directory the CSV loader reads from; the working directory by default.
    pub fn data_dir(&self) -> PathBuf {
        self.data_path
            .as_ref()
            .map_or_else(|| PathBuf::from("."), PathBuf::from)
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.products.is_empty() {
            bail!("At least one product must be configured");
        }
        if !(self.currency.fallback_rate.is_finite() && self.currency.fallback_rate > 0.0) {
            bail!(
                "Fallback rate must be a positive number, got {}",
                self.currency.fallback_rate
            );
        }
        if self.projection.horizon_days == 0 {
            bail!("Projection horizon must be at least one day");
        }
        Ok(())
    }

    /// Case-insensitive product lookup by name.
    pub fn find_product(&self, name: &str) -> Result<&Product, ForecastError> {
        self.products
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| ForecastError::UnknownProduct(name.to_string()))
    }
}
