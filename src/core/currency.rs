//! Currency conversion abstractions

use crate::core::error::ForecastError;
use crate::core::price::PricePoint;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Display;
use tracing::{debug, warn};

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64>;
}

/// A positive, finite multiplier from the source currency to the target currency.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ConversionRate(f64);

impl ConversionRate {
    pub fn new(rate: f64) -> Option<Self> {
        (rate.is_finite() && rate > 0.0).then_some(Self(rate))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn convert(&self, amount: f64) -> f64 {
        amount * self.0
    }
}

impl Display for ConversionRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Outcome of a rate lookup. `warning` is set when the fallback was used.
#[derive(Debug)]
pub struct ResolvedRate {
    pub rate: ConversionRate,
    pub warning: Option<ForecastError>,
}

impl ResolvedRate {
    pub fn is_fallback(&self) -> bool {
        self.warning.is_some()
    }
}

/// Fetches the current rate, substituting `fallback` on any failure.
///
/// Never fails: network errors, malformed responses and non-positive rates all
/// resolve to the fallback with a `RateFetchFailed` warning attached.
pub async fn resolve_rate(
    provider: &(dyn CurrencyRateProvider + Send + Sync),
    from: &str,
    to: &str,
    fallback: ConversionRate,
) -> ResolvedRate {
    if from.eq_ignore_ascii_case(to) {
        debug!("Source and target currency are both {}, using rate 1", from);
        return ResolvedRate {
            rate: ConversionRate(1.0),
            warning: None,
        };
    }

    let failure = match provider.get_rate(from, to).await {
        Ok(rate) => match ConversionRate::new(rate) {
            Some(rate) => {
                debug!("Resolved rate {}->{}: {}", from, to, rate.value());
                return ResolvedRate {
                    rate,
                    warning: None,
                };
            }
            None => format!("provider returned an invalid rate {rate} for {from}->{to}"),
        },
        Err(e) => format!("{e:#}"),
    };

    warn!(
        "Rate lookup {}->{} failed ({}), using fallback 1 {} = {} {}",
        from, to, failure, from, fallback, to
    );
    ResolvedRate {
        rate: fallback,
        warning: Some(ForecastError::RateFetchFailed(failure)),
    }
}

/// Quote units that are a fixed fraction of a major currency, as reported by
/// exchanges (US grain futures quote in cents).
const MINOR_UNITS: &[(&str, &str, f64)] = &[
    ("USX", "USD", 100.0),
    ("USc", "USD", 100.0),
    ("GBp", "GBP", 100.0),
    ("GBX", "GBP", 100.0),
    ("ZAc", "ZAR", 100.0),
    ("ILA", "ILS", 100.0),
];

fn minor_unit(code: &str) -> Option<(&'static str, f64)> {
    MINOR_UNITS
        .iter()
        .find(|(minor, _, _)| *minor == code)
        .map(|(_, major, divisor)| (*major, *divisor))
}

/// Expresses every point in `expected`, rescaling minor-unit quotes such as
/// `USX` to their major currency. Points quoted in any other currency fail
/// with `MalformedData`, since the resolved rate would not apply to them.
pub fn normalize_series(
    points: Vec<PricePoint>,
    expected: &str,
) -> Result<Vec<PricePoint>, ForecastError> {
    points
        .into_iter()
        .map(|mut point| {
            if point.currency == expected {
                return Ok(point);
            }
            match minor_unit(&point.currency) {
                Some((major, divisor)) if major.eq_ignore_ascii_case(expected) => {
                    point.price /= divisor;
                    point.currency = major.to_string();
                    Ok(point)
                }
                None if point.currency.eq_ignore_ascii_case(expected) => Ok(point),
                _ => Err(ForecastError::MalformedData(format!(
                    "series for {} is quoted in {}, expected {}",
                    point.date, point.currency, expected
                ))),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use chrono::NaiveDate;

    struct FixedProvider(Result<f64, String>);

    #[async_trait]
    impl CurrencyRateProvider for FixedProvider {
        async fn get_rate(&self, _from: &str, _to: &str) -> Result<f64> {
            self.0.clone().map_err(|e| anyhow!(e))
        }
    }

    fn fallback() -> ConversionRate {
        ConversionRate::new(75.0).unwrap()
    }

    #[test]
    fn test_conversion_rate_rejects_non_positive() {
        assert!(ConversionRate::new(0.0).is_none());
        assert!(ConversionRate::new(-1.5).is_none());
        assert!(ConversionRate::new(f64::NAN).is_none());
        assert!(ConversionRate::new(f64::INFINITY).is_none());
        assert_eq!(ConversionRate::new(83.2).unwrap().convert(2.0), 166.4);
    }

    #[tokio::test]
    async fn test_resolve_rate_success() {
        let provider = FixedProvider(Ok(83.5));
        let resolved = resolve_rate(&provider, "USD", "INR", fallback()).await;
        assert_eq!(resolved.rate.value(), 83.5);
        assert!(!resolved.is_fallback());
    }

    #[tokio::test]
    async fn test_resolve_rate_network_error_uses_fallback() {
        let provider = FixedProvider(Err("connection refused".to_string()));
        let resolved = resolve_rate(&provider, "USD", "INR", fallback()).await;
        assert_eq!(resolved.rate.value(), 75.0);
        match resolved.warning {
            Some(ForecastError::RateFetchFailed(msg)) => {
                assert!(msg.contains("connection refused"))
            }
            other => panic!("Expected RateFetchFailed warning, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_rate_invalid_value_uses_fallback() {
        let provider = FixedProvider(Ok(0.0));
        let resolved = resolve_rate(&provider, "USD", "INR", fallback()).await;
        assert_eq!(resolved.rate.value(), 75.0);
        assert!(resolved.is_fallback());
    }

    #[tokio::test]
    async fn test_resolve_rate_same_currency() {
        let provider = FixedProvider(Err("should not be called".to_string()));
        let resolved = resolve_rate(&provider, "USD", "usd", fallback()).await;
        assert_eq!(resolved.rate.value(), 1.0);
        assert!(!resolved.is_fallback());
    }

    fn quotes(currency: &str) -> Vec<PricePoint> {
        let d = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        vec![
            PricePoint::new(d, 600.0, currency),
            PricePoint::new(d.succ_opt().unwrap(), 602.0, currency),
        ]
    }

    #[test]
    fn test_normalize_series_rescales_cents() {
        let series = normalize_series(quotes("USX"), "USD").unwrap();
        assert_eq!(series[0].price, 6.0);
        assert_eq!(series[1].price, 6.02);
        assert!(series.iter().all(|p| p.currency == "USD"));
    }

    #[test]
    fn test_normalize_series_keeps_matching_currency() {
        assert_eq!(normalize_series(quotes("USD"), "USD").unwrap(), quotes("USD"));
        assert_eq!(normalize_series(quotes("usd"), "USD").unwrap(), quotes("usd"));
    }

    #[test]
    fn test_normalize_series_rejects_other_currency() {
        assert!(matches!(
            normalize_series(quotes("EUR"), "USD"),
            Err(ForecastError::MalformedData(msg)) if msg.contains("quoted in EUR, expected USD")
        ));
        // Pence are not pounds sterling.
        assert!(matches!(
            normalize_series(quotes("GBp"), "USD"),
            Err(ForecastError::MalformedData(_))
        ));
    }
}
