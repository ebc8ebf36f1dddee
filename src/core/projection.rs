//! Linear trend projection of a price series.
//!
//! The projector is a pure function: it converts the observed prices with a
//! fixed rate, fits an ordinary least squares line against the number of days
//! since the earliest observation and extrapolates it one calendar day at a
//! time past the latest observation.

use crate::core::currency::ConversionRate;
use crate::core::error::{ForecastError, Result};
use crate::core::price::PricePoint;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::fmt::Display;

/// Number of future days projected when nothing else is configured.
pub const DEFAULT_HORIZON_DAYS: usize = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PointKind {
    Historical,
    Predicted,
}

impl Display for PointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PointKind::Historical => "Historical",
                PointKind::Predicted => "Predicted",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedPoint {
    pub date: NaiveDate,
    pub price: f64,
    pub kind: PointKind,
}

/// A fitted line `price = slope * day_offset + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Closed-form ordinary least squares over `(x, y)` pairs.
    ///
    /// With zero variance in `x` (every observation on the same day) the line
    /// is flat through the mean of `y`.
    pub fn fit(samples: &[(f64, f64)]) -> Result<Self> {
        match samples.len() {
            0 => return Err(ForecastError::EmptySeries),
            1 => return Err(ForecastError::InsufficientData { points: 1 }),
            _ => {}
        }

        let n = samples.len() as f64;
        let x_mean = samples.iter().map(|(x, _)| x).sum::<f64>() / n;
        let y_mean = samples.iter().map(|(_, y)| y).sum::<f64>() / n;

        let (mut sxy, mut sxx) = (0.0, 0.0);
        for (x, y) in samples {
            sxy += (x - x_mean) * (y - y_mean);
            sxx += (x - x_mean) * (x - x_mean);
        }

        let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
        Ok(Self {
            slope,
            intercept: y_mean - slope * x_mean,
        })
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Observed history followed by the extrapolated trend.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectedSeries {
    pub points: Vec<ProjectedPoint>,
    pub fit: LinearFit,
    historical_len: usize,
}

impl ProjectedSeries {
    pub fn historical(&self) -> &[ProjectedPoint] {
        &self.points[..self.historical_len]
    }

    pub fn predicted(&self) -> &[ProjectedPoint] {
        &self.points[self.historical_len..]
    }

    pub fn horizon(&self) -> usize {
        self.points.len() - self.historical_len
    }
}

/// Projects `series` forward by `horizon` days after converting it with `rate`.
///
/// The historical part of the output keeps the input order; day offsets and the
/// start of the prediction are taken from the earliest and latest dates, so an
/// out-of-order input still yields a contiguous prediction.
pub fn project(
    series: &[PricePoint],
    rate: ConversionRate,
    horizon: usize,
) -> Result<ProjectedSeries> {
    let (first, last) = match (
        series.iter().map(|p| p.date).min(),
        series.iter().map(|p| p.date).max(),
    ) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(ForecastError::EmptySeries),
    };
    if series.len() < 2 {
        return Err(ForecastError::InsufficientData {
            points: series.len(),
        });
    }

    let historical: Vec<ProjectedPoint> = series
        .iter()
        .map(|p| ProjectedPoint {
            date: p.date,
            price: rate.convert(p.price),
            kind: PointKind::Historical,
        })
        .collect();

    let samples: Vec<(f64, f64)> = historical
        .iter()
        .map(|p| ((p.date - first).num_days() as f64, p.price))
        .collect();
    let fit = LinearFit::fit(&samples)?;

    let last_offset = (last - first).num_days();
    let predicted = (1..=horizon as i64).map(|day| ProjectedPoint {
        date: last + Duration::days(day),
        price: fit.evaluate((last_offset + day) as f64),
        kind: PointKind::Predicted,
    });

    let historical_len = historical.len();
    let mut points = historical;
    points.extend(predicted);

    Ok(ProjectedSeries {
        points,
        fit,
        historical_len,
    })
}
