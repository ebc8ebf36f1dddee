//! Descriptive statistics shown beside the projection.
use crate::core::projection::ProjectedPoint;
use serde::Serialize;

/// Suffix indices of the 1, 3 and 6 month predictions.
const ONE_MONTH_INDEX: usize = 30;
const THREE_MONTHS_INDEX: usize = 90;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceSummary {
    pub current: f64,
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

impl PriceSummary {
    /// Summarizes observed prices. `current` is the last point in series order.
    pub fn from_points(points: &[ProjectedPoint]) -> Option<Self> {
        let current = points.last()?.price;
        let (min, max, sum) = points.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(min, max, sum), p| (min.min(p.price), max.max(p.price), sum + p.price),
        );
        Some(Self {
            current,
            average: sum / points.len() as f64,
            min,
            max,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Outlook {
    pub one_month: Option<f64>,
    pub three_months: Option<f64>,
    pub six_months: Option<f64>,
}

impl Outlook {
    /// Picks point predictions out of the predicted suffix. Short horizons leave
    /// the later figures empty.
    pub fn from_predicted(predicted: &[ProjectedPoint]) -> Self {
        Self {
            one_month: predicted.get(ONE_MONTH_INDEX).map(|p| p.price),
            three_months: predicted.get(THREE_MONTHS_INDEX).map(|p| p.price),
            six_months: predicted.last().map(|p| p.price),
        }
    }
}
