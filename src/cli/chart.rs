//! Text line chart of a projected series.
//!
//! Dates map linearly onto columns and prices onto rows, with the price axis
//! fitted to the data rather than anchored at zero. When several points land
//! in the same cell the later one wins, so the predicted line draws over the
//! tail of the history.

use crate::core::projection::{PointKind, ProjectedPoint};
use console::style;

const HISTORICAL_MARK: char = '*';
const PREDICTED_MARK: char = '·';
const MIN_WIDTH: usize = 10;
const MIN_HEIGHT: usize = 3;

pub struct ChartOptions {
    pub width: usize,
    pub height: usize,
}

impl Default for ChartOptions {
    fn default() -> Self {
        ChartOptions {
            width: 72,
            height: 16,
        }
    }
}

fn mark_for(kind: PointKind) -> char {
    match kind {
        PointKind::Historical => HISTORICAL_MARK,
        PointKind::Predicted => PREDICTED_MARK,
    }
}

fn styled_mark(mark: char) -> String {
    match mark {
        HISTORICAL_MARK => style(mark).cyan().to_string(),
        PREDICTED_MARK => style(mark).yellow().bold().to_string(),
        other => other.to_string(),
    }
}

/// Renders `points` as chart lines, top row first. Returns no lines for an
/// empty slice.
pub fn render_chart(points: &[ProjectedPoint], options: &ChartOptions) -> Vec<String> {
    let (Some(first), Some(last)) = (
        points.iter().map(|p| p.date).min(),
        points.iter().map(|p| p.date).max(),
    ) else {
        return Vec::new();
    };

    let width = options.width.max(MIN_WIDTH);
    let height = options.height.max(MIN_HEIGHT);
    let (low, high) = points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.price), hi.max(p.price))
    });
    let span_days = (last - first).num_days().max(1) as f64;
    let span_price = high - low;

    let mut grid = vec![vec![' '; width]; height];
    for point in points {
        let x = (point.date - first).num_days() as f64 / span_days;
        let column = (x * (width - 1) as f64).round() as usize;
        let row = if span_price > 0.0 {
            ((high - point.price) / span_price * (height - 1) as f64).round() as usize
        } else {
            height / 2
        };
        grid[row.min(height - 1)][column.min(width - 1)] = mark_for(point.kind);
    }

    let high_label = format!("{high:.2}");
    let low_label = format!("{low:.2}");
    let label_width = high_label.len().max(low_label.len());

    let mut lines: Vec<String> = grid
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            let label = match row {
                0 => high_label.as_str(),
                r if r == height - 1 => low_label.as_str(),
                _ => "",
            };
            let body: String = cells.iter().map(|c| styled_mark(*c)).collect();
            format!("{label:>label_width$} │{body}")
        })
        .collect();

    lines.push(format!("{:>label_width$} └{}", "", "─".repeat(width)));
    let first_label = first.to_string();
    let last_label = last.to_string();
    let gap = (width + 1).saturating_sub(first_label.len() + last_label.len());
    lines.push(format!(
        "{:>label_width$}  {first_label}{}{last_label}",
        "",
        " ".repeat(gap.saturating_sub(1))
    ));
    lines.push(format!(
        "{:>label_width$}  {} Historical   {} Predicted",
        "",
        styled_mark(HISTORICAL_MARK),
        styled_mark(PREDICTED_MARK)
    ));
    lines
}
