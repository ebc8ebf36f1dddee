use super::chart::{ChartOptions, render_chart};
use super::ui;
use crate::AppContext;
use crate::core::SeriesSource;
use crate::core::pipeline::{self, DashboardView, ProjectionRequest};
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::Cell;

const UNIT_LABEL: &str = "price per ton (1000kg)";

const DISCLAIMER: &str = "How prices are calculated: historical commodity prices are loaded from a CSV \
file or Yahoo Finance, converted with the current exchange rate, and extended with a simple \
linear regression trend.\nDisclaimer: these predictions are based on historical data only and \
should not be the sole basis for financial decisions. Local market prices may vary.";

impl DashboardView {
    /// Formats the view the way the dashboard shows it: banners, chart,
    /// statistics and predictions.
    pub fn display(&self, chart: &ChartOptions) -> String {
        let currency = &self.to_currency;
        let source_currency = &self.from_currency;
        let mut output = format!(
            "{}\n\n",
            ui::style_text(
                &format!("{} Price Trends ({UNIT_LABEL})", self.product.name),
                ui::StyleType::Title
            )
        );

        if let Some(warning) = &self.rate.warning {
            output.push_str(&ui::style_text(
                &format!(
                    "{warning}. Using 1 {source_currency} = {} {currency} as a fallback.",
                    self.rate.rate
                ),
                ui::StyleType::Error,
            ));
        } else {
            output.push_str(&format!(
                "Current exchange rate: {}",
                ui::style_text(
                    &format!("1 {source_currency} = {} {currency}", self.rate.rate),
                    ui::StyleType::Label
                )
            ));
        }
        output.push('\n');

        if self.source == SeriesSource::Yahoo
            && let Some(note) = &self.product.note
        {
            output.push_str(&ui::style_text(
                &format!("Note for {}: {note}\n", self.product.name),
                ui::StyleType::Warning,
            ));
        }

        output.push_str(&ui::style_text(
            &format!(
                "{} data for {} loaded successfully!\n\n",
                self.source, self.product.name
            ),
            ui::StyleType::Success,
        ));

        for line in render_chart(&self.projection.points, chart) {
            output.push_str(&line);
            output.push('\n');
        }

        let summary = &self.summary;
        let mut stats = ui::new_styled_table();
        stats.set_header(vec![
            ui::header_cell(&format!("Price Statistics ({UNIT_LABEL})")),
            ui::header_cell(&format!("Value ({currency})")),
        ]);
        for (label, value) in [
            ("Current Price", summary.current),
            ("Average Price", summary.average),
            ("Lowest Price", summary.min),
            ("Highest Price", summary.max),
        ] {
            stats.add_row(vec![
                Cell::new(label),
                ui::format_optional_cell(Some(value), |v| format!("{v:.2}")),
            ]);
        }
        output.push('\n');
        output.push_str(&stats.to_string());

        let mut predictions = ui::new_styled_table();
        predictions.set_header(vec![
            ui::header_cell(&format!("Price Predictions ({UNIT_LABEL})")),
            ui::header_cell(&format!("Value ({currency})")),
        ]);
        for (label, value) in [
            ("Predicted Price (1 month)", self.outlook.one_month),
            ("Predicted Price (3 months)", self.outlook.three_months),
            ("Predicted Price (6 months)", self.outlook.six_months),
        ] {
            let cell = match value {
                Some(v) => ui::price_cell(v, summary.current, currency),
                None => ui::format_optional_cell(None::<f64>, |v| format!("{v:.2}")),
            };
            predictions.add_row(vec![Cell::new(label), cell]);
        }
        output.push_str("\n\n");
        output.push_str(&predictions.to_string());

        output.push_str(&format!(
            "\n\nTrend: {} {currency}/day over {} days\n\n{}",
            ui::style_text(
                &format!("{:+.2}", self.projection.fit.slope),
                ui::StyleType::Value
            ),
            self.projection.horizon(),
            ui::style_text(DISCLAIMER, ui::StyleType::Subtle)
        ));
        output
    }
}

/// Runs a single projection and prints it. Pipeline failures are shown as an
/// error banner and returned.
pub async fn run(
    ctx: &AppContext,
    product: &str,
    source: SeriesSource,
    horizon: Option<usize>,
    as_of: NaiveDate,
) -> Result<()> {
    let request = ProjectionRequest::from_config(&ctx.config, product, source, horizon)?;

    let pb = ui::new_spinner(&format!("Fetching {} prices...", request.product.name));
    let result = pipeline::run_pipeline(
        &request,
        ctx.rate_provider.as_ref(),
        ctx.loader(source),
        as_of,
    )
    .await;
    pb.finish_and_clear();

    match result {
        Ok(view) => {
            println!("{}", view.display(&ChartOptions::default()));
            Ok(())
        }
        Err(e) => {
            println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error));
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::default_products;
    use crate::core::currency::{ConversionRate, ResolvedRate};
    use crate::core::error::ForecastError;
    use crate::core::price::PricePoint;
    use crate::core::projection::project;
    use crate::core::stats::{Outlook, PriceSummary};
    use chrono::Duration;

    fn view(source: SeriesSource, warning: Option<ForecastError>, product: usize) -> DashboardView {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let series: Vec<PricePoint> = [100.0, 102.0, 104.0]
            .iter()
            .enumerate()
            .map(|(i, p)| PricePoint::new(start + Duration::days(i as i64), *p, "USD"))
            .collect();
        let rate = ConversionRate::new(80.0).unwrap();
        let projection = project(&series, rate, 180).unwrap();
        let summary = PriceSummary::from_points(projection.historical()).unwrap();
        let outlook = Outlook::from_predicted(projection.predicted());
        DashboardView {
            product: default_products().remove(product),
            source,
            from_currency: "USD".to_string(),
            to_currency: "INR".to_string(),
            rate: ResolvedRate { rate, warning },
            projection,
            summary,
            outlook,
        }
    }

    #[test]
    fn test_display_contains_statistics_and_predictions() {
        console::set_colors_enabled(false);
        let output = view(SeriesSource::Csv, None, 0).display(&ChartOptions::default());

        assert!(output.contains("Wheat Price Trends (price per ton (1000kg))"));
        assert!(output.contains("Current exchange rate: 1 USD = 80.00 INR"));
        assert!(output.contains("CSV data for Wheat loaded successfully!"));
        assert!(output.contains("8320.00"));
        assert!(output.contains("8160.00"));
        assert!(output.contains("8000.00"));
        // Day 3 + 30 and the last of 180 days
        assert!(output.contains("13280.00 INR"));
        assert!(output.contains("37120.00 INR"));
        assert!(output.contains("Trend: +160.00 INR/day over 180 days"));
        assert!(output.contains("Disclaimer"));
    }

    #[test]
    fn test_display_fallback_warning_and_note() {
        console::set_colors_enabled(false);
        let warning = ForecastError::RateFetchFailed("timeout".to_string());
        let output = view(SeriesSource::Yahoo, Some(warning), 1).display(&ChartOptions::default());

        assert!(output.contains("Failed to fetch exchange rate: timeout"));
        assert!(output.contains("as a fallback"));
        assert!(output.contains("Note for Rice"));
        assert!(output.contains("Yahoo Finance data for Rice loaded successfully!"));
    }
}
