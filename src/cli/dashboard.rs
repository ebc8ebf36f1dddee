//! Interactive mode: pick a product and a source, see the projection, repeat.
//!
//! Pipeline errors are printed and the loop carries on with the next
//! selection. Rate and series caches live in the shared `AppContext`, so
//! repeated selections within the TTL skip the network.

use super::chart::ChartOptions;
use super::ui;
use crate::{AppContext, Clock};
use crate::core::SeriesSource;
use crate::core::config::Product;
use crate::core::pipeline::{self, ProjectionRequest};
use anyhow::Result;
use console::Term;
use tracing::debug;

#[derive(Debug, PartialEq)]
pub enum Selection<'a> {
    Quit,
    Product(&'a Product),
    Invalid(String),
}

/// Interprets a product prompt answer: a 1-based index, a product name or `q`.
pub fn parse_product_choice<'a>(input: &str, products: &'a [Product]) -> Selection<'a> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("q") || input.eq_ignore_ascii_case("quit") {
        return Selection::Quit;
    }

    let by_index = input
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| products.get(i));
    let by_name = || products.iter().find(|p| p.name.eq_ignore_ascii_case(input));

    match by_index.or_else(by_name) {
        Some(product) => Selection::Product(product),
        None => Selection::Invalid(format!("Unknown product: {input}")),
    }
}

/// Interprets a source prompt answer; empty input keeps `default`.
pub fn parse_source_choice(input: &str, default: SeriesSource) -> Result<SeriesSource> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(default);
    }
    input.parse()
}

fn print_menu(products: &[Product]) {
    println!(
        "\n{}",
        ui::style_text("Agricultural Product Price Predictor", ui::StyleType::Title)
    );
    for (i, product) in products.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, product.name);
    }
}

/// Runs the selection loop. `clock` is read on every selection so a long
/// session keeps requesting the trailing range up to the current day.
pub async fn run(ctx: &AppContext, clock: Clock) -> Result<()> {
    let term = Term::stdout();
    let products = &ctx.config.products;
    let mut source = SeriesSource::Csv;

    loop {
        print_menu(products);
        term.write_str("Select a product (number or name, q to quit): ")?;
        let Ok(answer) = term.read_line() else {
            debug!("Input closed, leaving dashboard");
            break;
        };

        let product = match parse_product_choice(&answer, products) {
            Selection::Quit => break,
            Selection::Product(product) => product,
            Selection::Invalid(msg) => {
                println!("{}", ui::style_text(&msg, ui::StyleType::Error));
                continue;
            }
        };

        term.write_str(&format!("Choose data source [csv/yahoo] ({source}): "))?;
        let answer = term.read_line().unwrap_or_default();
        source = match parse_source_choice(&answer, source) {
            Ok(source) => source,
            Err(e) => {
                println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error));
                continue;
            }
        };

        let request =
            match ProjectionRequest::from_config(&ctx.config, &product.name, source, None) {
                Ok(request) => request,
                Err(e) => {
                    println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error));
                    continue;
                }
            };

        let pb = ui::new_spinner(&format!("Fetching {} prices...", product.name));
        let result = pipeline::run_pipeline(
            &request,
            ctx.rate_provider.as_ref(),
            ctx.loader(source),
            clock.today(),
        )
        .await;
        pb.finish_and_clear();

        match result {
            Ok(view) => println!("\n{}", view.display(&ChartOptions::default())),
            Err(e) => println!("\n{}", ui::style_text(&e.to_string(), ui::StyleType::Error)),
        }
        ui::print_separator();
        ctx.log_cache_stats().await;
    }

    Ok(())
}
