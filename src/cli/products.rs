use super::ui;
use crate::core::config::Product;
use comfy_table::{Cell, Color};

pub fn display_catalog(products: &[Product]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Product"),
        ui::header_cell("Ticker"),
        ui::header_cell("CSV File"),
        ui::header_cell("Note"),
    ]);

    for product in products {
        let note = product
            .note
            .as_deref()
            .map_or(Cell::new(""), |n| Cell::new(n).fg(Color::Yellow));
        table.add_row(vec![
            Cell::new(&product.name),
            Cell::new(&product.ticker),
            Cell::new(&product.csv),
            note,
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Available Products", ui::StyleType::Title),
        table
    )
}

pub fn run(products: &[Product]) -> anyhow::Result<()> {
    println!("{}", display_catalog(products));
    Ok(())
}
