use anyhow::{Result, bail};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use catalogo_core::models::Product;
use catalogo_core::pdf::format_price;

const NAME_WIDTH: usize = 40;

#[derive(Tabled)]
struct ProductRow {
    #[tabled(rename = "ID")]
    woo_id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Catalog Price")]
    catalog_price: String,
    #[tabled(rename = "Active")]
    active: String,
}

pub(crate) fn print_product_table(products: &[Product]) {
    let rows: Vec<ProductRow> = products
        .iter()
        .map(|p| ProductRow {
            woo_id: p.woo_id,
            name: truncate(&p.name, NAME_WIDTH),
            category: p.category.clone().unwrap_or_else(|| "-".to_string()),
            price: format_price(p.price),
            catalog_price: p
                .catalog_price
                .map_or_else(|| "-".to_string(), format_price),
            active: if p.active { "yes" } else { "no" }.to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

/// Parse the price argument of `catalogo price`. The literal `clear` drops
/// the override.
pub(crate) fn parse_price_arg(value: &str) -> Result<Option<f64>> {
    if value.eq_ignore_ascii_case("clear") {
        return Ok(None);
    }
    let price: f64 = value
        .replace(',', ".")
        .parse()
        .map_err(|_| anyhow::anyhow!("'{value}' is not a price; use a number or 'clear'"))?;
    if !price.is_finite() || price < 0.0 {
        bail!("price must be a non-negative number");
    }
    Ok(Some(price))
}
