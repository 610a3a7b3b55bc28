use anyhow::{Context, Result};
use serde_json::json;

use catalogo_core::pdf::format_price;
use catalogo_core::service::CatalogService;

use super::helpers::{parse_price_arg, print_product_table};

pub(crate) fn cmd_list(service: &CatalogService, search: Option<&str>, json: bool) -> Result<()> {
    let products = service.list_products(search)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&products)?);
        return Ok(());
    }

    if products.is_empty() {
        match search {
            Some(term) => println!("No products matching '{term}'."),
            None => println!("Catalog is empty. Run 'catalogo sync' first."),
        }
        return Ok(());
    }

    print_product_table(&products);
    println!("{} products", products.len());
    Ok(())
}

pub(crate) fn cmd_price(
    service: &CatalogService,
    woo_id: i64,
    value: &str,
    json: bool,
) -> Result<()> {
    let price = parse_price_arg(value)?;
    let product = service
        .set_catalog_price(woo_id, price)
        .with_context(|| format!("Could not update price for product {woo_id}"))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "woo_id": product.woo_id,
                "name": product.name,
                "price": product.price,
                "catalog_price": product.catalog_price,
                "display_price": product.display_price(),
            }))?
        );
    } else {
        match product.catalog_price {
            Some(p) => println!(
                "{}: catalog price set to {} (store price {})",
                product.name,
                format_price(p),
                format_price(product.price)
            ),
            None => println!(
                "{}: override cleared, back to store price {}",
                product.name,
                format_price(product.price)
            ),
        }
    }
    Ok(())
}
