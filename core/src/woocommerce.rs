use serde::Deserialize;

use crate::models::NewProduct;

/// Publication status WooCommerce uses for live products. Anything else
/// (`draft`, `pending`, `private`) maps to inactive.
const STATUS_PUBLISH: &str = "publish";

/// Wire shape of one product from `GET /wp-json/wc/v3/products`.
///
/// Only the fields the canonical model needs are declared; the rest of the
/// (large) WooCommerce payload is ignored.
#[derive(Debug, Deserialize)]
pub struct WooProduct {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<WooImage>,
    #[serde(default)]
    pub categories: Vec<WooCategory>,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct WooImage {
    #[serde(default)]
    pub src: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WooCategory {
    #[serde(default)]
    pub name: Option<String>,
}

/// Normalize one wire record into the canonical shape.
///
/// WooCommerce serializes prices as strings; unparsable or empty input
/// normalizes to `0.0` rather than failing the whole sync. The first
/// non-empty image and category win.
#[must_use]
pub fn wire_to_product(p: WooProduct) -> NewProduct {
    let price = p.price.trim().parse::<f64>().unwrap_or(0.0);
    let image_url = p
        .images
        .into_iter()
        .find_map(|i| i.src.filter(|s| !s.is_empty()));
    let category = p
        .categories
        .into_iter()
        .find_map(|c| c.name.filter(|n| !n.is_empty()));

    NewProduct {
        woo_id: p.id,
        name: p.name,
        price,
        description: p.description,
        image_url,
        category,
        active: p.status == STATUS_PUBLISH,
    }
}
