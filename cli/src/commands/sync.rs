use anyhow::Result;
use serde_json::json;

use catalogo_core::service::CatalogService;

use crate::woocommerce::WooClient;

pub(crate) fn cmd_sync(service: &CatalogService, client: &WooClient, json: bool) -> Result<()> {
    // synchronize() drives the blocking provider bridge, so step off the
    // async worker thread first.
    let written = tokio::task::block_in_place(|| service.synchronize(client))?;
    let total = service.count_products()?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "synced": written,
                "total": total,
            }))?
        );
    } else {
        println!("Synced {written} products ({total} in local catalog)");
    }
    Ok(())
}
