use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde_json::json;

use catalogo_core::pdf::{CompanyInfo, render_catalog, render_catalog_now};
use catalogo_core::service::CatalogService;

/// Default output name, matching the download filename the server serves.
pub(crate) const PDF_FILENAME: &str = "catalogo-produtos.pdf";

pub(crate) fn cmd_export(
    service: &CatalogService,
    ids: &[i64],
    all: bool,
    out: &Path,
    date: Option<&str>,
    json: bool,
) -> Result<()> {
    let selected: Vec<i64> = if all {
        service.active_product_ids()?
    } else {
        ids.to_vec()
    };
    if selected.is_empty() {
        if all {
            bail!("No active products in the catalog. Run 'catalogo sync' first.");
        }
        bail!("No products selected. Pass --id at least once, or use --all.");
    }

    let items = service.catalog_items(&selected)?;
    if items.is_empty() {
        bail!("None of the selected ids are in the catalog. Check 'catalogo list'.");
    }

    let settings = service
        .get_settings()?
        .context("Company settings are not configured. Run 'catalogo settings set' first.")?;
    let company = CompanyInfo::from(&settings);

    let bytes = match date {
        Some(d) => {
            let date = NaiveDate::parse_from_str(d, "%Y-%m-%d")
                .map_err(|_| anyhow::anyhow!("Invalid date '{d}'. Use YYYY-MM-DD"))?;
            render_catalog(&items, &company, date)?
        }
        None => render_catalog_now(&items, &company)?,
    };
    std::fs::write(out, &bytes).with_context(|| format!("Failed to write {}", out.display()))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "file": out.display().to_string(),
                "products": items.len(),
                "bytes": bytes.len(),
            }))?
        );
    } else {
        println!(
            "Wrote {} ({} products, {} bytes)",
            out.display(),
            items.len(),
            bytes.len()
        );
    }
    Ok(())
}
