use std::path::Path;

use anyhow::Result;

use crate::db::{Database, now_rfc3339};
use crate::error::{RemoteError, SyncError};
use crate::models::{CompanySettings, NewProduct, Product, StoreCredentials};
use crate::pdf::CatalogItem;

/// Platform-native remote catalog fetcher.
///
/// The CLI implements this with reqwest. One call fetches a single page of
/// up to 100 products; stores beyond that need pagination, which this
/// design does not attempt. Called synchronously — async callers should
/// bridge through their runtime.
pub trait CatalogProvider: Send + Sync {
    fn fetch_catalog(&self, credentials: &StoreCredentials)
    -> Result<Vec<NewProduct>, RemoteError>;
}

pub struct CatalogService {
    db: Database,
}

impl CatalogService {
    pub fn new(db_path: &Path) -> Result<Self> {
        Ok(Self {
            db: Database::open(db_path)?,
        })
    }

    pub fn new_in_memory() -> Result<Self> {
        Ok(Self {
            db: Database::open_in_memory()?,
        })
    }

    // --- Direct DB operations ---

    pub fn list_products(&self, search: Option<&str>) -> Result<Vec<Product>> {
        self.db.list_products(search)
    }

    pub fn get_product(&self, woo_id: i64) -> Result<Option<Product>> {
        self.db.get_product(woo_id)
    }

    pub fn set_catalog_price(&self, woo_id: i64, price: Option<f64>) -> Result<Product> {
        self.db.set_catalog_price(woo_id, price)
    }

    pub fn count_products(&self) -> Result<i64> {
        self.db.count_products()
    }

    pub fn get_settings(&self) -> Result<Option<CompanySettings>> {
        self.db.get_settings()
    }

    pub fn save_settings(&self, settings: &CompanySettings) -> Result<()> {
        self.db.save_settings(settings)
    }

    // --- Sync orchestration ---

    /// One-shot reconciliation of the remote store into the local catalog.
    ///
    /// Loads settings, fetches the remote snapshot, and upserts every
    /// product under a single timestamp. Upsert failures are collected and
    /// surfaced once as [`SyncError::Partial`]; rows already written stay,
    /// and re-running converges because each write is idempotent and keyed
    /// by `woo_id`. Returns the number of products written.
    pub fn synchronize(&self, provider: &dyn CatalogProvider) -> Result<usize, SyncError> {
        let settings = self.db.get_settings().map_err(SyncError::Store)?;
        let credentials = settings
            .as_ref()
            .and_then(CompanySettings::credentials)
            .ok_or(SyncError::SettingsMissing)?;

        let products = provider.fetch_catalog(&credentials)?;

        let synced_at = now_rfc3339();
        let mut applied = 0usize;
        let mut failures: Vec<String> = Vec::new();
        for product in &products {
            match self.db.upsert_product(product, &synced_at) {
                Ok(_) => applied += 1,
                Err(e) => failures.push(format!("product {}: {e:#}", product.woo_id)),
            }
        }

        if failures.is_empty() {
            Ok(applied)
        } else {
            Err(SyncError::Partial {
                applied,
                failed: failures.len(),
                first: failures.remove(0),
            })
        }
    }

    // --- Export ---

    /// Catalog rows for the given selection, in the catalog's name order.
    /// Unknown ids are skipped; the caller blocks empty selections before
    /// rendering.
    pub fn catalog_items(&self, woo_ids: &[i64]) -> Result<Vec<CatalogItem>> {
        let products = self.db.list_products(None)?;
        Ok(products
            .iter()
            .filter(|p| woo_ids.contains(&p.woo_id))
            .map(CatalogItem::from)
            .collect())
    }

    /// Every active product, for `export --all`.
    pub fn active_product_ids(&self) -> Result<Vec<i64>> {
        Ok(self
            .db
            .list_products(None)?
            .into_iter()
            .filter(|p| p.active)
            .map(|p| p.woo_id)
            .collect())
    }
}
