use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Local;
use rusqlite::{Connection, OptionalExtension, params};

use crate::models::{CompanySettings, NewProduct, Product};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS products (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    woo_id INTEGER NOT NULL UNIQUE,
                    name TEXT NOT NULL,
                    price REAL NOT NULL,
                    catalog_price REAL,
                    description TEXT NOT NULL DEFAULT '',
                    image_url TEXT,
                    category TEXT,
                    active INTEGER NOT NULL DEFAULT 1,
                    last_synced_at TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_products_name ON products(name);

                CREATE TABLE IF NOT EXISTS company_settings (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    company_name TEXT NOT NULL,
                    logo_url TEXT,
                    contact_phone TEXT,
                    contact_email TEXT,
                    store_base_url TEXT NOT NULL DEFAULT '',
                    store_api_key TEXT NOT NULL DEFAULT '',
                    store_api_secret TEXT NOT NULL DEFAULT ''
                );

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn product_from_row(row: &rusqlite::Row) -> rusqlite::Result<Product> {
        Ok(Product {
            id: row.get(0)?,
            woo_id: row.get(1)?,
            name: row.get(2)?,
            price: row.get(3)?,
            catalog_price: row.get(4)?,
            description: row.get(5)?,
            image_url: row.get(6)?,
            category: row.get(7)?,
            active: row.get(8)?,
            last_synced_at: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    // --- Products ---

    /// Insert or merge-update the row for `woo_id`.
    ///
    /// Column-level merge: only store-of-record fields are written, so a
    /// user-set `catalog_price` survives every sync. Never produces a second
    /// row for the same `woo_id`.
    pub fn upsert_product(&self, product: &NewProduct, synced_at: &str) -> Result<Product> {
        self.conn
            .execute(
                "INSERT INTO products
                    (woo_id, name, price, description, image_url, category, active,
                     last_synced_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                 ON CONFLICT(woo_id) DO UPDATE SET
                    name = excluded.name,
                    price = excluded.price,
                    description = excluded.description,
                    image_url = excluded.image_url,
                    category = excluded.category,
                    active = excluded.active,
                    last_synced_at = excluded.last_synced_at",
                params![
                    product.woo_id,
                    product.name,
                    product.price,
                    product.description,
                    product.image_url,
                    product.category,
                    product.active,
                    synced_at,
                ],
            )
            .with_context(|| format!("Failed to upsert product {}", product.woo_id))?;

        self.get_product(product.woo_id)?
            .context("Product missing after upsert")
    }

    pub fn get_product(&self, woo_id: i64) -> Result<Option<Product>> {
        self.conn
            .query_row(
                "SELECT * FROM products WHERE woo_id = ?1",
                params![woo_id],
                Self::product_from_row,
            )
            .optional()
            .context("Failed to read product")
    }

    /// All products ordered by name; optional case-insensitive substring
    /// filter on the name.
    pub fn list_products(&self, search: Option<&str>) -> Result<Vec<Product>> {
        let (sql, pattern) = match search {
            Some(query) => {
                let escaped = query
                    .replace('\\', "\\\\")
                    .replace('%', "\\%")
                    .replace('_', "\\_");
                (
                    "SELECT * FROM products WHERE name LIKE ?1 ESCAPE '\\'
                     ORDER BY name COLLATE NOCASE",
                    Some(format!("%{escaped}%")),
                )
            }
            None => ("SELECT * FROM products ORDER BY name COLLATE NOCASE", None),
        };

        let mut stmt = self.conn.prepare(sql)?;
        let products = match pattern {
            Some(p) => stmt
                .query_map(params![p], Self::product_from_row)?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt
                .query_map([], Self::product_from_row)?
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(products)
    }

    /// Set or clear the user price override. Touches no other column.
    pub fn set_catalog_price(&self, woo_id: i64, price: Option<f64>) -> Result<Product> {
        let changed = self.conn.execute(
            "UPDATE products SET catalog_price = ?1 WHERE woo_id = ?2",
            params![price, woo_id],
        )?;
        if changed == 0 {
            bail!("Product {woo_id} not found");
        }
        self.get_product(woo_id)?.context("Product not found")
    }

    pub fn count_products(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))
            .context("Failed to count products")
    }

    // --- Company settings (single row) ---

    pub fn get_settings(&self) -> Result<Option<CompanySettings>> {
        self.conn
            .query_row(
                "SELECT company_name, logo_url, contact_phone, contact_email,
                        store_base_url, store_api_key, store_api_secret
                 FROM company_settings WHERE id = 1",
                [],
                |row| {
                    Ok(CompanySettings {
                        company_name: row.get(0)?,
                        logo_url: row.get(1)?,
                        contact_phone: row.get(2)?,
                        contact_email: row.get(3)?,
                        store_base_url: row.get(4)?,
                        store_api_key: row.get(5)?,
                        store_api_secret: row.get(6)?,
                    })
                },
            )
            .optional()
            .context("Failed to read company settings")
    }

    pub fn save_settings(&self, settings: &CompanySettings) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO company_settings
                    (id, company_name, logo_url, contact_phone, contact_email,
                     store_base_url, store_api_key, store_api_secret)
                 VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                    company_name = excluded.company_name,
                    logo_url = excluded.logo_url,
                    contact_phone = excluded.contact_phone,
                    contact_email = excluded.contact_email,
                    store_base_url = excluded.store_base_url,
                    store_api_key = excluded.store_api_key,
                    store_api_secret = excluded.store_api_secret",
                params![
                    settings.company_name,
                    settings.logo_url,
                    settings.contact_phone,
                    settings.contact_email,
                    settings.store_base_url,
                    settings.store_api_key,
                    settings.store_api_secret,
                ],
            )
            .context("Failed to save company settings")?;
        Ok(())
    }
}

/// Timestamp recorded on synced rows.
#[must_use]
pub fn now_rfc3339() -> String {
    Local::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product() -> NewProduct {
        NewProduct {
            woo_id: 42,
            name: "Leather Wallet".to_string(),
            price: 89.90,
            description: "<p>Hand made</p>".to_string(),
            image_url: Some("https://cdn.example/wallet.jpg".to_string()),
            category: Some("Accessories".to_string()),
            active: true,
        }
    }

    fn sample_settings() -> CompanySettings {
        CompanySettings {
            company_name: "Acme".to_string(),
            logo_url: None,
            contact_phone: Some("+55 11 91234-5678".to_string()),
            contact_email: Some("sales@acme.example".to_string()),
            store_base_url: "https://store.example".to_string(),
            store_api_key: "ck_123".to_string(),
            store_api_secret: "cs_456".to_string(),
        }
    }

    #[test]
    fn test_upsert_inserts_then_updates_same_row() {
        let db = Database::open_in_memory().unwrap();
        let first = db.upsert_product(&sample_product(), "t1").unwrap();

        let mut changed = sample_product();
        changed.name = "Leather Wallet v2".to_string();
        changed.price = 99.90;
        let second = db.upsert_product(&changed, "t2").unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Leather Wallet v2");
        assert!((second.price - 99.90).abs() < f64::EPSILON);
        assert_eq!(second.last_synced_at, "t2");
        assert_eq!(db.count_products().unwrap(), 1);
    }

    #[test]
    fn test_upsert_never_duplicates_woo_id() {
        let db = Database::open_in_memory().unwrap();
        for _ in 0..5 {
            db.upsert_product(&sample_product(), "t").unwrap();
        }
        assert_eq!(db.count_products().unwrap(), 1);
    }

    #[test]
    fn test_catalog_price_survives_sync() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_product(&sample_product(), "t1").unwrap();

        let edited = db.set_catalog_price(42, Some(79.0)).unwrap();
        assert_eq!(edited.catalog_price, Some(79.0));

        // Upstream price change must not revert the override
        let mut changed = sample_product();
        changed.price = 120.0;
        let after = db.upsert_product(&changed, "t2").unwrap();
        assert_eq!(after.catalog_price, Some(79.0));
        assert!((after.price - 120.0).abs() < f64::EPSILON);
        assert!((after.display_price() - 79.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clear_catalog_price() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_product(&sample_product(), "t1").unwrap();
        db.set_catalog_price(42, Some(79.0)).unwrap();

        let cleared = db.set_catalog_price(42, None).unwrap();
        assert!(cleared.catalog_price.is_none());
        assert!((cleared.display_price() - 89.90).abs() < f64::EPSILON);
    }

    #[test]
    fn test_set_catalog_price_unknown_product_fails() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.set_catalog_price(999, Some(10.0)).is_err());
    }

    #[test]
    fn test_list_products_ordered_by_name() {
        let db = Database::open_in_memory().unwrap();
        for (id, name) in [(1, "zebra print"), (2, "Apron"), (3, "mug")] {
            let mut p = sample_product();
            p.woo_id = id;
            p.name = name.to_string();
            db.upsert_product(&p, "t").unwrap();
        }

        let names: Vec<String> = db
            .list_products(None)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Apron", "mug", "zebra print"]);
    }

    #[test]
    fn test_list_products_search_filter() {
        let db = Database::open_in_memory().unwrap();
        for (id, name) in [(1, "Leather Wallet"), (2, "Canvas Bag")] {
            let mut p = sample_product();
            p.woo_id = id;
            p.name = name.to_string();
            db.upsert_product(&p, "t").unwrap();
        }

        let hits = db.list_products(Some("wallet")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Leather Wallet");

        // LIKE wildcards in the query are literals
        assert!(db.list_products(Some("%")).unwrap().is_empty());
    }

    #[test]
    fn test_settings_roundtrip_single_row() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_settings().unwrap().is_none());

        db.save_settings(&sample_settings()).unwrap();
        let loaded = db.get_settings().unwrap().unwrap();
        assert_eq!(loaded.company_name, "Acme");
        assert_eq!(loaded.contact_phone.as_deref(), Some("+55 11 91234-5678"));

        // Saving again overwrites the one row, never adds another
        let mut updated = sample_settings();
        updated.company_name = "Acme Ltda".to_string();
        db.save_settings(&updated).unwrap();
        assert_eq!(db.get_settings().unwrap().unwrap().company_name, "Acme Ltda");

        let rows: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM company_settings", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
