use serde::{Deserialize, Serialize};

use crate::sanitize::strip_markup;

/// Canonical product row.
///
/// `woo_id` is the stable external identifier; sync never creates a second
/// row for the same `woo_id`. Store-of-record fields (`name`, `price`,
/// `description`, `image_url`, `category`, `active`) are owned by sync;
/// `catalog_price` is owned by the user and survives every sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub woo_id: i64,
    pub name: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_price: Option<f64>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub active: bool,
    pub last_synced_at: String,
    pub created_at: String,
}

impl Product {
    /// Price shown in the UI and printed in the catalog: the user override
    /// when set, the store price otherwise.
    #[must_use]
    pub fn display_price(&self) -> f64 {
        self.catalog_price.unwrap_or(self.price)
    }

    /// Description with store markup stripped, for display.
    #[must_use]
    pub fn display_description(&self) -> String {
        strip_markup(&self.description)
    }
}

/// Normalized remote product, ready to upsert. Carries only the
/// store-of-record fields.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub woo_id: i64,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub active: bool,
}

/// Singleton settings row: company branding plus remote store connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanySettings {
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub store_base_url: String,
    #[serde(default)]
    pub store_api_key: String,
    #[serde(default)]
    pub store_api_secret: String,
}

impl CompanySettings {
    /// Store connection credentials, or `None` when any connection field is
    /// blank. Blank credentials block sync the same way a missing settings
    /// row does.
    #[must_use]
    pub fn credentials(&self) -> Option<StoreCredentials> {
        let base_url = self.store_base_url.trim();
        let api_key = self.store_api_key.trim();
        let api_secret = self.store_api_secret.trim();
        if base_url.is_empty() || api_key.is_empty() || api_secret.is_empty() {
            return None;
        }
        Some(StoreCredentials {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
        })
    }
}

/// Credentials resolved at call time for one remote fetch.
#[derive(Debug, Clone)]
pub struct StoreCredentials {
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: f64, catalog_price: Option<f64>) -> Product {
        Product {
            id: 1,
            woo_id: 10,
            name: "Widget".to_string(),
            price,
            catalog_price,
            description: "<p>A <b>widget</b></p>".to_string(),
            image_url: None,
            category: None,
            active: true,
            last_synced_at: String::new(),
            created_at: String::new(),
        }
    }

    #[test]
    fn test_display_price_falls_back_to_store_price() {
        assert!((product(19.9, None).display_price() - 19.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_display_price_prefers_override() {
        assert!((product(19.9, Some(15.0)).display_price() - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_display_description_strips_markup() {
        assert_eq!(product(1.0, None).display_description(), "A widget");
    }

    #[test]
    fn test_credentials_require_all_fields() {
        let mut settings = CompanySettings {
            company_name: "Acme".to_string(),
            logo_url: None,
            contact_phone: None,
            contact_email: None,
            store_base_url: "https://store.example".to_string(),
            store_api_key: "ck_123".to_string(),
            store_api_secret: "cs_456".to_string(),
        };
        assert!(settings.credentials().is_some());

        settings.store_api_secret = "  ".to_string();
        assert!(settings.credentials().is_none());

        settings.store_api_secret = "cs_456".to_string();
        settings.store_base_url = String::new();
        assert!(settings.credentials().is_none());
    }
}
