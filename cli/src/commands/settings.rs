use anyhow::Result;
use serde_json::json;

use catalogo_core::models::CompanySettings;
use catalogo_core::service::CatalogService;

pub(crate) struct SettingsUpdate {
    pub company: Option<String>,
    pub logo_url: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

pub(crate) fn cmd_settings_show(service: &CatalogService, json: bool) -> Result<()> {
    let Some(settings) = service.get_settings()? else {
        if json {
            println!("null");
        } else {
            println!("No settings yet. Run 'catalogo settings set' first.");
        }
        return Ok(());
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "company_name": settings.company_name,
                "logo_url": settings.logo_url,
                "contact_phone": settings.contact_phone,
                "contact_email": settings.contact_email,
                "store_base_url": settings.store_base_url,
                "store_api_key": redact(&settings.store_api_key),
                "store_api_secret": redact(&settings.store_api_secret),
            }))?
        );
        return Ok(());
    }

    println!("Company:     {}", settings.company_name);
    println!("Logo URL:    {}", settings.logo_url.as_deref().unwrap_or("-"));
    println!(
        "Phone:       {}",
        settings.contact_phone.as_deref().unwrap_or("-")
    );
    println!(
        "Email:       {}",
        settings.contact_email.as_deref().unwrap_or("-")
    );
    println!("Store URL:   {}", blank_dash(&settings.store_base_url));
    println!("API key:     {}", redact(&settings.store_api_key));
    println!("API secret:  {}", redact(&settings.store_api_secret));
    Ok(())
}

pub(crate) fn cmd_settings_set(
    service: &CatalogService,
    update: &SettingsUpdate,
    json: bool,
) -> Result<()> {
    // Merge over what is already stored; unset flags keep their value.
    let current = service.get_settings()?.unwrap_or(CompanySettings {
        company_name: String::new(),
        logo_url: None,
        contact_phone: None,
        contact_email: None,
        store_base_url: String::new(),
        store_api_key: String::new(),
        store_api_secret: String::new(),
    });

    let merged = CompanySettings {
        company_name: update
            .company
            .clone()
            .unwrap_or(current.company_name),
        logo_url: merge_optional(update.logo_url.as_deref(), current.logo_url),
        contact_phone: merge_optional(update.phone.as_deref(), current.contact_phone),
        contact_email: merge_optional(update.email.as_deref(), current.contact_email),
        store_base_url: update
            .base_url
            .clone()
            .unwrap_or(current.store_base_url),
        store_api_key: update.api_key.clone().unwrap_or(current.store_api_key),
        store_api_secret: update
            .api_secret
            .clone()
            .unwrap_or(current.store_api_secret),
    };

    service.save_settings(&merged)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&json!({"saved": true}))?);
    } else {
        println!("Settings saved.");
        if merged.credentials().is_none() {
            println!("Store connection is incomplete; sync needs URL, key and secret.");
        }
    }
    Ok(())
}

/// New value wins; an explicit empty string clears the field.
fn merge_optional(new: Option<&str>, current: Option<String>) -> Option<String> {
    match new {
        Some("") => None,
        Some(v) => Some(v.to_string()),
        None => current,
    }
}

fn blank_dash(s: &str) -> &str {
    if s.trim().is_empty() { "-" } else { s }
}

fn redact(secret: &str) -> String {
    let s = secret.trim();
    if s.is_empty() {
        return "-".to_string();
    }
    if s.len() <= 8 || !s.is_ascii() {
        return "****".to_string();
    }
    format!("{}...{}", &s[..4], &s[s.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_short_secret() {
        assert_eq!(redact("abc"), "****");
        assert_eq!(redact(""), "-");
    }

    #[test]
    fn test_redact_long_secret_keeps_edges() {
        assert_eq!(redact("ck_0123456789abcdef"), "ck_0...cdef");
    }

    #[test]
    fn test_merge_optional_empty_string_clears() {
        assert_eq!(merge_optional(Some(""), Some("old".to_string())), None);
        assert_eq!(
            merge_optional(None, Some("old".to_string())),
            Some("old".to_string())
        );
        assert_eq!(
            merge_optional(Some("new"), Some("old".to_string())),
            Some("new".to_string())
        );
    }
}
