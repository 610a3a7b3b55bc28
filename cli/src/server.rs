use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::limit::RequestBodyLimitLayer;

use catalogo_core::error::SyncError;
use catalogo_core::models::{CompanySettings, Product};
use catalogo_core::pdf::{CompanyInfo, render_catalog_now};
use catalogo_core::service::CatalogService;

use crate::commands::PDF_FILENAME;
use crate::woocommerce::WooClient;

const BODY_LIMIT: usize = 1024 * 1024; // 1 MB

#[derive(Clone)]
struct AppState {
    svc: Arc<Mutex<CatalogService>>,
    woo: Arc<WooClient>,
    api_key: Option<String>,
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct ListQuery {
    search: Option<String>,
}

#[derive(Deserialize)]
struct SetPriceRequest {
    /// `null` clears the override.
    catalog_price: Option<f64>,
}

#[derive(Deserialize)]
struct ExportRequest {
    ids: Vec<i64>,
}

/// Product as the browser UI sees it: sanitized description and the
/// effective price already resolved.
#[derive(Serialize)]
struct ProductView {
    woo_id: i64,
    name: String,
    price: f64,
    catalog_price: Option<f64>,
    display_price: f64,
    description: String,
    image_url: Option<String>,
    category: Option<String>,
    active: bool,
    last_synced_at: String,
}

impl From<Product> for ProductView {
    fn from(p: Product) -> Self {
        Self {
            woo_id: p.woo_id,
            name: p.name.clone(),
            price: p.price,
            catalog_price: p.catalog_price,
            display_price: p.display_price(),
            description: p.display_description(),
            image_url: p.image_url,
            category: p.category,
            active: p.active,
            last_synced_at: p.last_synced_at,
        }
    }
}

/// Settings response; connection secrets never leave the server.
#[derive(Serialize)]
struct SettingsView {
    company_name: String,
    logo_url: Option<String>,
    contact_phone: Option<String>,
    contact_email: Option<String>,
    store_base_url: String,
    store_api_key: String,
    store_api_secret: String,
}

impl From<CompanySettings> for SettingsView {
    fn from(s: CompanySettings) -> Self {
        Self {
            company_name: s.company_name,
            logo_url: s.logo_url,
            contact_phone: s.contact_phone,
            contact_email: s.contact_email,
            store_base_url: s.store_base_url,
            store_api_key: redact(&s.store_api_key),
            store_api_secret: redact(&s.store_api_secret),
        }
    }
}

fn redact(secret: &str) -> String {
    let s = secret.trim();
    if s.is_empty() {
        String::new()
    } else {
        "****".to_string()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    /// The remote store misbehaved; the message is safe to show the user.
    BadGateway(String),
    /// Request-level failure with a user-facing message.
    Failed(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            Self::Failed(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Self::Internal(err) => {
                eprintln!("Internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::SettingsMissing => Self::BadRequest(err.to_string()),
            SyncError::Remote(_) => Self::BadGateway(err.to_string()),
            SyncError::Partial { .. } => Self::Failed(err.to_string()),
            SyncError::Store(e) => Self::Internal(e),
        }
    }
}

// --- Middleware ---

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(ref expected_key) = state.api_key {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected_key);

        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key".to_string(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Handlers ---

async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<ProductView>>, ApiError> {
    let products = {
        let svc = state
            .svc
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        svc.list_products(params.search.as_deref())
            .context("database error")?
    };
    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}

async fn sync_catalog(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let svc = Arc::clone(&state.svc);
    let woo = Arc::clone(&state.woo);

    // The provider bridge blocks on the runtime handle; run it off the
    // async workers.
    let written = tokio::task::spawn_blocking(move || {
        let svc = svc.lock().unwrap_or_else(PoisonError::into_inner);
        svc.synchronize(woo.as_ref())
    })
    .await
    .context("sync task panicked")??;

    let total = {
        let svc = state
            .svc
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        svc.count_products().context("database error")?
    };

    Ok(Json(json!({ "synced": written, "total": total })))
}

async fn set_price(
    State(state): State<AppState>,
    Path(woo_id): Path<i64>,
    Json(req): Json<SetPriceRequest>,
) -> Result<Json<ProductView>, ApiError> {
    if let Some(price) = req.catalog_price {
        if !price.is_finite() || price < 0.0 {
            return Err(ApiError::BadRequest(
                "catalog_price must be a non-negative number".to_string(),
            ));
        }
    }

    let svc = state
        .svc
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    if svc
        .get_product(woo_id)
        .context("database error")?
        .is_none()
    {
        return Err(ApiError::NotFound(format!("Product {woo_id} not found")));
    }

    let product = svc
        .set_catalog_price(woo_id, req.catalog_price)
        .context("failed to update price")?;
    Ok(Json(ProductView::from(product)))
}

async fn get_settings(State(state): State<AppState>) -> Result<Json<SettingsView>, ApiError> {
    let settings = {
        let svc = state
            .svc
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        svc.get_settings().context("database error")?
    };
    settings
        .map(|s| Json(SettingsView::from(s)))
        .ok_or_else(|| ApiError::NotFound("Settings not configured yet".to_string()))
}

async fn put_settings(
    State(state): State<AppState>,
    Json(settings): Json<CompanySettings>,
) -> Result<Json<SettingsView>, ApiError> {
    if settings.company_name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "company_name must not be empty".to_string(),
        ));
    }

    let svc = state
        .svc
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    svc.save_settings(&settings)
        .context("failed to save settings")?;
    Ok(Json(SettingsView::from(settings)))
}

async fn export_pdf(
    State(state): State<AppState>,
    Json(req): Json<ExportRequest>,
) -> Result<Response, ApiError> {
    if req.ids.is_empty() {
        return Err(ApiError::BadRequest(
            "Select at least one product before exporting".to_string(),
        ));
    }

    let (items, settings) = {
        let svc = state
            .svc
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let items = svc.catalog_items(&req.ids).context("database error")?;
        let settings = svc.get_settings().context("database error")?;
        (items, settings)
    };

    if items.is_empty() {
        return Err(ApiError::BadRequest(
            "None of the selected products are in the catalog".to_string(),
        ));
    }
    let settings = settings
        .ok_or_else(|| ApiError::BadRequest("Configure company settings first".to_string()))?;

    let company = CompanyInfo::from(&settings);
    let bytes = render_catalog_now(&items, &company).context("failed to render catalog")?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{PDF_FILENAME}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

// --- Router ---

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/products", get(list_products))
        .route("/api/products/{woo_id}/price", put(set_price))
        .route("/api/sync", post(sync_catalog))
        .route("/api/settings", get(get_settings).put(put_settings))
        .route("/api/export", post(export_pdf))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(
    service: CatalogService,
    port: u16,
    bind: &str,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let state = AppState {
        svc: Arc::new(Mutex::new(service)),
        woo: Arc::new(WooClient::new()),
        api_key: api_key.clone(),
    };

    let app = build_router(state);

    if let Some(ref key) = api_key {
        eprintln!(
            "API key: {}...{} (see api_key file in data directory)",
            &key[..4],
            &key[key.len() - 4..],
        );
    } else {
        eprintln!("Warning: Authentication disabled (--no-auth). API is open to anyone.");
    }

    if bind != "127.0.0.1" && bind != "localhost" && api_key.is_none() {
        eprintln!(
            "Warning: Listening on {bind} with no authentication. Any device on your network can access this API."
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    eprintln!("Listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
