//! BarNode API Library
//!
//! Back-office service for bar management: supplier/article catalog with
//! spreadsheet import, and purchase-order lifecycle with per-supplier draft
//! accumulation.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod import;
pub mod migrator;
pub mod openapi;
pub mod repositories;
pub mod services;

use axum::{
    extract::State,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: services::AppServices,
}

// Common query parameters for list endpoints
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub search: Option<String>,
}

pub(crate) fn default_page() -> u64 {
    1
}
pub(crate) fn default_limit() -> u64 {
    20
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, query: &ListQuery) -> Self {
        Self::paged(items, total, query.page, query.limit)
    }

    pub fn paged(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let limit = limit.max(1);
        Self {
            items,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

// API v1 route table
pub fn api_v1_routes() -> Router<AppState> {
    let suppliers = Router::new()
        .route(
            "/suppliers",
            get(handlers::suppliers::list_suppliers).post(handlers::suppliers::create_supplier),
        )
        .route(
            "/suppliers/:id",
            get(handlers::suppliers::get_supplier)
                .put(handlers::suppliers::update_supplier)
                .delete(handlers::suppliers::delete_supplier),
        );

    let articles = Router::new()
        .route(
            "/articles",
            get(handlers::articles::list_articles).post(handlers::articles::create_article),
        )
        .route(
            "/articles/:id",
            get(handlers::articles::get_article)
                .put(handlers::articles::update_article)
                .delete(handlers::articles::delete_article),
        );

    let orders = Router::new()
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        // Draft routes come before /orders/:id so the path segments don't clash
        .route("/orders/drafts/items", post(handlers::orders::add_draft_item))
        .route("/orders/drafts/count", get(handlers::orders::count_drafts))
        .route(
            "/orders/:id",
            get(handlers::orders::get_order).delete(handlers::orders::delete_order),
        )
        .route("/orders/:id/state", put(handlers::orders::update_order_state))
        .route("/orders/:id/receive", post(handlers::orders::receive_order))
        .route(
            "/orders/:id/lines/:line_id",
            delete(handlers::orders::delete_order_line),
        );

    let imports = Router::new()
        .route("/import/articles", post(handlers::imports::import_articles))
        .route(
            "/import/articles/remote",
            post(handlers::imports::import_articles_remote),
        );

    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .route("/openapi.json", get(openapi_json))
        .merge(suppliers)
        .merge(articles)
        .merge(orders)
        .merge(imports)
}

async fn api_status() -> ApiResult<Value> {
    let status_data = json!({
        "status": "ok",
        "service": "barnode-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(State(state): State<AppState>) -> ApiResult<Value> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

async fn openapi_json() -> Json<Value> {
    Json(
        serde_json::to_value(openapi::ApiDoc::openapi())
            .unwrap_or_else(|_| json!({"error": "failed to render OpenAPI document"})),
    )
}
