use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::article;
use crate::errors::ServiceError;
use crate::services::articles::{ArticleFilter, ArticleInput};
use crate::{ApiResponse, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ArticleRequest {
    #[validate(length(min = 1, max = 255, message = "Article name is required"))]
    pub name: String,
    pub category: Option<String>,
    pub supplier_id: Uuid,
    pub purchase_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
}

impl From<ArticleRequest> for ArticleInput {
    fn from(req: ArticleRequest) -> Self {
        ArticleInput {
            name: req.name,
            category: req.category,
            supplier_id: req.supplier_id,
            purchase_price: req.purchase_price,
            sale_price: req.sale_price,
        }
    }
}

/// List query with catalog-specific filters on top of pagination.
#[derive(Debug, Deserialize)]
pub struct ArticleListQuery {
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
    pub search: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub category: Option<String>,
}

pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ArticleListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<article::Model>>>, ServiceError> {
    let filter = ArticleFilter {
        search: query.search.clone(),
        supplier_id: query.supplier_id,
        category: query.category.clone(),
    };

    let (items, total) = state
        .services
        .articles
        .list(query.page, query.limit, filter)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::paged(
        items,
        total,
        query.page,
        query.limit,
    ))))
}

pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<article::Model>>, ServiceError> {
    let found = state.services.articles.get(id).await?;
    Ok(Json(ApiResponse::success(found)))
}

pub async fn create_article(
    State(state): State<AppState>,
    Json(payload): Json<ArticleRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let created = state.services.articles.create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

pub async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ArticleRequest>,
) -> Result<Json<ApiResponse<article::Model>>, ServiceError> {
    payload.validate()?;
    let updated = state.services.articles.update(id, payload.into()).await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    state.services.articles.delete(id).await?;
    Ok(Json(ApiResponse::message("Article deleted")))
}
