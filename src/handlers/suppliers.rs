use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::supplier;
use crate::errors::ServiceError;
use crate::services::suppliers::SupplierInput;
use crate::{ApiResponse, AppState, ListQuery, PaginatedResponse};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SupplierRequest {
    #[validate(length(min = 1, max = 255, message = "Supplier name is required"))]
    pub name: String,
    pub contact: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub notes: Option<String>,
}

impl From<SupplierRequest> for SupplierInput {
    fn from(req: SupplierRequest) -> Self {
        SupplierInput {
            name: req.name,
            contact: req.contact,
            email: req.email,
            notes: req.notes,
        }
    }
}

pub async fn list_suppliers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<supplier::Model>>>, ServiceError> {
    let (items, total) = state
        .services
        .suppliers
        .list(query.page, query.limit, query.search.clone())
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, &query,
    ))))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<supplier::Model>>, ServiceError> {
    let found = state.services.suppliers.get(id).await?;
    Ok(Json(ApiResponse::success(found)))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    Json(payload): Json<SupplierRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let created = state.services.suppliers.create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SupplierRequest>,
) -> Result<Json<ApiResponse<supplier::Model>>, ServiceError> {
    payload.validate()?;
    let updated = state.services.suppliers.update(id, payload.into()).await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    state.services.suppliers.delete(id).await?;
    Ok(Json(ApiResponse::message("Supplier deleted")))
}
