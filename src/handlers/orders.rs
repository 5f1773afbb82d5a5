use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::order::{self, OrderState};
use crate::errors::ServiceError;
use crate::services::orders::{
    AddToDraftResult, DraftCounts, OrderFilter, OrderInput, OrderWithLines, ReceiveLine,
};
use crate::{ApiResponse, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub supplier_id: Uuid,
    pub order_date: Option<NaiveDate>,
    pub state: Option<OrderState>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStateRequest {
    pub state: OrderState,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddDraftItemRequest {
    pub article_id: Uuid,
    pub qty: Option<Decimal>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReceiveLineRequest {
    pub line_id: Uuid,
    pub qty_received: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReceiveRequest {
    pub lines: Vec<ReceiveLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
    pub state: Option<OrderState>,
    pub supplier_id: Option<Uuid>,
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<order::Model>>>, ServiceError> {
    let filter = OrderFilter {
        state: query.state,
        supplier_id: query.supplier_id,
    };

    let (items, total) = state
        .services
        .order_admin
        .list(query.page, query.limit, filter)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::paged(
        items,
        total,
        query.page,
        query.limit,
    ))))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderWithLines>>, ServiceError> {
    let found = state.services.order_admin.get_with_lines(id).await?;
    Ok(Json(ApiResponse::success(found)))
}

pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state
        .services
        .order_admin
        .create(OrderInput {
            supplier_id: payload.supplier_id,
            order_date: payload.order_date,
            state: payload.state,
            notes: payload.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

pub async fn update_order_state(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStateRequest>,
) -> Result<Json<ApiResponse<order::Model>>, ServiceError> {
    let updated = state.services.orders.update_state(id, payload.state).await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn receive_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReceiveRequest>,
) -> Result<Json<ApiResponse<order::Model>>, ServiceError> {
    let lines = payload
        .lines
        .into_iter()
        .map(|l| ReceiveLine {
            line_id: l.line_id,
            quantity_received: l.qty_received,
        })
        .collect();

    let updated = state.services.orders.receive(id, lines).await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    state.services.order_admin.delete(id).await?;
    Ok(Json(ApiResponse::message("Order deleted")))
}

pub async fn delete_order_line(
    State(state): State<AppState>,
    Path((id, line_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    state.services.order_admin.delete_line(id, line_id).await?;
    Ok(Json(ApiResponse::message("Order line deleted")))
}

pub async fn add_draft_item(
    State(state): State<AppState>,
    Json(payload): Json<AddDraftItemRequest>,
) -> Result<Json<ApiResponse<AddToDraftResult>>, ServiceError> {
    let result = state
        .services
        .orders
        .add_item_to_draft(payload.article_id, payload.qty)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

pub async fn count_drafts(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DraftCounts>>, ServiceError> {
    let counts = state.services.orders.count_drafts().await?;
    Ok(Json(ApiResponse::success(counts)))
}
