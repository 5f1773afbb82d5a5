use utoipa::OpenApi;

use crate::entities::order::OrderState;
use crate::errors::ErrorResponse;
use crate::handlers::articles::ArticleRequest;
use crate::handlers::imports::RemoteImportRequest;
use crate::handlers::orders::{
    AddDraftItemRequest, CreateOrderRequest, ReceiveLineRequest, ReceiveRequest,
    UpdateStateRequest,
};
use crate::handlers::suppliers::SupplierRequest;
use crate::import::ImportReport;

/// Machine-readable API description served at `/api/v1/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "BarNode API",
        description = "Bar back-office: supplier catalog, spreadsheet imports, purchase order lifecycle",
        license(name = "MIT")
    ),
    components(schemas(
        ErrorResponse,
        ImportReport,
        SupplierRequest,
        ArticleRequest,
        CreateOrderRequest,
        UpdateStateRequest,
        AddDraftItemRequest,
        ReceiveRequest,
        ReceiveLineRequest,
        RemoteImportRequest,
        OrderState,
    ))
)]
pub struct ApiDoc;
