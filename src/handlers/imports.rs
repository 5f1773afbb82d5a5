use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::ServiceError;
use crate::import::ImportReport;
use crate::{ApiResponse, AppState};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RemoteImportRequest {
    #[validate(url(message = "Invalid URL"))]
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadImportQuery {
    /// Worksheet to read; defaults to the first sheet.
    pub sheet: Option<String>,
}

/// Upload-based catalog import. Expects a single `file` part; the payload
/// size cap is enforced before the tabular reader ever sees the bytes.
pub async fn import_articles(
    State(state): State<AppState>,
    Query(query): Query<UploadImportQuery>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ImportReport>>, ServiceError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ServiceError::InvalidInput(format!("Malformed multipart body: {}", e))
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(|s| s.to_string());
        let media_type = field.content_type().map(|s| s.to_string());
        let bytes = field.bytes().await.map_err(|e| {
            ServiceError::InvalidInput(format!("Failed to read upload: {}", e))
        })?;

        let max_bytes = state.config.import_max_upload_bytes;
        if bytes.len() > max_bytes {
            return Err(ServiceError::ValidationError(format!(
                "Upload exceeds the maximum size of {} bytes",
                max_bytes
            )));
        }

        info!(
            filename = filename.as_deref().unwrap_or("<unnamed>"),
            size = bytes.len(),
            "catalog import upload received"
        );

        let report = state
            .services
            .imports
            .import_upload(
                bytes.to_vec(),
                media_type.as_deref(),
                filename.as_deref(),
                query.sheet.clone(),
            )
            .await?;

        return Ok(Json(ApiResponse::success(report)));
    }

    Err(ServiceError::InvalidInput(
        "Missing 'file' field in multipart body".to_string(),
    ))
}

/// Import from a remote delimited-text export URL (e.g. a published
/// Google Sheets CSV export). Shape validation only before the fetch.
pub async fn import_articles_remote(
    State(state): State<AppState>,
    Json(payload): Json<RemoteImportRequest>,
) -> Result<Json<ApiResponse<ImportReport>>, ServiceError> {
    payload.validate()?;

    info!(url = %payload.url, "catalog import from remote export requested");

    let report = state.services.imports.import_remote(&payload.url).await?;
    Ok(Json(ApiResponse::success(report)))
}
