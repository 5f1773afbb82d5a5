use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standardized error body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("persistence error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        DbErr,
    ),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// The import source could not be decoded as the declared format.
    #[error("source unreadable: {0}")]
    SourceUnreadable(String),

    /// The import source yielded more valid rows than the configured cap.
    /// Rejects the whole run before any write, unlike per-row skipping.
    #[error("row limit exceeded: {actual} valid rows, limit is {limit}")]
    RowLimitExceeded { limit: usize, actual: usize },

    #[error("external service error: {0}")]
    ExternalServiceError(String),

    #[error("internal error: {0}")]
    InternalError(String),

    #[error("other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::InvalidInput(_) | Self::InvalidStatus(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::SourceUnreadable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::RowLimitExceeded { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            Self::InternalError(_) | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message suitable for HTTP responses. Storage-engine internals are
    /// never exposed to the caller.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Persistence error".to_string(),
            Self::InternalError(_) | Self::Other(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = ServiceError::NotFound("Order abc".into());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.response_message(), "not found: Order abc");
    }

    #[test]
    fn row_limit_maps_to_413() {
        let err = ServiceError::RowLimitExceeded {
            limit: 200,
            actual: 201,
        };
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn database_error_message_is_redacted() {
        let err = ServiceError::DatabaseError(DbErr::Custom("password=hunter2".into()));
        assert_eq!(err.response_message(), "Persistence error");
    }
}
