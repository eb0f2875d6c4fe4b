//! Error types for meterd

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::gemini::ExtractionError;

/// API error type
///
/// Business-rule failures carry a fixed `error_code` and a Portuguese
/// description; infrastructure failures (database, upstream API) map to
/// explicit 5xx responses with the same body shape.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request field has the wrong primitive type (400)
    #[error("Invalid field type: {0}")]
    InvalidType(String),

    /// Request field fails semantic validation, or extraction yielded no
    /// usable value (400)
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A reading already exists for the customer/type/month window (409)
    #[error("Reading already reported for this month")]
    DoubleReport,

    /// Reading lookup miss on confirmation (404)
    #[error("Reading not found")]
    MeasureNotFound,

    /// Listing query matched zero rows (404)
    #[error("No readings found")]
    MeasuresNotFound,

    /// Re-confirmation attempt on an already confirmed reading (409)
    #[error("Reading already confirmed")]
    ConfirmationDuplicate,

    /// External extraction service failure (502)
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error (500)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error (500)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, description) = match self {
            ApiError::InvalidType(msg) => (StatusCode::BAD_REQUEST, "INVALID_TYPE", msg),
            ApiError::InvalidData(msg) => (StatusCode::BAD_REQUEST, "INVALID_DATA", msg),
            ApiError::DoubleReport => (
                StatusCode::CONFLICT,
                "DOUBLE_REPORT",
                "Leitura do mês já realizada".to_string(),
            ),
            ApiError::MeasureNotFound => (
                StatusCode::NOT_FOUND,
                "MEASURE_NOT_FOUND",
                "Leitura não encontrada".to_string(),
            ),
            ApiError::MeasuresNotFound => (
                StatusCode::NOT_FOUND,
                "MEASURES_NOT_FOUND",
                "Nenhuma leitura encontrada".to_string(),
            ),
            ApiError::ConfirmationDuplicate => (
                StatusCode::CONFLICT,
                "CONFIRMATION_DUPLICATE",
                "Leitura já confirmada".to_string(),
            ),
            ApiError::Extraction(ref err) => {
                tracing::error!(error = %err, "Extraction service failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "EXTRACTION_FAILED",
                    "Falha ao consultar o serviço de extração de imagem".to_string(),
                )
            }
            ApiError::Database(ref err) => {
                tracing::error!(error = %err, "Database failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Erro interno ao acessar o banco de dados".to_string(),
                )
            }
            ApiError::Io(ref err) => {
                tracing::error!(error = %err, "IO failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Erro interno do servidor".to_string(),
                )
            }
            ApiError::Other(ref err) => {
                tracing::error!(error = %err, "Unhandled failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Erro interno do servidor".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error_code": error_code,
            "error_description": description,
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
