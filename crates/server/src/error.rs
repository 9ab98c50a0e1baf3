//! Request-level error type and its mapping onto HTTP responses.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tally_core::ValidationError;
use tally_receipt::{PdfError, PipelineError, UploadError};
use tally_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Missing or invalid bearer token")]
    Unauthorized,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    UnsupportedMediaType(String),
    #[error("{0}")]
    InvalidReceipt(String),
    #[error("{0}")]
    Upstream(String),
    /// Logged server-side; the client only sees a generic message.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::InvalidReceipt(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(detail) => {
                tracing::error!("Internal error: {detail}");
                "An unexpected error occurred, please try again later.".to_string()
            }
            ApiError::Upstream(detail) => {
                tracing::error!("Upstream error: {detail}");
                self.to_string()
            }
            _ => self.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(_) => ApiError::NotFound(e.to_string()),
            StorageError::Conflict(_) => ApiError::Conflict(e.to_string()),
            StorageError::Database(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Upload(UploadError::UnsupportedType(_)) => {
                ApiError::UnsupportedMediaType(e.to_string())
            }
            PipelineError::Upload(UploadError::TooLarge { .. }) => {
                ApiError::PayloadTooLarge(e.to_string())
            }
            PipelineError::Upload(UploadError::Empty) => ApiError::BadRequest(e.to_string()),
            PipelineError::Pdf(PdfError::NoText) | PipelineError::Pdf(PdfError::Load(_)) => {
                ApiError::InvalidReceipt(e.to_string())
            }
            PipelineError::InvalidReceipt(_) => ApiError::InvalidReceipt(e.to_string()),
            PipelineError::Completion(_) => ApiError::Upstream(e.to_string()),
            PipelineError::Io(_) | PipelineError::Task(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(e.body_text())
        } else {
            ApiError::BadRequest(e.body_text())
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        match e.status() {
            StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(e.body_text()),
            StatusCode::UNSUPPORTED_MEDIA_TYPE => ApiError::UnsupportedMediaType(e.body_text()),
            _ => ApiError::BadRequest(e.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(e: PathRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::Money;
    use tally_receipt::ParseError;

    #[test]
    fn pipeline_errors_map_to_statuses() {
        let cases = [
            (
                PipelineError::Upload(UploadError::UnsupportedType("text/plain".into())),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (
                PipelineError::Upload(UploadError::TooLarge { size: 11, limit: 10 }),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (PipelineError::Pdf(PdfError::NoText), StatusCode::UNPROCESSABLE_ENTITY),
            (
                PipelineError::InvalidReceipt(ParseError::NoJson),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                PipelineError::Io(std::io::Error::other("disk full")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn storage_and_validation_errors_map_to_statuses() {
        assert_eq!(
            ApiError::from(StorageError::NotFound("Expense")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(StorageError::Conflict("Category already exists".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(ValidationError::NonPositiveAmount(Money::zero())).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn internal_error_is_500() {
        let response = ApiError::Internal("secret path /var/db".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
