use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use claims_common::error::CommonError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("document not found: {0}")]
    NotFound(String),
}

/// Wire shape for error responses: `{error, details?, error_code?}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details, error_code) = match &self {
            AppError::BadRequest(detail) => (
                StatusCode::BAD_REQUEST,
                "invalid request".to_string(),
                Some(detail.clone()),
                Some("BAD_REQUEST"),
            ),
            AppError::NotFound(detail) => (
                StatusCode::NOT_FOUND,
                "document not found".to_string(),
                Some(detail.clone()),
                Some("NOT_FOUND"),
            ),
            AppError::Common(e) => {
                tracing::error!(error = %e, "infrastructure failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                    Some(e.to_string()),
                    Some("INFRA"),
                )
            }
            AppError::Config(detail) => {
                tracing::error!(detail = %detail, "configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration error".to_string(),
                    Some(detail.clone()),
                    Some("CONFIG"),
                )
            }
        };

        let body = ErrorBody {
            error,
            details,
            error_code,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_shape() {
        let body = ErrorBody {
            error: "document not found".to_string(),
            details: Some("doc-42".to_string()),
            error_code: Some("NOT_FOUND"),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "document not found");
        assert_eq!(json["details"], "doc-42");
        assert_eq!(json["error_code"], "NOT_FOUND");
    }

    #[test]
    fn optional_fields_omitted() {
        let body = ErrorBody {
            error: "internal error".to_string(),
            details: None,
            error_code: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"error":"internal error"}"#);
    }

    #[test]
    fn status_mapping() {
        let resp = AppError::NotFound("doc-1".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = AppError::BadRequest("empty query".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
