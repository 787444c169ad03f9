//! HTTP error mapping

use crate::core::error::LedgerError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Client-facing error, rendered as `{"error": "..."}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Validation(msg) => Self::bad_request(msg),
            LedgerError::TaskNotFound(_) => Self::not_found("Task not found"),
            other => {
                // Resolver failures are absorbed before they get here
                tracing::error!(error = %other, "Unexpected error in request");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Internal error".into(),
                }
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TaskId;

    #[test]
    fn test_ledger_error_mapping() {
        let e: ApiError = LedgerError::TaskNotFound(TaskId(4)).into();
        assert_eq!(e.status, StatusCode::NOT_FOUND);

        let e: ApiError = LedgerError::Validation("Description is required".into()).into();
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert_eq!(e.message, "Description is required");

        let e: ApiError = LedgerError::Schema("bad".into()).into();
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
