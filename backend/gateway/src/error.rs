//! HTTP error responses: `{ "message", "error"? }` with a mapped status.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chequeforge_core::ChequeError;
use serde::Serialize;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub error: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

impl From<ChequeError> for ApiError {
    fn from(err: ChequeError) -> Self {
        match err {
            ChequeError::InvalidImage(message) => Self::bad_request(message),
            ChequeError::NotFound(id) => {
                Self::new(StatusCode::NOT_FOUND, "Cheque not found.").with_error(id)
            }
            ChequeError::Storage(message) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Storage failure.").with_error(message)
            }
            other => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Error processing cheque.")
                .with_error(other.to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::new(err.status(), "Could not read the upload.").with_error(err.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: &self.message,
            error: self.error.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}
