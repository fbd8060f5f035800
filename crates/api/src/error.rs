//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cart::{CartError, FailureKind};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// The cart rejected the operation.
    Cart(CartError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Cart(err) => match err.kind() {
                FailureKind::NotFound => StatusCode::NOT_FOUND,
                FailureKind::OutOfStock => StatusCode::CONFLICT,
                FailureKind::InvalidAmount => StatusCode::BAD_REQUEST,
                FailureKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (kind, message) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg),
            ApiError::Cart(err) => (err.kind().as_str(), err.to_string()),
        };

        let body = serde_json::json!({ "error": message, "kind": kind });
        (status, axum::Json(body)).into_response()
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        ApiError::Cart(err)
    }
}
