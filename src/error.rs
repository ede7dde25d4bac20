/*
 * Responsibility
 * - Gateway-wide AppError
 * - IntoResponse (HTTP status + `{"error": "<message>"}` body)
 * - Authentication / routing failures are converted here so every rejection has the same shape
 */
use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::middleware::auth::AuthError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse<'a> {
    pub error: &'a str,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    // One message for every authentication failure; the cause only goes to the logs.
    #[error("invalid or missing credentials")]
    Unauthorized,
    #[error("not found")]
    NotFound,
    #[error("request body too large")]
    PayloadTooLarge,
    #[error("request timed out")]
    RequestTimeout,
    #[error("upstream service unavailable")]
    BadGateway,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            AppError::BadGateway => StatusCode::BAD_GATEWAY,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let bytes = match serde_json::to_vec(&ErrorResponse { error: &message }) {
            Ok(bytes) => bytes,
            Err(_) => br#"{"error": "internal server error"}"#.to_vec(),
        };
        let content_length = HeaderValue::from(bytes.len());

        let mut res = Response::new(Body::from(bytes));
        *res.status_mut() = self.status();
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        res.headers_mut()
            .insert(header::CONTENT_LENGTH, content_length);
        res
    }
}

impl From<AuthError> for AppError {
    fn from(_: AuthError) -> Self {
        // Never leak which check failed.
        AppError::Unauthorized
    }
}
