//! HTTP-facing error type.
//!
//! # Design
//! Every failure a handler can hit is folded into `ApiError`, whose
//! `IntoResponse` impl renders the standard envelope with the matching status
//! code. Internal failures are logged here and reported to the caller with a
//! generic message.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::envelope::Envelope;
use crate::model::ValidationErrors;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// One or more fields failed validation (400 with `details`).
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The request could not be read at all: bad JSON, bad path id (400).
    #[error("{0}")]
    BadRequest(String),

    #[error("Todo not found")]
    NotFound,

    /// No route matches the request path.
    #[error("Resource not found")]
    UnknownRoute,

    /// The path exists but does not accept the request method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(errors) => ApiError::Validation(errors),
            StoreError::NotFound(_) => ApiError::NotFound,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(details) => Envelope::error("Validation failed")
                .with_details(details)
                .with_status(StatusCode::BAD_REQUEST),
            ApiError::BadRequest(message) => {
                Envelope::error(message).with_status(StatusCode::BAD_REQUEST)
            }
            ApiError::NotFound | ApiError::UnknownRoute => {
                Envelope::error(self.to_string()).with_status(StatusCode::NOT_FOUND)
            }
            ApiError::MethodNotAllowed => {
                Envelope::error(self.to_string()).with_status(StatusCode::METHOD_NOT_ALLOWED)
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "request failed");
                Envelope::error("Internal server error")
                    .with_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
