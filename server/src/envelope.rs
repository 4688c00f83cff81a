//! The uniform JSON wrapper returned by every endpoint.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::Serialize;

use crate::model::ValidationErrors;

/// `{success, data?, error?, details?, message?, count?, deleted_count?}`.
/// Absent fields are omitted from the serialized body.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ValidationErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_count: Option<u64>,
}

impl<T> Envelope<T> {
    fn empty(success: bool) -> Self {
        Self {
            success,
            data: None,
            error: None,
            details: None,
            message: None,
            count: None,
            deleted_count: None,
        }
    }

    pub fn data(data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::empty(true)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

impl Envelope<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self::empty(true).with_message(message)
    }

    pub fn deleted(deleted_count: u64) -> Self {
        Self {
            deleted_count: Some(deleted_count),
            ..Self::empty(true)
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::empty(false)
        }
    }

    pub fn with_details(mut self, details: ValidationErrors) -> Self {
        self.details = Some(details);
        self
    }
}

impl<T: Serialize> Envelope<T> {
    pub fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        self.with_status(StatusCode::OK)
    }
}
