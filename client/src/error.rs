//! Error types for the todo API client.
//!
//! # Design
//! `NotFound` and `Validation` get dedicated variants because callers show
//! them differently: a stale item versus a form error with per-field detail.
//! All other non-2xx responses land in `HttpError` with the raw status code
//! and body.

use std::collections::BTreeMap;

use thiserror::Error;

/// Errors returned by `TodoClient` build and parse methods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server returned 404: the requested todo does not exist.
    #[error("resource not found")]
    NotFound,

    /// The server rejected the request with 400.
    #[error("{message}")]
    Validation {
        message: String,
        details: BTreeMap<String, String>,
    },

    /// The server returned any other unexpected status, or an envelope with
    /// `success: false`.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The host could not complete the round-trip at all.
    #[error("network error: {0}")]
    Transport(String),
}
