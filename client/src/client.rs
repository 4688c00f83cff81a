//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The caller executes the actual HTTP round-trip, keeping the client
//! deterministic and free of I/O dependencies.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{BulkDelete, CreateTodo, Envelope, ListQuery, Stats, Todo, UpdateTodo};

/// Synchronous, stateless client for the todo API.
///
/// `base_url` is the server root; every path is placed under `/api`.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.base_url)
    }

    pub fn build_health(&self) -> HttpRequest {
        HttpRequest::bodyless(HttpMethod::Get, self.url("/health"))
    }

    pub fn build_list_todos(&self, query: &ListQuery) -> Result<HttpRequest, ApiError> {
        let query_string = serde_urlencoded::to_string(query)
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;
        let mut path = self.url("/todos");
        if !query_string.is_empty() {
            path.push('?');
            path.push_str(&query_string);
        }
        Ok(HttpRequest::bodyless(HttpMethod::Get, path))
    }

    pub fn build_get_todo(&self, id: i64) -> HttpRequest {
        HttpRequest::bodyless(HttpMethod::Get, self.url(&format!("/todos/{id}")))
    }

    pub fn build_create_todo(&self, input: &CreateTodo) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest::json(
            HttpMethod::Post,
            self.url("/todos"),
            to_json(input)?,
        ))
    }

    pub fn build_update_todo(&self, id: i64, input: &UpdateTodo) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest::json(
            HttpMethod::Put,
            self.url(&format!("/todos/{id}")),
            to_json(input)?,
        ))
    }

    pub fn build_toggle_todo(&self, id: i64) -> HttpRequest {
        HttpRequest::bodyless(HttpMethod::Patch, self.url(&format!("/todos/{id}/toggle")))
    }

    pub fn build_delete_todo(&self, id: i64) -> HttpRequest {
        HttpRequest::bodyless(HttpMethod::Delete, self.url(&format!("/todos/{id}")))
    }

    pub fn build_bulk_delete(&self, ids: &[i64]) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest::json(
            HttpMethod::Delete,
            self.url("/todos/bulk"),
            to_json(&BulkDelete { ids })?,
        ))
    }

    pub fn build_stats(&self) -> HttpRequest {
        HttpRequest::bodyless(HttpMethod::Get, self.url("/todos/stats"))
    }

    pub fn parse_health(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_envelope::<()>(&response, 200).map(|_| ())
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<Todo>, ApiError> {
        parse_data(&response, 200)
    }

    pub fn parse_get_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_data(&response, 200)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_data(&response, 201)
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_data(&response, 200)
    }

    pub fn parse_toggle_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_data(&response, 200)
    }

    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        parse_envelope::<()>(&response, 200).map(|_| ())
    }

    /// Returns the number of todos the server actually deleted.
    pub fn parse_bulk_delete(&self, response: HttpResponse) -> Result<u64, ApiError> {
        let envelope = parse_envelope::<()>(&response, 200)?;
        envelope
            .deleted_count
            .ok_or_else(|| ApiError::DeserializationError("missing deleted_count".to_string()))
    }

    pub fn parse_stats(&self, response: HttpResponse) -> Result<Stats, ApiError> {
        parse_data(&response, 200)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::SerializationError(e.to_string()))
}

fn parse_data<T: DeserializeOwned>(response: &HttpResponse, expected: u16) -> Result<T, ApiError> {
    parse_envelope(response, expected)?
        .data
        .ok_or_else(|| ApiError::DeserializationError("missing data".to_string()))
}

fn parse_envelope<T: DeserializeOwned>(
    response: &HttpResponse,
    expected: u16,
) -> Result<Envelope<T>, ApiError> {
    check_status(response, expected)?;
    let envelope: Envelope<T> = serde_json::from_str(&response.body)
        .map_err(|e| ApiError::DeserializationError(e.to_string()))?;
    if !envelope.success {
        return Err(ApiError::HttpError {
            status: response.status,
            body: response.body.clone(),
        });
    }
    Ok(envelope)
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    match response.status {
        404 => Err(ApiError::NotFound),
        400 => match serde_json::from_str::<Envelope<()>>(&response.body) {
            Ok(envelope) => Err(ApiError::Validation {
                message: envelope
                    .error
                    .unwrap_or_else(|| "Validation failed".to_string()),
                details: envelope.details.unwrap_or_default(),
            }),
            Err(_) => Err(http_error(response)),
        },
        _ => Err(http_error(response)),
    }
}

fn http_error(response: &HttpResponse) -> ApiError {
    ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    }
}
