//! Frontend-facing contracts: build each request through the typed client,
//! apply the server's answer to the local cache, and produce the transient
//! notice to show the user.
//!
//! # Design
//! The host drives one round-trip at a time: it asks the session for an
//! `HttpRequest`, performs it, and hands the outcome back to the matching
//! `apply_*` method as an [`Exchange`]. The session parses the response with
//! its `TodoClient`. On success the cache is updated and a success notice
//! returned; on any error (including a transport failure the host reports as
//! `ApiError::Transport`) the cache is left untouched and an error notice
//! returned. Nothing is applied optimistically.

use crate::cache::TodoCache;
use crate::client::TodoClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{CreateTodo, ListQuery, StatusFilter, Todo, UpdateTodo};

/// What the host got back from one round-trip: the server's response, or the
/// reason no response arrived.
pub type Exchange = Result<HttpResponse, ApiError>;

/// A short-lived message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }

    pub fn text(&self) -> &str {
        match self {
            Notice::Success(text) | Notice::Error(text) => text,
        }
    }

    fn from_error(err: &ApiError) -> Self {
        let text = match err {
            ApiError::NotFound => "Todo not found".to_string(),
            ApiError::Validation { message, details } if !details.is_empty() => {
                let fields: Vec<&str> = details.values().map(String::as_str).collect();
                format!("{message}: {}", fields.join("; "))
            }
            other => other.to_string(),
        };
        Notice::Error(text)
    }
}

#[derive(Debug, Clone)]
pub struct TodoSession {
    client: TodoClient,
    cache: TodoCache,
}

impl TodoSession {
    pub fn new(client: TodoClient) -> Self {
        Self {
            client,
            cache: TodoCache::new(),
        }
    }

    pub fn client(&self) -> &TodoClient {
        &self.client
    }

    pub fn cache(&self) -> &TodoCache {
        &self.cache
    }

    pub fn select_filter(&mut self, filter: StatusFilter) {
        self.cache.set_filter(filter);
    }

    /// Fetches every todo matching `search`. The status filter is applied
    /// locally by the cache, so footer counts cover the whole list.
    pub fn list_request(&self, search: Option<&str>) -> Result<HttpRequest, ApiError> {
        let query = ListQuery {
            status: None,
            search: search
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        };
        self.client.build_list_todos(&query)
    }

    pub fn create_request(&self, input: &CreateTodo) -> Result<HttpRequest, ApiError> {
        self.client.build_create_todo(input)
    }

    pub fn update_request(&self, id: i64, input: &UpdateTodo) -> Result<HttpRequest, ApiError> {
        self.client.build_update_todo(id, input)
    }

    pub fn toggle_request(&self, id: i64) -> HttpRequest {
        self.client.build_toggle_todo(id)
    }

    pub fn delete_request(&self, id: i64) -> HttpRequest {
        self.client.build_delete_todo(id)
    }

    pub fn bulk_delete_request(&self, ids: &[i64]) -> Result<HttpRequest, ApiError> {
        self.client.build_bulk_delete(ids)
    }

    /// Replaces the cache with a fresh listing. Success is silent.
    pub fn apply_list(&mut self, exchange: Exchange) -> Option<Notice> {
        match exchange.and_then(|r| self.client.parse_list_todos(r)) {
            Ok(todos) => {
                self.cache.replace_all(todos);
                None
            }
            Err(err) => Some(Notice::from_error(&err)),
        }
    }

    pub fn apply_created(&mut self, exchange: Exchange) -> Notice {
        match exchange.and_then(|r| self.client.parse_create_todo(r)) {
            Ok(todo) => {
                self.cache.prepend(todo);
                Notice::Success("Todo created successfully".to_string())
            }
            Err(err) => Notice::from_error(&err),
        }
    }

    pub fn apply_updated(&mut self, exchange: Exchange) -> Notice {
        let result = exchange.and_then(|r| self.client.parse_update_todo(r));
        self.apply_replaced(result, "Todo updated successfully")
    }

    pub fn apply_toggled(&mut self, exchange: Exchange) -> Notice {
        let result = exchange.and_then(|r| self.client.parse_toggle_todo(r));
        self.apply_replaced(result, "Todo status toggled successfully")
    }

    fn apply_replaced(&mut self, result: Result<Todo, ApiError>, message: &str) -> Notice {
        match result {
            Ok(todo) => {
                self.cache.replace(todo);
                Notice::Success(message.to_string())
            }
            Err(err) => Notice::from_error(&err),
        }
    }

    /// `id` is the todo the request named; it leaves the cache only once the
    /// server confirms.
    pub fn apply_deleted(&mut self, id: i64, exchange: Exchange) -> Notice {
        match exchange.and_then(|r| self.client.parse_delete_todo(r)) {
            Ok(()) => {
                self.cache.remove(id);
                Notice::Success("Todo deleted successfully".to_string())
            }
            Err(err) => Notice::from_error(&err),
        }
    }

    pub fn apply_bulk_deleted(&mut self, ids: &[i64], exchange: Exchange) -> Notice {
        match exchange.and_then(|r| self.client.parse_bulk_delete(r)) {
            Ok(deleted) => {
                self.cache.remove_many(ids);
                Notice::Success(deleted_text(deleted))
            }
            Err(err) => Notice::from_error(&err),
        }
    }
}

fn deleted_text(deleted: u64) -> String {
    match deleted {
        1 => "1 todo deleted".to_string(),
        n => format!("{n} todos deleted"),
    }
}
