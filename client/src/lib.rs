//! Typed client for the todo API, plus the client-local todo list.
//!
//! # Overview
//! Nothing here does I/O. `TodoClient` turns each operation into an
//! `HttpRequest` and turns the host's `HttpResponse` back into typed data or
//! an `ApiError`.
//!
//! # Design
//! - `TodoClient` only knows the server's base URL.
//! - Every endpoint has a `build_*` / `parse_*` pair.
//! - `TodoCache` is the client-local list, owned by the caller and updated
//!   only from confirmed server responses through `TodoSession`.
//! - Wire types are declared here rather than shared with `todo-server`; the
//!   live integration test keeps the two in step.

pub mod cache;
pub mod client;
pub mod error;
pub mod http;
pub mod session;
pub mod types;

pub use cache::{CacheCounts, TodoCache};
pub use client::TodoClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use session::{Exchange, Notice, TodoSession};
pub use types::{
    CreateTodo, Envelope, ListQuery, Priority, PriorityCounts, Stats, StatusFilter, Todo,
    UpdateTodo,
};
