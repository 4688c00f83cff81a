//! HTTP handlers and routing for the `/api` surface.
//!
//! # Design
//! Handlers stay thin: extract, call one `TodoStore` operation, wrap the
//! outcome in an `Envelope`. Custom extractors (`TodoId`, `JsonBody`) turn
//! axum's plain-text rejections into enveloped 400s, and both fallbacks
//! (unknown path, unsupported method) answer in the envelope too, so every
//! response has the same shape.

use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request, State};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{delete, get, patch};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::model::{
    BulkDelete, CreateTodo, Stats, StatusFilter, Todo, UpdateTodo, ValidationErrors,
};
use crate::store::TodoStore;

#[derive(Clone)]
pub struct AppState {
    pub store: TodoStore,
}

/// Builds the full application router around `store`.
pub fn router(store: TodoStore) -> Router {
    let api = Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/bulk", delete(bulk_delete_todos))
        .route("/todos/stats", get(todo_stats))
        .route(
            "/todos/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .route("/todos/{id}/toggle", patch(toggle_todo))
        .route("/health", get(health))
        .method_not_allowed_fallback(method_not_allowed);

    Router::new()
        .nest("/api", api)
        .fallback(unknown_route)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { store })
}

/// Integer todo id from the path, rejected as an enveloped 400.
pub struct TodoId(pub i64);

impl<S> FromRequestParts<S> for TodoId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                ApiError::BadRequest(format!("Invalid todo id: {}", rejection.body_text()))
            })?;
        Ok(Self(id))
    }
}

/// `Json<T>` whose rejection is an enveloped 400.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub search: Option<String>,
}

async fn list_todos(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Envelope<Vec<Todo>>, ApiError> {
    let Query(params) = params?;
    let filter = match params.status.as_deref() {
        Some(raw) => raw.parse::<StatusFilter>().map_err(|_| {
            ValidationErrors::single("status", "Status must be one of: all, active, completed")
        })?,
        None => StatusFilter::All,
    };

    let todos = state.store.list(filter, params.search.as_deref()).await?;
    tracing::debug!(?filter, count = todos.len(), "listed todos");
    let count = todos.len();
    Ok(Envelope::data(todos).with_count(count))
}

async fn get_todo(
    State(state): State<AppState>,
    TodoId(id): TodoId,
) -> Result<Envelope<Todo>, ApiError> {
    let todo = state.store.get(id).await?;
    Ok(Envelope::data(todo))
}

async fn create_todo(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateTodo>,
) -> Result<Response, ApiError> {
    let todo = state.store.create(input).await?;
    tracing::info!(id = todo.id, "todo created");
    Ok(Envelope::data(todo)
        .with_message("Todo created successfully")
        .with_status(StatusCode::CREATED))
}

async fn update_todo(
    State(state): State<AppState>,
    TodoId(id): TodoId,
    JsonBody(input): JsonBody<UpdateTodo>,
) -> Result<Envelope<Todo>, ApiError> {
    let todo = state.store.update(id, input).await?;
    tracing::info!(id, "todo updated");
    Ok(Envelope::data(todo).with_message("Todo updated successfully"))
}

async fn toggle_todo(
    State(state): State<AppState>,
    TodoId(id): TodoId,
) -> Result<Envelope<Todo>, ApiError> {
    let todo = state.store.toggle(id).await?;
    tracing::info!(id, completed = todo.completed, "todo toggled");
    Ok(Envelope::data(todo).with_message("Todo status toggled successfully"))
}

async fn delete_todo(
    State(state): State<AppState>,
    TodoId(id): TodoId,
) -> Result<Envelope<()>, ApiError> {
    state.store.delete(id).await?;
    tracing::info!(id, "todo deleted");
    Ok(Envelope::message("Todo deleted successfully"))
}

async fn bulk_delete_todos(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<BulkDelete>,
) -> Result<Envelope<()>, ApiError> {
    let ids = input.validate()?;
    let deleted = state.store.bulk_delete(&ids).await?;
    tracing::info!(requested = ids.len(), deleted, "todos bulk deleted");
    Ok(Envelope::deleted(deleted).with_message("Todos deleted successfully"))
}

async fn todo_stats(State(state): State<AppState>) -> Result<Envelope<Stats>, ApiError> {
    Ok(Envelope::data(state.store.stats().await?))
}

async fn health() -> Envelope<()> {
    Envelope::message("API is running")
}

async fn unknown_route() -> ApiError {
    ApiError::UnknownRoute
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
