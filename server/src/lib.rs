//! Single-user todo list service: a REST API over one SQLite table.
//!
//! # Overview
//! - [`store::TodoStore`] owns the `todos` table and implements every
//!   operation (list, get, create, update, toggle, delete, bulk delete,
//!   stats).
//! - [`api`] maps `/api/...` routes to store calls and wraps each result in
//!   the [`envelope::Envelope`] JSON shape.
//! - [`config::Config`] carries the binary's listen address and database URL.

pub mod api;
pub mod config;
pub mod envelope;
pub mod error;
pub mod model;
pub mod store;

use axum::Router;
use tokio::net::TcpListener;

pub use error::ApiError;
pub use model::{CreateTodo, Priority, Stats, StatusFilter, Todo, UpdateTodo};
pub use store::{StoreError, TodoStore};

pub fn app(store: TodoStore) -> Router {
    api::router(store)
}

/// Serves the API on `listener` until Ctrl-C.
pub async fn run(listener: TcpListener, store: TodoStore) -> Result<(), std::io::Error> {
    axum::serve(listener, app(store))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(err) => {
            tracing::error!(%err, "cannot listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
