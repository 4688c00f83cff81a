//! SQLite-backed storage for todos.
//!
//! # Design
//! `TodoStore` owns the single `todos` table. Every operation is one SQL
//! statement, so each is atomic without an explicit transaction: `toggle` and
//! `update` are `UPDATE ... RETURNING`, which means an operation racing a
//! delete simply matches zero rows and reports `NotFound`.
//!
//! The table repeats the domain constraints as `CHECK` clauses, and
//! `AUTOINCREMENT` guarantees ids are never reused after a delete.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use thiserror::Error;

use crate::model::{
    CreateTodo, PriorityCounts, Stats, StatusFilter, Todo, UpdateTodo, ValidationErrors,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS todos (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT    NOT NULL CHECK (length(title) BETWEEN 1 AND 200),
    description TEXT             CHECK (description IS NULL OR length(description) <= 1000),
    completed   BOOLEAN NOT NULL DEFAULT 0,
    priority    TEXT    NOT NULL DEFAULT 'medium' CHECK (priority IN ('low', 'medium', 'high')),
    created_at  TEXT    NOT NULL,
    updated_at  TEXT    NOT NULL
)";

const SELECT_TODOS: &str = "
SELECT id, title, description, completed, priority, created_at, updated_at
FROM todos
WHERE (? IS NULL OR completed = ?)
ORDER BY id DESC";

const SELECT_TODO: &str = "
SELECT id, title, description, completed, priority, created_at, updated_at
FROM todos
WHERE id = ?";

const INSERT_TODO: &str = "
INSERT INTO todos (title, description, completed, priority, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?)
RETURNING id, title, description, completed, priority, created_at, updated_at";

const UPDATE_TODO: &str = "
UPDATE todos SET
    title       = COALESCE(?, title),
    description = CASE WHEN ? THEN ? ELSE description END,
    completed   = COALESCE(?, completed),
    priority    = COALESCE(?, priority),
    updated_at  = ?
WHERE id = ?
RETURNING id, title, description, completed, priority, created_at, updated_at";

const TOGGLE_TODO: &str = "
UPDATE todos SET completed = NOT completed, updated_at = ?
WHERE id = ?
RETURNING id, title, description, completed, priority, created_at, updated_at";

const DELETE_TODO: &str = "DELETE FROM todos WHERE id = ?";

const SELECT_STATS: &str = "
SELECT
    COUNT(*),
    COALESCE(SUM(completed), 0),
    COALESCE(SUM(priority = 'low'), 0),
    COALESCE(SUM(priority = 'medium'), 0),
    COALESCE(SUM(priority = 'high'), 0)
FROM todos";

/// Errors returned by `TodoStore` operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The input failed field-level validation; nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("todo not found: {0}")]
    NotFound(i64),

    /// A row in the table could not be mapped back into a `Todo`.
    #[error("stored todo {id} is invalid: {reason}")]
    CorruptRow { id: i64, reason: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, FromRow)]
struct TodoRow {
    id: i64,
    title: String,
    description: Option<String>,
    completed: bool,
    priority: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TodoRow> for Todo {
    type Error = StoreError;

    fn try_from(row: TodoRow) -> Result<Self, Self::Error> {
        let priority = row.priority.parse().map_err(|e| StoreError::CorruptRow {
            id: row.id,
            reason: format!("{e}"),
        })?;
        Ok(Todo {
            id: row.id,
            title: row.title,
            description: row.description,
            completed: row.completed,
            priority,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Handle to the todo table. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct TodoStore {
    pool: SqlitePool,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl TodoStore {
    /// Opens (creating if needed) the database at `database_url` and ensures
    /// the `todos` table exists.
    ///
    /// In-memory databases live only as long as their connection, so they get
    /// a single connection that is never recycled.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        Self::connect_with_clock(database_url, Arc::new(DefaultClock)).await
    }

    /// Like `connect`, with `clock` stamping `created_at` / `updated_at`.
    pub async fn connect_with_clock(
        database_url: &str,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        }
        .connect_with(options)
        .await?;
        Self::with_pool(pool, clock).await
    }

    /// A fresh, private in-memory store.
    pub async fn in_memory() -> StoreResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    pub async fn with_pool(
        pool: SqlitePool,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> StoreResult<Self> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool, clock })
    }

    /// Todos matching `filter` and, when non-blank, the case-insensitive
    /// `search` substring, most recently created first.
    pub async fn list(&self, filter: StatusFilter, search: Option<&str>) -> StoreResult<Vec<Todo>> {
        let completed = filter.completed();
        let rows: Vec<TodoRow> = sqlx::query_as(SELECT_TODOS)
            .bind(completed)
            .bind(completed)
            .fetch_all(&self.pool)
            .await?;

        let needle = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut todos = Vec::with_capacity(rows.len());
        for row in rows {
            let todo = Todo::try_from(row)?;
            if needle.as_deref().is_none_or(|n| todo.matches(n)) {
                todos.push(todo);
            }
        }
        Ok(todos)
    }

    pub async fn get(&self, id: i64) -> StoreResult<Todo> {
        let row: Option<TodoRow> = sqlx::query_as(SELECT_TODO)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.ok_or(StoreError::NotFound(id))?.try_into()
    }

    pub async fn create(&self, input: CreateTodo) -> StoreResult<Todo> {
        let new = input.validate()?;
        let now = self.clock.utc();
        let row: TodoRow = sqlx::query_as(INSERT_TODO)
            .bind(&new.title)
            .bind(&new.description)
            .bind(new.completed)
            .bind(new.priority.as_str())
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    /// Applies the fields present in `input` and refreshes `updated_at`, even
    /// when `input` is empty.
    pub async fn update(&self, id: i64, input: UpdateTodo) -> StoreResult<Todo> {
        let patch = input.validate()?;
        let (set_description, description) = match patch.description {
            Some(description) => (true, description),
            None => (false, None),
        };
        let row: Option<TodoRow> = sqlx::query_as(UPDATE_TODO)
            .bind(patch.title)
            .bind(set_description)
            .bind(description)
            .bind(patch.completed)
            .bind(patch.priority.map(|p| p.as_str()))
            .bind(self.clock.utc())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.ok_or(StoreError::NotFound(id))?.try_into()
    }

    pub async fn toggle(&self, id: i64) -> StoreResult<Todo> {
        let row: Option<TodoRow> = sqlx::query_as(TOGGLE_TODO)
            .bind(self.clock.utc())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.ok_or(StoreError::NotFound(id))?.try_into()
    }

    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query(DELETE_TODO).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    /// Deletes every todo whose id is in `ids` and returns how many rows went.
    /// Unknown ids are skipped.
    pub async fn bulk_delete(&self, ids: &[i64]) -> StoreResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM todos WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let deleted = builder.build().execute(&self.pool).await?.rows_affected();
        tracing::debug!(requested = ids.len(), deleted, "bulk delete");
        Ok(deleted)
    }

    /// Counts computed from the table on every call.
    pub async fn stats(&self) -> StoreResult<Stats> {
        let (total, completed, low, medium, high): (i64, i64, i64, i64, i64) =
            sqlx::query_as(SELECT_STATS).fetch_one(&self.pool).await?;
        Ok(Stats {
            total,
            completed,
            active: total - completed,
            by_priority: PriorityCounts { low, medium, high },
        })
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}
