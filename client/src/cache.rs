//! Client-local copy of the todo list.
//!
//! The cache only ever reflects what the server has confirmed: callers feed it
//! parsed responses, never their own guesses.

use crate::types::{StatusFilter, Todo};

/// Counts shown alongside the list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheCounts {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

/// Todos held by the client, newest first, plus the selected filter.
#[derive(Debug, Clone, Default)]
pub struct TodoCache {
    todos: Vec<Todo>,
    filter: StatusFilter,
}

impl TodoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn get(&self, id: i64) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    /// Todos admitted by the selected filter, in cache order.
    pub fn visible(&self) -> impl Iterator<Item = &Todo> {
        let filter = self.filter;
        self.todos.iter().filter(move |t| filter.admits(t))
    }

    pub fn replace_all(&mut self, todos: Vec<Todo>) {
        self.todos = todos;
    }

    /// Puts a freshly created todo at the front. A stale copy with the same id
    /// is dropped first.
    pub fn prepend(&mut self, todo: Todo) {
        self.todos.retain(|t| t.id != todo.id);
        self.todos.insert(0, todo);
    }

    /// Replaces the cached copy in place. Returns `false` when the id is not
    /// cached, in which case nothing changes.
    pub fn replace(&mut self, todo: Todo) -> bool {
        match self.todos.iter_mut().find(|t| t.id == todo.id) {
            Some(slot) => {
                *slot = todo;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.todos.len();
        self.todos.retain(|t| t.id != id);
        self.todos.len() != before
    }

    /// Removes every cached todo whose id is in `ids`; returns how many went.
    pub fn remove_many(&mut self, ids: &[i64]) -> usize {
        let before = self.todos.len();
        self.todos.retain(|t| !ids.contains(&t.id));
        before - self.todos.len()
    }

    pub fn counts(&self) -> CacheCounts {
        let completed = self.todos.iter().filter(|t| t.completed).count();
        CacheCounts {
            total: self.todos.len(),
            active: self.todos.len() - completed,
            completed,
        }
    }
}
