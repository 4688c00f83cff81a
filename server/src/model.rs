//! Domain types for the todo service.
//!
//! # Design
//! Request payloads (`CreateTodo`, `UpdateTodo`, `BulkDelete`) deserialize from
//! any JSON object, so a field of the wrong type produces a field-level
//! validation message instead of an opaque JSON error. `validate` turns them
//! into `NewTodo` / `TodoPatch`, which the store accepts as already-checked
//! input.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

/// A single todo item as stored and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Case-insensitive substring match against title and description.
    /// `needle` must already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown priority: {0}")]
pub struct ParsePriorityError(pub String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(ParsePriorityError(other.to_string())),
        }
    }
}

/// Which todos `list` returns, by completion state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    /// The `completed` value rows must have, or `None` for no constraint.
    pub fn completed(self) -> Option<bool> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Active => Some(false),
            StatusFilter::Completed => Some(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status filter: {0}")]
pub struct ParseStatusFilterError(pub String);

impl FromStr for StatusFilter {
    type Err = ParseStatusFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "completed" => Ok(StatusFilter::Completed),
            other => Err(ParseStatusFilterError(other.to_string())),
        }
    }
}

/// Aggregate counts over the whole table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: i64,
    pub completed: i64,
    pub active: i64,
    pub by_priority: PriorityCounts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub low: i64,
    pub medium: i64,
    pub high: i64,
}

/// Field-level validation failures, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[serde(transparent)]
#[error("validation failed for: {}", field_list(.0))]
pub struct ValidationErrors(BTreeMap<String, String>);

fn field_list(errors: &BTreeMap<String, String>) -> String {
    errors.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Records a failure for `field`. The first message for a field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Request payload for creating a todo.
///
/// Deserializes from any JSON object. A field of the wrong JSON type is
/// recorded in `rejected` and reported by `validate` next to the other
/// field-level failures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct CreateTodo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub completed: Option<bool>,
    pub(crate) rejected: ValidationErrors,
}

impl From<Map<String, Value>> for CreateTodo {
    fn from(fields: Map<String, Value>) -> Self {
        let mut rejected = ValidationErrors::new();
        Self {
            title: optional_field(&fields, "title", TITLE_TYPE, &mut rejected),
            description: optional_field(&fields, "description", DESCRIPTION_TYPE, &mut rejected),
            priority: optional_field(&fields, "priority", PRIORITY_VALUES, &mut rejected),
            completed: optional_field(&fields, "completed", COMPLETED_TYPE, &mut rejected),
            rejected,
        }
    }
}

/// Request payload for a partial update. Omitted fields stay unchanged; an
/// explicit `"description": null` clears the description.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub priority: Option<String>,
    pub(crate) rejected: ValidationErrors,
}

impl From<Map<String, Value>> for UpdateTodo {
    fn from(fields: Map<String, Value>) -> Self {
        let mut rejected = ValidationErrors::new();
        Self {
            title: optional_field(&fields, "title", TITLE_TYPE, &mut rejected),
            description: typed_field(&fields, "description", DESCRIPTION_TYPE, &mut rejected),
            completed: optional_field(&fields, "completed", COMPLETED_TYPE, &mut rejected),
            priority: optional_field(&fields, "priority", PRIORITY_VALUES, &mut rejected),
            rejected,
        }
    }
}

/// Request body for bulk delete.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct BulkDelete {
    pub ids: Option<Vec<i64>>,
    rejected: ValidationErrors,
}

impl From<Map<String, Value>> for BulkDelete {
    fn from(fields: Map<String, Value>) -> Self {
        let mut rejected = ValidationErrors::new();
        Self {
            ids: optional_field(&fields, "ids", IDS_TYPE, &mut rejected),
            rejected,
        }
    }
}

impl BulkDelete {
    pub fn validate(self) -> Result<Vec<i64>, ValidationErrors> {
        let mut errors = self.rejected;
        match self.ids {
            Some(ids) if errors.is_empty() => Ok(ids),
            _ => {
                errors.add("ids", "ids is required");
                Err(errors)
            }
        }
    }
}

const TITLE_TYPE: &str = "Title must be a string";
const DESCRIPTION_TYPE: &str = "Description must be a string";
const COMPLETED_TYPE: &str = "Completed must be a boolean";
const PRIORITY_VALUES: &str = "Priority must be one of: low, medium, high";
const IDS_TYPE: &str = "ids must be an array of integers";

/// Reads `name` from `fields` as a `T`. Absent fields are `None`; a value of
/// the wrong type is recorded under `name` and also read as `None`.
fn typed_field<T: DeserializeOwned>(
    fields: &Map<String, Value>,
    name: &str,
    message: &str,
    rejected: &mut ValidationErrors,
) -> Option<T> {
    let value = fields.get(name)?;
    T::deserialize(value)
        .map_err(|_| rejected.add(name, message))
        .ok()
}

/// Like `typed_field`, with an explicit `null` read the same as an absent field.
fn optional_field<T: DeserializeOwned>(
    fields: &Map<String, Value>,
    name: &str,
    message: &str,
    rejected: &mut ValidationErrors,
) -> Option<T> {
    typed_field::<Option<T>>(fields, name, message, rejected).flatten()
}

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub completed: bool,
}

/// An update request that passed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
}

impl CreateTodo {
    pub fn validate(self) -> Result<NewTodo, ValidationErrors> {
        let mut errors = self.rejected;

        let title = match self.title.as_deref() {
            Some(raw) => check_title(raw, &mut errors),
            None => {
                errors.add("title", "Title is required");
                None
            }
        };
        let description = check_description(self.description, &mut errors);
        let priority = match self.priority.as_deref() {
            Some(raw) => check_priority(raw, &mut errors),
            None => Some(Priority::default()),
        };

        match (title, priority) {
            (Some(title), Some(priority)) if errors.is_empty() => Ok(NewTodo {
                title,
                description,
                priority,
                completed: self.completed.unwrap_or(false),
            }),
            _ => Err(errors),
        }
    }
}

impl UpdateTodo {
    pub fn validate(self) -> Result<TodoPatch, ValidationErrors> {
        let mut errors = self.rejected;

        let title = self
            .title
            .as_deref()
            .and_then(|raw| check_title(raw, &mut errors));
        let description = self
            .description
            .map(|value| check_description(value, &mut errors));
        let priority = self
            .priority
            .as_deref()
            .and_then(|raw| check_priority(raw, &mut errors));

        errors.into_result(TodoPatch {
            title,
            description,
            completed: self.completed,
            priority,
        })
    }
}

fn check_title(raw: &str, errors: &mut ValidationErrors) -> Option<String> {
    let title = raw.trim();
    if title.is_empty() {
        errors.add("title", "Title is required");
        return None;
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        errors.add(
            "title",
            format!("Title must be at most {TITLE_MAX_CHARS} characters"),
        );
        return None;
    }
    Some(title.to_string())
}

/// Blank descriptions are stored as absent.
fn check_description(raw: Option<String>, errors: &mut ValidationErrors) -> Option<String> {
    let description = raw.filter(|d| !d.trim().is_empty())?;
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        errors.add(
            "description",
            format!("Description must be at most {DESCRIPTION_MAX_CHARS} characters"),
        );
        return None;
    }
    Some(description)
}

fn check_priority(raw: &str, errors: &mut ValidationErrors) -> Option<Priority> {
    match raw.parse() {
        Ok(priority) => Some(priority),
        Err(_) => {
            errors.add("priority", PRIORITY_VALUES);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn create(title: Option<&str>) -> CreateTodo {
        CreateTodo {
            title: title.map(str::to_string),
            ..CreateTodo::default()
        }
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("   "))]
    fn create_rejects_missing_or_blank_title(#[case] title: Option<&str>) {
        let errors = create(title).validate().unwrap_err();
        assert_eq!(errors.get("title"), Some("Title is required"));
    }

    #[test]
    fn create_rejects_overlong_title() {
        let errors = create(Some(&"x".repeat(TITLE_MAX_CHARS + 1)))
            .validate()
            .unwrap_err();
        assert!(errors.get("title").is_some());
    }

    #[test]
    fn title_length_counts_characters_not_bytes() {
        let title = "é".repeat(TITLE_MAX_CHARS);
        let new = create(Some(&title)).validate().unwrap();
        assert_eq!(new.title.chars().count(), TITLE_MAX_CHARS);
    }

    #[test]
    fn create_applies_defaults() {
        let new = create(Some("  Buy milk ")).validate().unwrap();
        assert_eq!(new.title, "Buy milk");
        assert_eq!(new.priority, Priority::Medium);
        assert!(!new.completed);
        assert!(new.description.is_none());
    }

    #[test]
    fn create_reports_every_bad_field() {
        let input = CreateTodo {
            title: Some(String::new()),
            description: Some("d".repeat(DESCRIPTION_MAX_CHARS + 1)),
            priority: Some("urgent".to_string()),
            ..CreateTodo::default()
        };
        let errors = input.validate().unwrap_err();
        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(fields, vec!["description", "priority", "title"]);
    }

    #[test]
    fn blank_description_is_dropped() {
        let input = CreateTodo {
            title: Some("t".to_string()),
            description: Some("  ".to_string()),
            ..CreateTodo::default()
        };
        assert!(input.validate().unwrap().description.is_none());
    }

    #[test]
    fn update_distinguishes_null_from_absent_description() {
        let absent: UpdateTodo = serde_json::from_str(r#"{"priority":"high"}"#).unwrap();
        assert!(absent.description.is_none());

        let cleared: UpdateTodo = serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));
        assert_eq!(cleared.validate().unwrap().description, Some(None));
    }

    #[test]
    fn update_revalidates_changed_fields_only() {
        let patch: UpdateTodo = serde_json::from_str(r#"{"completed":true}"#).unwrap();
        assert_eq!(
            patch.validate().unwrap(),
            TodoPatch {
                completed: Some(true),
                ..TodoPatch::default()
            }
        );

        let bad: UpdateTodo = serde_json::from_str(r#"{"title":"","priority":"nope"}"#).unwrap();
        let errors = bad.validate().unwrap_err();
        assert!(errors.get("title").is_some());
        assert!(errors.get("priority").is_some());
    }

    #[rstest]
    #[case(r#"{"title":5}"#, "title", "Title must be a string")]
    #[case(r#"{"title":"x","completed":"yes"}"#, "completed", "Completed must be a boolean")]
    #[case(r#"{"title":"x","description":7}"#, "description", "Description must be a string")]
    #[case(r#"{"title":"x","priority":3}"#, "priority", PRIORITY_VALUES)]
    fn create_reports_wrong_json_types_per_field(
        #[case] body: &str,
        #[case] field: &str,
        #[case] message: &str,
    ) {
        let input: CreateTodo = serde_json::from_str(body).unwrap();
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.get(field), Some(message));
        assert_eq!(errors.fields().count(), 1);
    }

    #[test]
    fn wrong_types_are_reported_with_other_failures() {
        let input: CreateTodo =
            serde_json::from_str(r#"{"title":["a"],"priority":"urgent","completed":1}"#).unwrap();
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.get("title"), Some("Title must be a string"));
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["completed", "priority", "title"]);
    }

    #[test]
    fn update_reports_wrong_json_types() {
        let patch: UpdateTodo = serde_json::from_str(r#"{"description":false}"#).unwrap();
        assert_eq!(patch.description, None);
        let errors = patch.validate().unwrap_err();
        assert_eq!(errors.get("description"), Some("Description must be a string"));
    }

    #[test]
    fn non_object_payloads_do_not_deserialize() {
        assert!(serde_json::from_str::<CreateTodo>("[]").is_err());
        assert!(serde_json::from_str::<UpdateTodo>("\"title\"").is_err());
    }

    #[rstest]
    #[case(r#"{}"#, "ids is required")]
    #[case(r#"{"ids":null}"#, "ids is required")]
    #[case(r#"{"ids":"1,2"}"#, "ids must be an array of integers")]
    #[case(r#"{"ids":[1,"2"]}"#, "ids must be an array of integers")]
    fn bulk_delete_requires_integer_ids(#[case] body: &str, #[case] message: &str) {
        let request: BulkDelete = serde_json::from_str(body).unwrap();
        assert_eq!(request.validate().unwrap_err().get("ids"), Some(message));
    }

    #[test]
    fn bulk_delete_accepts_empty_ids() {
        let request: BulkDelete = serde_json::from_str(r#"{"ids":[]}"#).unwrap();
        assert_eq!(request.validate().unwrap(), Vec::<i64>::new());
    }

    #[rstest]
    #[case("", StatusFilter::All)]
    #[case("all", StatusFilter::All)]
    #[case("active", StatusFilter::Active)]
    #[case("completed", StatusFilter::Completed)]
    fn status_filter_parses(#[case] raw: &str, #[case] expected: StatusFilter) {
        assert_eq!(raw.parse::<StatusFilter>().unwrap(), expected);
    }

    #[test]
    fn status_filter_rejects_unknown() {
        assert!("done".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn priority_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Priority::High).unwrap(), "high");
        assert_eq!("low".parse::<Priority>().unwrap(), Priority::Low);
        assert!("HIGH".parse::<Priority>().is_err());
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_description() {
        let now = Utc::now();
        let todo = Todo {
            id: 1,
            title: "Buy Milk".to_string(),
            description: Some("From the CORNER shop".to_string()),
            completed: false,
            priority: Priority::Low,
            created_at: now,
            updated_at: now,
        };
        assert!(todo.matches("milk"));
        assert!(todo.matches("corner"));
        assert!(!todo.matches("bread"));
    }

    #[test]
    fn validation_errors_serialize_as_flat_map() {
        let errors = ValidationErrors::single("title", "Title is required");
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({"title": "Title is required"})
        );
    }
}
