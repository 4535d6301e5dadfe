//! Request payload validation.
//!
//! Payloads arrive as loosely-typed JSON. [`TaskPayload`] records which keys
//! were present and normalises their values; [`validate_create`] and
//! [`validate_update`] turn it into typed input or a [`ValidationErrors`]
//! listing every failing field. Nothing here touches HTTP or the store.

use crate::types::{NewTask, TaskChanges, TaskStatus};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// Maximum title length, in characters.
pub const TITLE_MAX_CHARS: usize = 255;

/// Field-keyed validation messages, in the order the fields were checked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    fields: Vec<(String, Vec<String>)>,
}

impl ValidationErrors {
    /// Record a message against a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.fields.push((field.to_string(), vec![message])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields with at least one message.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn first_message(&self) -> Option<&str> {
        self.fields
            .first()
            .and_then(|(_, messages)| messages.first())
            .map(String::as_str)
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, messages) in &self.fields {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

/// Raw task fields taken from a request body.
///
/// `None` means the key was absent; `Some(Value::Null)` means it was sent as
/// null (or as a blank string). String values are already trimmed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPayload {
    pub title: Option<Value>,
    pub description: Option<Value>,
    pub status: Option<Value>,
    pub due_date: Option<Value>,
}

impl TaskPayload {
    /// Build from a parsed JSON body. Anything other than an object yields an
    /// empty payload.
    pub fn from_json(body: &Value) -> Self {
        let field = |key: &str| body.as_object().and_then(|o| o.get(key)).map(normalize);
        Self {
            title: field("title"),
            description: field("description"),
            status: field("status"),
            due_date: field("due_date"),
        }
    }

    /// Parse a raw request body. An empty body is an empty payload.
    pub fn from_slice(body: &[u8]) -> Result<Self, ValidationErrors> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => Ok(Self::from_json(&value)),
            Err(_) => {
                let mut errors = ValidationErrors::default();
                errors.add("body", "The request body must be valid JSON.");
                Err(errors)
            }
        }
    }
}

/// Trim strings and turn blank strings into null.
fn normalize(value: &Value) -> Value {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Value::Null
            } else {
                Value::String(trimmed.to_string())
            }
        }
        other => other.clone(),
    }
}

fn attribute(field: &str) -> String {
    field.replace('_', " ")
}

fn required_message(field: &str) -> String {
    format!("The {} field is required.", attribute(field))
}

/// `required|string|max:255`
fn check_title(field: &str, value: Option<&Value>) -> Result<String, String> {
    match value {
        None | Some(Value::Null) => Err(required_message(field)),
        Some(Value::String(s)) if s.chars().count() > TITLE_MAX_CHARS => Err(format!(
            "The {} field must not be greater than {} characters.",
            attribute(field),
            TITLE_MAX_CHARS
        )),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(format!("The {} field must be a string.", attribute(field))),
    }
}

/// `nullable|string`
fn check_nullable_string(field: &str, value: &Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        _ => Err(format!("The {} field must be a string.", attribute(field))),
    }
}

/// `in:pending,in_progress,completed`
fn check_status(field: &str, value: &Value) -> Result<TaskStatus, String> {
    value
        .as_str()
        .and_then(TaskStatus::parse)
        .ok_or_else(|| format!("The selected {} is invalid.", attribute(field)))
}

/// `nullable|date`
fn check_nullable_date(field: &str, value: &Value) -> Result<Option<NaiveDate>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => parse_date(s)
            .map(Some)
            .ok_or_else(|| format!("The {} field must be a valid date.", attribute(field))),
        _ => Err(format!("The {} field must be a valid date.", attribute(field))),
    }
}

/// Parse a calendar date from `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or RFC 3339.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(datetime.date());
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|datetime| datetime.date_naive())
}

/// Collect the outcome of a field check, recording failures.
fn collect<T>(errors: &mut ValidationErrors, field: &str, result: Result<T, String>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(message) => {
            errors.add(field, message);
            None
        }
    }
}

/// Validate a payload for task creation.
///
/// `title` is required. `status` may be omitted, in which case the store
/// default applies.
pub fn validate_create(payload: &TaskPayload) -> Result<NewTask, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let title = collect(&mut errors, "title", check_title("title", payload.title.as_ref()));

    let description = match &payload.description {
        Some(value) => collect(
            &mut errors,
            "description",
            check_nullable_string("description", value),
        )
        .flatten(),
        None => None,
    };

    let status = match &payload.status {
        None | Some(Value::Null) => None,
        Some(value) => collect(&mut errors, "status", check_status("status", value)),
    };

    let due_date = match &payload.due_date {
        Some(value) => collect(
            &mut errors,
            "due_date",
            check_nullable_date("due_date", value),
        )
        .flatten(),
        None => None,
    };

    let task = NewTask {
        title: title.unwrap_or_default(),
        description,
        status,
        due_date,
    };
    errors.into_result(task)
}

/// Validate a payload for a partial update.
///
/// Absent keys are skipped. `title` and `status`, when present, must carry a
/// valid non-null value; `description` and `due_date` may be nulled.
pub fn validate_update(payload: &TaskPayload) -> Result<TaskChanges, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let mut changes = TaskChanges::default();

    if let Some(value) = &payload.title {
        changes.title = collect(&mut errors, "title", check_title("title", Some(value)));
    }

    if let Some(value) = &payload.description {
        changes.description = collect(
            &mut errors,
            "description",
            check_nullable_string("description", value),
        );
    }

    match &payload.status {
        None => {}
        Some(Value::Null) => errors.add("status", required_message("status")),
        Some(value) => {
            changes.status = collect(&mut errors, "status", check_status("status", value));
        }
    }

    if let Some(value) = &payload.due_date {
        changes.due_date = collect(
            &mut errors,
            "due_date",
            check_nullable_date("due_date", value),
        );
    }

    errors.into_result(changes)
}
