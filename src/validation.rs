//! Pre-write validation of client documents.
//!
//! Request bodies arrive as loose JSON objects. The functions here decode
//! them into typed records, collecting every field problem into one
//! [`ValidationError`] rather than stopping at the first. Reference fields
//! are checked through a [`RecordLookup`] so the same rules run against the
//! SQLite store in production and a stub in tests.
//!
//! Unknown fields are dropped. An absent, `null` or empty-string reference
//! is treated as unset.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::model::{Collection, DButton, DoneEvent, Frequency, RecordId, Task, User};
use crate::store::{RecordLookup, StoreError};

/// Category of a single field failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldErrorKind {
    /// Missing or blank.
    Required,
    /// Wrong JSON type or unparsable value.
    Cast,
    /// Well-typed but out of range.
    Invalid,
    /// Points at a record that does not exist.
    Reference,
}

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub path: String,
    pub kind: FieldErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// A rejected write, keyed by field path.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{model} validation failed")]
pub struct ValidationError {
    pub model: &'static str,
    pub errors: BTreeMap<String, FieldError>,
}

impl ValidationError {
    /// Error with a single field failure.
    pub fn single(
        collection: Collection,
        path: &str,
        kind: FieldErrorKind,
        message: impl Into<String>,
        value: Option<Value>,
    ) -> Self {
        let mut collector = Collector::new(collection);
        collector.push(path, kind, message, value);
        Self {
            model: collection.model_name(),
            errors: collector.errors,
        }
    }

    /// Failure recorded for `path`, if any.
    #[must_use]
    pub fn field(&self, path: &str) -> Option<&FieldError> {
        self.errors.get(path)
    }

    /// Response body in the wire error format.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "name": "ValidationError",
            "message": self.to_string(),
            "errors": self.errors,
        })
    }
}

/// Failure while preparing a write: either the client's fault or the store's.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A done event that passed field validation but has not yet been bound to
/// its task.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDoneEvent {
    pub id: RecordId,
    pub task_id: RecordId,
    pub d_button_id: Option<RecordId>,
}

struct Collector {
    collection: Collection,
    errors: BTreeMap<String, FieldError>,
}

impl Collector {
    fn new(collection: Collection) -> Self {
        Self {
            collection,
            errors: BTreeMap::new(),
        }
    }

    fn push(
        &mut self,
        path: &str,
        kind: FieldErrorKind,
        message: impl Into<String>,
        value: Option<Value>,
    ) {
        self.errors.entry(path.to_owned()).or_insert(FieldError {
            path: path.to_owned(),
            kind,
            message: message.into(),
            value,
        });
    }

    fn required(&mut self, path: &str) {
        self.push(
            path,
            FieldErrorKind::Required,
            format!("Path `{path}` is required."),
            None,
        );
    }

    fn cast(&mut self, path: &str, ty: &str, value: &Value) {
        self.push(
            path,
            FieldErrorKind::Cast,
            format!("Cast to {ty} failed for value {value} at path \"{path}\""),
            Some(value.clone()),
        );
    }

    fn finish<T>(self, doc: Option<T>) -> Result<T, ValidationError> {
        match doc {
            Some(doc) if self.errors.is_empty() => Ok(doc),
            _ => Err(ValidationError {
                model: self.collection.model_name(),
                errors: self.errors,
            }),
        }
    }

    async fn check_reference(
        &mut self,
        lookup: &dyn RecordLookup,
        path: &str,
        target: Collection,
        id: &RecordId,
    ) {
        let found = match lookup.exists(target, id).await {
            Ok(found) => found,
            Err(e) => {
                warn!(path, %id, error = %e, "reference lookup failed");
                false
            }
        };
        if !found {
            self.push(
                path,
                FieldErrorKind::Reference,
                format!("Validator failed for path `{path}` with value `{id}`"),
                Some(Value::String(id.to_string())),
            );
        }
    }
}

/// Remove a client-supplied `_id` from a request body.
pub fn strip_id(body: &mut Map<String, Value>) {
    body.remove("_id");
}

/// Deep-merge `patch` into `target`.
///
/// Objects merge key by key; any other value, arrays included, replaces
/// what was there.
pub fn merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

/// Decode a task body.
pub fn validate_task(id: RecordId, body: &Map<String, Value>) -> Result<Task, ValidationError> {
    let mut c = Collector::new(Collection::Tasks);
    let name = required_text(&mut c, body, "name");

    let frequencies = match body.get("frequencies") {
        None | Some(Value::Null) => {
            c.required("frequencies");
            None
        }
        Some(Value::Array(items)) if items.is_empty() => {
            c.required("frequencies");
            None
        }
        Some(Value::Array(items)) => {
            let decoded: Vec<Option<Frequency>> = items
                .iter()
                .enumerate()
                .map(|(i, item)| decode_frequency(&mut c, &format!("frequencies.{i}"), item))
                .collect();
            decoded.into_iter().collect::<Option<Vec<_>>>()
        }
        Some(other) => {
            c.cast("frequencies", "Array", other);
            None
        }
    };

    let task = match (name, frequencies) {
        (Some(name), Some(frequencies)) => Some(Task {
            id,
            name,
            frequencies,
        }),
        _ => None,
    };
    c.finish(task)
}

fn decode_frequency(c: &mut Collector, prefix: &str, item: &Value) -> Option<Frequency> {
    let Value::Object(fields) = item else {
        c.cast(prefix, "Embedded", item);
        return None;
    };

    let id_path = format!("{prefix}._id");
    let id = match fields.get("_id") {
        None | Some(Value::Null) => Some(RecordId::generate()),
        Some(Value::String(s)) if s.is_empty() => Some(RecordId::generate()),
        Some(value) => decode_id(c, &id_path, value),
    };

    let start_dt = match optional_date(c, fields, prefix, "startDT") {
        Ok(dt) => Some(dt.unwrap_or_else(Utc::now)),
        Err(()) => None,
    };
    let end_dt = optional_date(c, fields, prefix, "endDT");
    let anchor_dt = optional_date(c, fields, prefix, "anchorDT");

    let period_path = format!("{prefix}.period");
    let period = match fields.get("period") {
        None | Some(Value::Null) => {
            c.required(&period_path);
            None
        }
        Some(value) => match as_number(value) {
            Some(p) if p.is_finite() && p > 0.0 => Some(p),
            Some(_) => {
                c.push(
                    &period_path,
                    FieldErrorKind::Invalid,
                    format!("Path `{period_path}` must be a positive number of milliseconds."),
                    Some(value.clone()),
                );
                None
            }
            None => {
                c.cast(&period_path, "Number", value);
                None
            }
        },
    };

    Some(Frequency {
        id: id?,
        start_dt: start_dt?,
        end_dt: end_dt.ok()?,
        anchor_dt: anchor_dt.ok()?,
        period: period?,
    })
}

/// Decode a button body and check that its references exist.
pub async fn validate_dbutton(
    id: RecordId,
    body: &Map<String, Value>,
    lookup: &dyn RecordLookup,
) -> Result<DButton, ValidationError> {
    let mut c = Collector::new(Collection::DButtons);
    let user_id = optional_id(&mut c, body, "userId");
    let task_id = optional_id(&mut c, body, "taskId");

    if let Ok(Some(user)) = &user_id {
        c.check_reference(lookup, "userId", Collection::Users, user).await;
    }
    if let Ok(Some(task)) = &task_id {
        c.check_reference(lookup, "taskId", Collection::Tasks, task).await;
    }

    let button = match (user_id, task_id) {
        (Ok(user_id), Ok(task_id)) => Some(DButton {
            id,
            user_id,
            task_id,
        }),
        _ => None,
    };
    c.finish(button)
}

/// Decode a done event body and check its button reference.
///
/// `taskName` and `time` from the client are ignored; they are filled in by
/// [`resolve_done_event`].
pub async fn validate_done_event(
    id: RecordId,
    body: &Map<String, Value>,
    lookup: &dyn RecordLookup,
) -> Result<PendingDoneEvent, ValidationError> {
    let mut c = Collector::new(Collection::DoneEvents);

    let task_id = match optional_id(&mut c, body, "taskId") {
        Ok(Some(task_id)) => Some(task_id),
        Ok(None) => {
            c.required("taskId");
            None
        }
        Err(()) => None,
    };
    let d_button_id = optional_id(&mut c, body, "dButtonId");
    if let Ok(Some(button)) = &d_button_id {
        c.check_reference(lookup, "dButtonId", Collection::DButtons, button)
            .await;
    }

    let pending = match (task_id, d_button_id) {
        (Some(task_id), Ok(d_button_id)) => Some(PendingDoneEvent {
            id,
            task_id,
            d_button_id,
        }),
        _ => None,
    };
    c.finish(pending)
}

/// Bind a validated done event to its task: snapshot the task's name and
/// stamp the server time.
pub async fn resolve_done_event(
    pending: PendingDoneEvent,
    lookup: &dyn RecordLookup,
) -> Result<DoneEvent, WriteError> {
    let Some(task) = lookup.fetch_task(&pending.task_id).await? else {
        return Err(ValidationError::single(
            Collection::DoneEvents,
            "taskId",
            FieldErrorKind::Reference,
            "Referenced task id not found",
            Some(Value::String(pending.task_id.to_string())),
        )
        .into());
    };

    Ok(DoneEvent {
        id: pending.id,
        task_id: pending.task_id,
        task_name: task.name,
        d_button_id: pending.d_button_id,
        time: Utc::now(),
    })
}

/// Decode a user body.
pub fn validate_user(id: RecordId, body: &Map<String, Value>) -> Result<User, ValidationError> {
    let mut c = Collector::new(Collection::Users);
    let email = required_text(&mut c, body, "email");
    let name = match body.get("name") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => {
            c.cast("name", "String", other);
            Err(())
        }
    };

    let user = match (email, name) {
        (Some(email), Ok(name)) => Some(User { id, email, name }),
        _ => None,
    };
    c.finish(user)
}

fn required_text(c: &mut Collector, body: &Map<String, Value>, path: &str) -> Option<String> {
    match body.get(path) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        None | Some(Value::Null) | Some(Value::String(_)) => {
            c.required(path);
            None
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => {
            c.cast(path, "String", other);
            None
        }
    }
}

fn decode_id(c: &mut Collector, path: &str, value: &Value) -> Option<RecordId> {
    match value.as_str().map(RecordId::parse) {
        Some(Ok(id)) => Some(id),
        _ => {
            c.cast(path, "ObjectId", value);
            None
        }
    }
}

/// `Ok(None)` when unset, `Err(())` when a cast error was recorded.
fn optional_id(
    c: &mut Collector,
    body: &Map<String, Value>,
    path: &str,
) -> Result<Option<RecordId>, ()> {
    match body.get(path) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(value) => decode_id(c, path, value).map(Some).ok_or(()),
    }
}

fn optional_date(
    c: &mut Collector,
    fields: &Map<String, Value>,
    prefix: &str,
    key: &str,
) -> Result<Option<DateTime<Utc>>, ()> {
    let path = format!("{prefix}.{key}");
    let parsed = match fields.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|ms| ms.is_finite())
            .and_then(|ms| DateTime::from_timestamp_millis(ms as i64)),
        Some(_) => None,
    };
    match parsed {
        Some(dt) => Ok(Some(dt)),
        None => {
            if let Some(value) = fields.get(key) {
                c.cast(&path, "Date", value);
            }
            Err(())
        }
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
