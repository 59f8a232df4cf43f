//! Request bodies for `POST /todos` and `PUT /todos/<id>`.
//!
//! A body is read as raw JSON and checked against the field whitelist before
//! anything is typed, so that "field absent" and "field present but blank"
//! stay distinguishable all the way into the store.

use std::borrow::Cow;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use rocket::data::{self, Data, FromData, Limits};
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::Request;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::models::{NewTodo, TodoChanges};

pub const ALLOWED_FIELDS: [&str; 4] = ["title", "description", "completed", "deadline_at"];

const MISSING_BODY: &str = "Request body is missing";
const TITLE_REQUIRED: &str = "Title is required";
const INVALID_DEADLINE: &str = "Invalid datetime format for 'deadline_at'";

/// Whitelisted fields of a todo body, each `None` when absent.
///
/// `deadline_at` is kept as raw JSON until the body is turned into an insert
/// or a changeset, so that title errors are reported ahead of datetime ones.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TodoPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub deadline_at: Option<Value>,
}

impl TodoPayload {
    pub fn from_json(body: &str) -> Result<Self, ApiError> {
        if body.trim().is_empty() {
            return Err(ApiError::validation(MISSING_BODY));
        }

        let value: Value = serde_json::from_str(body)
            .map_err(|_| ApiError::validation("Request body is not valid JSON"))?;

        if is_falsy(&value) {
            return Err(ApiError::validation(MISSING_BODY));
        }

        match value {
            Value::Object(map) => Self::from_map(map),
            _ => Err(ApiError::validation("Request body must be a JSON object")),
        }
    }

    fn from_map(mut map: Map<String, Value>) -> Result<Self, ApiError> {
        let extra: Vec<&String> = map
            .keys()
            .filter(|key| !ALLOWED_FIELDS.contains(&key.as_str()))
            .collect();
        if !extra.is_empty() {
            let names: Vec<String> = extra.iter().map(|key| format!("'{key}'")).collect();
            return Err(ApiError::Validation(format!(
                "Unexpected fields provided: [{}]",
                names.join(", ")
            )));
        }

        let title = match map.remove("title") {
            None => None,
            Some(Value::String(title)) => Some(title),
            Some(_) => return Err(ApiError::validation("Field 'title' must be a string")),
        };
        let description = match map.remove("description") {
            None => None,
            Some(Value::String(description)) => Some(description),
            Some(_) => return Err(ApiError::validation("Field 'description' must be a string")),
        };
        let completed = match map.remove("completed") {
            None => None,
            Some(Value::Bool(completed)) => Some(completed),
            Some(_) => return Err(ApiError::validation("Field 'completed' must be a boolean")),
        };

        Ok(TodoPayload {
            title,
            description,
            completed,
            deadline_at: map.remove("deadline_at"),
        })
    }

    /// Validates the body for creation and fills in defaults.
    pub fn into_new_todo(self, now: NaiveDateTime) -> Result<NewTodo, ApiError> {
        let title = match self.title {
            Some(title) if !title.trim().is_empty() => title,
            _ => return Err(ApiError::validation(TITLE_REQUIRED)),
        };
        let deadline_at = match self.deadline_at {
            Some(raw) => deadline_from_json(&raw)?,
            None => None,
        };

        Ok(NewTodo {
            title,
            description: self.description.unwrap_or_default(),
            completed: self.completed.unwrap_or(false),
            deadline_at,
            created_at: now,
            updated_at: now,
        })
    }

    /// Builds a changeset touching only the provided fields. A blank title is
    /// dropped rather than rejected, and `updated_at` only moves when some
    /// other column does.
    pub fn into_changes(self, now: NaiveDateTime) -> Result<TodoChanges, ApiError> {
        let deadline_at = match self.deadline_at {
            Some(raw) => Some(deadline_from_json(&raw)?),
            None => None,
        };

        let mut changes = TodoChanges {
            title: self.title.filter(|title| !title.trim().is_empty()),
            description: self.description,
            completed: self.completed,
            deadline_at,
            updated_at: None,
        };
        if !changes.is_empty() {
            changes.updated_at = Some(now);
        }
        Ok(changes)
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn deadline_from_json(raw: &Value) -> Result<Option<NaiveDateTime>, ApiError> {
    match raw {
        Value::Null => Ok(None),
        Value::String(s) => parse_datetime(s)
            .map(Some)
            .ok_or_else(|| ApiError::validation(INVALID_DEADLINE)),
        _ => Err(ApiError::validation(INVALID_DEADLINE)),
    }
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// Parses an ISO-8601 date or datetime into server-local wall-clock time, the
/// same clock `created_at`, `updated_at` and the list window use.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    parse_datetime_in(s, &Local)
}

/// Like [`parse_datetime`], with offsets converted into `tz`. Inputs without
/// an offset are taken as already in `tz`; a bare date means midnight.
pub fn parse_datetime_in<Tz: TimeZone>(s: &str, tz: &Tz) -> Option<NaiveDateTime> {
    let s = with_minutes(s);

    let with_offset = DateTime::parse_from_rfc3339(&s).ok().or_else(|| {
        OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(&s, fmt).ok())
    });
    if let Some(dt) = with_offset {
        return Some(dt.with_timezone(tz).naive_local());
    }

    if let Some(dt) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&s, fmt).ok())
    {
        return Some(dt);
    }
    NaiveDate::parse_from_str(&s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// `2023-02-27T10` -> `2023-02-27T10:00`; chrono needs the minute.
fn with_minutes(s: &str) -> Cow<'_, str> {
    if s.len() == 13 && matches!(s.as_bytes()[10], b'T' | b' ') {
        Cow::Owned(format!("{s}:00"))
    } else {
        Cow::Borrowed(s)
    }
}

#[rocket::async_trait]
impl<'r> FromData<'r> for TodoPayload {
    type Error = ApiError;

    async fn from_data(req: &'r Request<'_>, data: Data<'r>) -> data::Outcome<'r, Self> {
        let limit = req.limits().get("json").unwrap_or(Limits::JSON);
        let body = match data.open(limit).into_string().await {
            Ok(body) if body.is_complete() => body.into_inner(),
            Ok(_) => return Outcome::Error((Status::PayloadTooLarge, ApiError::PayloadTooLarge)),
            Err(e) => {
                tracing::debug!(error = %e, "failed to read request body");
                return Outcome::Error((
                    Status::BadRequest,
                    ApiError::validation(MISSING_BODY),
                ));
            }
        };

        match TodoPayload::from_json(&body) {
            Ok(payload) => Outcome::Success(payload),
            Err(e) => {
                tracing::debug!(reason = %e, "rejected todo body");
                Outcome::Error((e.status(), e))
            }
        }
    }
}
