use chrono::NaiveDateTime;
use diesel::{AsChangeset, Insertable, Queryable, Selectable};
use serde::Serialize;

use crate::schema::todos;

/// A stored todo. Serializes with the fixed public field set, timestamps as
/// ISO-8601 strings without an offset.
#[derive(Serialize, Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = todos)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Todo {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub deadline_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = todos)]
pub struct NewTodo {
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub deadline_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Partial update. `None` leaves a column untouched; `deadline_at` is doubly
/// optional so an explicit null can clear it.
#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = todos)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub deadline_at: Option<Option<NaiveDateTime>>,
    pub updated_at: Option<NaiveDateTime>,
}

impl TodoChanges {
    /// True when no column would be written. Diesel refuses such a changeset.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.deadline_at.is_none()
            && self.updated_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_the_fixed_field_set() {
        let at = NaiveDate::from_ymd_opt(2023, 2, 20)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let todo = Todo {
            id: 1,
            title: "Watch CSSE6400 Lecture".into(),
            description: "Watch the lecture for week 1".into(),
            completed: true,
            deadline_at: Some(at + chrono::Duration::days(7)),
            created_at: at,
            updated_at: at,
        };

        assert_eq!(
            serde_json::to_value(&todo).unwrap(),
            json!({
                "id": 1,
                "title": "Watch CSSE6400 Lecture",
                "description": "Watch the lecture for week 1",
                "completed": true,
                "deadline_at": "2023-02-27T00:00:00",
                "created_at": "2023-02-20T00:00:00",
                "updated_at": "2023-02-20T00:00:00",
            })
        );
    }

    #[test]
    fn missing_deadline_serializes_as_null() {
        let at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        let todo = Todo {
            id: 2,
            title: "t".into(),
            description: String::new(),
            completed: false,
            deadline_at: None,
            created_at: at,
            updated_at: at,
        };

        let value = serde_json::to_value(&todo).unwrap();
        assert_eq!(value["deadline_at"], serde_json::Value::Null);
        assert_eq!(value["created_at"], "2024-01-01T12:30:00");
    }
}
