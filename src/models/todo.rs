use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::Attachment;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: i64,
    pub day_title: Option<String>,
    pub task_number: i32,
    pub task_description: Option<String>,
    pub task_title: Option<String>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

/// A todo with its attachment rows nested in, as served by GET /todos.
#[derive(Debug, Clone, Serialize)]
pub struct TodoWithAttachments {
    #[serde(flatten)]
    pub todo: Todo,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTodoRequest {
    pub day_title: Option<String>,
    pub task_number: i32,
    pub task_description: String,
    pub task_title: Option<String>,
}

/// Partial update carrying only the fields present in the request.
/// The outer `Option` records presence, the inner one the value; an empty
/// string arrives as `Some(None)` and is written as NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoPatch {
    pub day_title: Option<Option<String>>,
    pub task_description: Option<Option<String>>,
    pub task_title: Option<Option<String>>,
    pub is_completed: Option<bool>,
}

impl TodoPatch {
    pub fn is_empty(&self) -> bool {
        self.day_title.is_none()
            && self.task_description.is_none()
            && self.task_title.is_none()
            && self.is_completed.is_none()
    }
}

/// Parses the wire form of the completion flag. Anything other than exactly
/// 0 or 1 yields `None` so a bogus value never overwrites the stored flag.
pub fn parse_completed_flag(raw: &str) -> Option<bool> {
    match raw.trim().parse::<u8>() {
        Ok(0) => Some(false),
        Ok(1) => Some(true),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_flag_accepts_only_zero_and_one() {
        assert_eq!(parse_completed_flag("0"), Some(false));
        assert_eq!(parse_completed_flag("1"), Some(true));
        assert_eq!(parse_completed_flag(" 1 "), Some(true));
        assert_eq!(parse_completed_flag("2"), None);
        assert_eq!(parse_completed_flag("-1"), None);
        assert_eq!(parse_completed_flag("true"), None);
        assert_eq!(parse_completed_flag(""), None);
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(TodoPatch::default().is_empty());

        let patch = TodoPatch {
            task_description: Some(Some("water the plants".to_string())),
            ..TodoPatch::default()
        };
        assert!(!patch.is_empty());

        // A field explicitly set to NULL still counts as present.
        let patch = TodoPatch {
            task_title: Some(None),
            ..TodoPatch::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn attachments_are_nested_into_the_todo_object() {
        let todo = Todo {
            id: 7,
            day_title: Some("Monday".to_string()),
            task_number: 1,
            task_description: Some("buy milk".to_string()),
            task_title: None,
            is_completed: false,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(TodoWithAttachments {
            todo,
            attachments: Vec::new(),
        })
        .unwrap();

        assert_eq!(value["id"], 7);
        assert_eq!(value["day_title"], "Monday");
        assert!(value["attachments"].as_array().unwrap().is_empty());
    }
}
