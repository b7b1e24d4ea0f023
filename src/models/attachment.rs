use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Attachment {
    pub id: i64,
    pub todo_id: i64,
    pub file_url: String,
    pub file_name: String,
    pub file_name_shortcut: Option<String>,
}

/// Row data for a freshly uploaded file, recorded only after the upload
/// to the object store has succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttachment {
    pub todo_id: i64,
    pub file_url: String,
    pub file_name: String,
}
