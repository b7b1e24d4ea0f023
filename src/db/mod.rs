pub mod mysql;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{Attachment, NewAttachment, NewTodoRequest, Todo, TodoPatch};

/// Narrow query surface over the relational store. Orchestrators hold this
/// behind `Arc<dyn TodoRepository>` so tests can substitute an in-memory
/// implementation.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Liveness probe for the health endpoint.
    async fn ping(&self) -> Result<(), AppError>;

    async fn fetch_todos(&self) -> Result<Vec<Todo>, AppError>;

    async fn fetch_attachments(&self) -> Result<Vec<Attachment>, AppError>;

    async fn insert_todo(&self, req: NewTodoRequest) -> Result<Todo, AppError>;

    /// Writes only the fields present in `patch`; returns the affected row
    /// count. Callers must not pass an empty patch.
    async fn update_todo(&self, id: i64, patch: &TodoPatch) -> Result<u64, AppError>;

    async fn todo_exists(&self, id: i64) -> Result<bool, AppError>;

    async fn delete_todo(&self, id: i64) -> Result<u64, AppError>;

    /// Batched insert; an empty slice is a no-op, not an error.
    async fn insert_attachments(&self, rows: &[NewAttachment]) -> Result<(), AppError>;

    async fn attachment_urls_for_todo(&self, todo_id: i64) -> Result<Vec<String>, AppError>;

    async fn attachment_url(&self, id: i64) -> Result<Option<String>, AppError>;

    async fn delete_attachment(&self, id: i64) -> Result<u64, AppError>;

    async fn attachment_urls_for_day(&self, day_title: &str) -> Result<Vec<String>, AppError>;

    /// Deletes every todo in the group; attachment rows go with them via the
    /// schema's ON DELETE CASCADE.
    async fn delete_todos_for_day(&self, day_title: &str) -> Result<u64, AppError>;
}
