use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{info, warn};

use crate::db::TodoRepository;
use crate::error::AppError;
use crate::models::{
    Attachment, NewAttachment, NewTodoRequest, Todo, TodoPatch, TodoWithAttachments,
};
use crate::storage::{self, ObjectStore, UploadedFile, file_extension, key_from_url};

/// Outcome of a single-attachment delete. An id that no longer exists is
/// reported, not treated as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentDeletion {
    Deleted,
    AlreadyGone,
}

/// Sequences relational reads/writes and blob-store calls for each endpoint.
/// The two stores are not updated transactionally; the partial-failure
/// windows between them are accepted behavior.
pub struct TodoService {
    repo: Arc<dyn TodoRepository>,
    store: Arc<dyn ObjectStore>,
}

impl TodoService {
    pub fn new(repo: Arc<dyn TodoRepository>, store: Arc<dyn ObjectStore>) -> Self {
        Self { repo, store }
    }

    pub async fn list(&self) -> Result<Vec<TodoWithAttachments>, AppError> {
        let todos = self.repo.fetch_todos().await?;
        let attachments = self.repo.fetch_attachments().await?;

        let mut by_todo: HashMap<i64, Vec<Attachment>> = HashMap::new();
        for attachment in attachments {
            by_todo.entry(attachment.todo_id).or_default().push(attachment);
        }

        Ok(todos
            .into_iter()
            .map(|todo| {
                let attachments = by_todo.remove(&todo.id).unwrap_or_default();
                TodoWithAttachments { todo, attachments }
            })
            .collect())
    }

    pub async fn create(&self, mut req: NewTodoRequest) -> Result<Todo, AppError> {
        // Empty optional text is stored as NULL.
        req.day_title = req.day_title.filter(|s| !s.is_empty());
        req.task_title = req.task_title.filter(|s| !s.is_empty());

        let todo = self.repo.insert_todo(req).await?;
        info!(id = todo.id, "created todo");
        Ok(todo)
    }

    /// Partial text update plus optional file attachments. The text write and
    /// the upload/record steps are independent: a committed text update is
    /// not rolled back when a later upload fails.
    pub async fn update(
        &self,
        id: i64,
        patch: TodoPatch,
        files: Vec<UploadedFile>,
        shortcut: Option<String>,
    ) -> Result<(), AppError> {
        if patch.is_empty() && files.is_empty() {
            return Err(AppError::BadRequest(
                "No fields to update or files to upload.".to_string(),
            ));
        }

        if !patch.is_empty() {
            let affected = self.repo.update_todo(id, &patch).await?;
            if affected == 0 {
                // The file uploads below still run; attachments recorded for
                // a missing parent are an accepted inconsistency.
                warn!(id, "todo not found for text update");
            }
        }

        if !files.is_empty() {
            self.attach_files(id, files, shortcut.as_deref()).await?;
        }

        info!(id, "updated todo");
        Ok(())
    }

    /// Attaches files to an existing item without touching its text fields.
    /// The parent is not verified to exist.
    pub async fn upload_attachments(
        &self,
        todo_id: i64,
        files: Vec<UploadedFile>,
        shortcut: Option<String>,
    ) -> Result<usize, AppError> {
        if files.is_empty() {
            return Err(AppError::BadRequest("No files were uploaded.".to_string()));
        }

        let count = files.len();
        self.attach_files(todo_id, files, shortcut.as_deref()).await?;
        Ok(count)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let urls = self.repo.attachment_urls_for_todo(id).await?;

        if !self.repo.todo_exists(id).await? {
            return Err(AppError::NotFound);
        }

        self.repo.delete_todo(id).await?;
        self.delete_blobs(&urls).await?;

        info!(id, attachments = urls.len(), "deleted todo");
        Ok(())
    }

    pub async fn delete_attachment(&self, id: i64) -> Result<AttachmentDeletion, AppError> {
        let Some(url) = self.repo.attachment_url(id).await? else {
            return Ok(AttachmentDeletion::AlreadyGone);
        };

        // Row first, blob second: a failed blob delete leaves an orphaned
        // object rather than a dangling row.
        self.repo.delete_attachment(id).await?;

        if let Some(key) = key_from_url(Some(&url)) {
            self.store.delete_object(&key).await?;
            info!(id, key = %key, "deleted attachment");
        }

        Ok(AttachmentDeletion::Deleted)
    }

    pub async fn delete_day_group(&self, day_title: &str) -> Result<u64, AppError> {
        let urls = self.repo.attachment_urls_for_day(day_title).await?;

        let deleted = self.repo.delete_todos_for_day(day_title).await?;
        if deleted == 0 {
            return Err(AppError::NotFound);
        }

        // Attachment rows are removed by the schema's ON DELETE CASCADE;
        // only the blobs need explicit cleanup.
        self.delete_blobs(&urls).await?;

        info!(day_title, deleted, "deleted day group");
        Ok(deleted)
    }

    /// Uploads each file in request order, then records the whole batch in
    /// one insert. A shortcut name renames only the first file, keeping its
    /// original extension.
    async fn attach_files(
        &self,
        todo_id: i64,
        files: Vec<UploadedFile>,
        shortcut: Option<&str>,
    ) -> Result<(), AppError> {
        let mut rows = Vec::with_capacity(files.len());
        for (index, file) in files.iter().enumerate() {
            let stored = storage::upload_file(self.store.as_ref(), file).await?;
            let file_name = match shortcut {
                Some(shortcut) if index == 0 => {
                    format!("{shortcut}{}", file_extension(&file.file_name))
                }
                _ => file.file_name.clone(),
            };
            rows.push(NewAttachment {
                todo_id,
                file_url: stored.url,
                file_name,
            });
        }

        self.repo.insert_attachments(&rows).await?;
        info!(todo_id, count = rows.len(), "recorded attachments");
        Ok(())
    }

    /// Fans out one blob delete per derivable key and awaits them together.
    /// The join is all-or-nothing: one failure fails the whole batch even
    /// though the relational rows are already gone.
    async fn delete_blobs(&self, urls: &[String]) -> Result<(), AppError> {
        let keys: Vec<String> = urls
            .iter()
            .filter_map(|url| key_from_url(Some(url)))
            .collect();

        if keys.is_empty() {
            return Ok(());
        }

        try_join_all(keys.iter().map(|key| self.store.delete_object(key))).await?;
        info!(count = keys.len(), "deleted blobs");
        Ok(())
    }
}
