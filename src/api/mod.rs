use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::error::AppError;
use crate::models::{NewTodoRequest, Todo, TodoPatch, TodoWithAttachments, parse_completed_flag};
use crate::service::AttachmentDeletion;
use crate::state::AppState;
use crate::storage::UploadedFile;

/// Multipart field name the frontend uses for file parts.
const ATTACHMENTS_FIELD: &str = "attachments";

const MAX_ATTACHMENTS: usize = 5;
const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/{id}", put(update_todo).delete(delete_todo))
        .route("/todos/day/{day_title}", delete(delete_day_group))
        .route("/todos/{id}/upload", post(upload_attachments))
        .route("/attachments/{id}", delete(delete_attachment))
        // Five files of 5 MiB each, plus headroom for the text fields.
        .layer(DefaultBodyLimit::max((MAX_ATTACHMENTS + 1) * MAX_ATTACHMENT_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.repo.ping().await?;
    Ok(StatusCode::OK)
}

async fn list_todos(
    State(state): State<AppState>,
) -> Result<Json<Vec<TodoWithAttachments>>, AppError> {
    let todos = state.service().list().await?;
    Ok(Json(todos))
}

async fn create_todo(
    State(state): State<AppState>,
    Json(req): Json<NewTodoRequest>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    let todo = state.service().create(req).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<MessageResponse>, AppError> {
    let form = UpdateForm::from_multipart(multipart).await?;
    state
        .service()
        .update(id, form.patch, form.files, form.shortcut)
        .await?;
    Ok(Json(MessageResponse {
        message: "To-Do item and attachments updated successfully.".to_string(),
    }))
}

async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    state.service().delete(id).await?;
    Ok(Json(MessageResponse {
        message: "To-Do item and associated attachments deleted successfully.".to_string(),
    }))
}

async fn delete_day_group(
    State(state): State<AppState>,
    Path(day_title): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.service().delete_day_group(&day_title).await?;
    Ok(Json(MessageResponse {
        message: format!("Day group '{day_title}' and attachments deleted successfully."),
    }))
}

async fn upload_attachments(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<MessageResponse>, AppError> {
    let todo_id: i64 = id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid todo id.".to_string()))?;

    let form = UpdateForm::from_multipart(multipart).await?;
    let count = state
        .service()
        .upload_attachments(todo_id, form.files, form.shortcut)
        .await?;
    Ok(Json(MessageResponse {
        message: format!("{count} attachment(s) uploaded successfully."),
    }))
}

async fn delete_attachment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    match state.service().delete_attachment(id).await? {
        AttachmentDeletion::Deleted => Ok(Json(MessageResponse {
            message: "Attachment deleted successfully.".to_string(),
        })
        .into_response()),
        AttachmentDeletion::AlreadyGone => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Text fields, shortcut name, and decoded file buffers from one multipart
/// request body.
#[derive(Debug, Default)]
struct UpdateForm {
    patch: TodoPatch,
    shortcut: Option<String>,
    files: Vec<UploadedFile>,
}

impl UpdateForm {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match name.as_str() {
                ATTACHMENTS_FIELD => {
                    if form.files.len() == MAX_ATTACHMENTS {
                        return Err(AppError::BadRequest(format!(
                            "At most {MAX_ATTACHMENTS} attachments are allowed."
                        )));
                    }
                    form.files.push(read_file(field).await?);
                }
                "task_description" => {
                    form.patch.task_description = Some(text_or_null(field).await?);
                }
                "day_title" => {
                    form.patch.day_title = Some(text_or_null(field).await?);
                }
                "task_title" => {
                    form.patch.task_title = Some(text_or_null(field).await?);
                }
                "is_completed" => {
                    let raw = field_text(field).await?;
                    match parse_completed_flag(&raw) {
                        Some(flag) => form.patch.is_completed = Some(flag),
                        None => warn!(value = %raw, "ignoring invalid is_completed value"),
                    }
                }
                "file_name_shortcut" => {
                    let raw = field_text(field).await?;
                    if !raw.is_empty() {
                        form.shortcut = Some(raw);
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }
}

async fn read_file(field: Field<'_>) -> Result<UploadedFile, AppError> {
    let file_name = field.file_name().unwrap_or("attachment").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read attachment: {e}")))?;

    if bytes.len() > MAX_ATTACHMENT_BYTES {
        return Err(AppError::BadRequest(format!(
            "Attachment '{file_name}' exceeds the {} MiB limit.",
            MAX_ATTACHMENT_BYTES / (1024 * 1024)
        )));
    }

    Ok(UploadedFile {
        file_name,
        content_type,
        bytes,
    })
}

async fn field_text(field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart field: {e}")))
}

async fn text_or_null(field: Field<'_>) -> Result<Option<String>, AppError> {
    let text = field_text(field).await?;
    Ok((!text.is_empty()).then_some(text))
}
