use async_trait::async_trait;
use sqlx::{MySql, MySqlPool, QueryBuilder};

use super::TodoRepository;
use crate::error::AppError;
use crate::models::{Attachment, NewAttachment, NewTodoRequest, Todo, TodoPatch};

const TODO_COLUMNS: &str =
    "id, day_title, task_number, task_description, task_title, is_completed, created_at";

/// sqlx-backed repository over the pooled MySQL connection.
#[derive(Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_todo(&self, id: i64) -> Result<Option<Todo>, AppError> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(todo)
    }
}

#[async_trait]
impl TodoRepository for MySqlRepository {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn fetch_todos(&self) -> Result<Vec<Todo>, AppError> {
        let todos = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(todos)
    }

    async fn fetch_attachments(&self) -> Result<Vec<Attachment>, AppError> {
        let attachments = sqlx::query_as::<_, Attachment>(
            "SELECT id, todo_id, file_url, file_name, file_name_shortcut FROM attachments",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(attachments)
    }

    async fn insert_todo(&self, req: NewTodoRequest) -> Result<Todo, AppError> {
        let result = sqlx::query(
            "INSERT INTO todos (day_title, task_number, task_description, task_title) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(&req.day_title)
        .bind(req.task_number)
        .bind(&req.task_description)
        .bind(&req.task_title)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id() as i64;
        self.fetch_todo(id).await?.ok_or(AppError::NotFound)
    }

    async fn update_todo(&self, id: i64, patch: &TodoPatch) -> Result<u64, AppError> {
        let mut query = QueryBuilder::<MySql>::new("UPDATE todos SET ");
        let mut fields = query.separated(", ");

        if let Some(day_title) = &patch.day_title {
            fields
                .push("day_title = ")
                .push_bind_unseparated(day_title.clone());
        }
        if let Some(task_description) = &patch.task_description {
            fields
                .push("task_description = ")
                .push_bind_unseparated(task_description.clone());
        }
        if let Some(task_title) = &patch.task_title {
            fields
                .push("task_title = ")
                .push_bind_unseparated(task_title.clone());
        }
        if let Some(is_completed) = patch.is_completed {
            fields
                .push("is_completed = ")
                .push_bind_unseparated(is_completed);
        }

        query.push(" WHERE id = ").push_bind(id);

        let result = query.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn todo_exists(&self, id: i64) -> Result<bool, AppError> {
        let found = sqlx::query_scalar::<_, i64>("SELECT id FROM todos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn delete_todo(&self, id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_attachments(&self, rows: &[NewAttachment]) -> Result<(), AppError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut query =
            QueryBuilder::<MySql>::new("INSERT INTO attachments (todo_id, file_url, file_name) ");
        query.push_values(rows, |mut row, att| {
            row.push_bind(att.todo_id)
                .push_bind(att.file_url.clone())
                .push_bind(att.file_name.clone());
        });

        query.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn attachment_urls_for_todo(&self, todo_id: i64) -> Result<Vec<String>, AppError> {
        let urls =
            sqlx::query_scalar::<_, String>("SELECT file_url FROM attachments WHERE todo_id = ?")
                .bind(todo_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(urls)
    }

    async fn attachment_url(&self, id: i64) -> Result<Option<String>, AppError> {
        let url = sqlx::query_scalar::<_, String>("SELECT file_url FROM attachments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(url)
    }

    async fn delete_attachment(&self, id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM attachments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn attachment_urls_for_day(&self, day_title: &str) -> Result<Vec<String>, AppError> {
        let urls = sqlx::query_scalar::<_, String>(
            "SELECT a.file_url FROM attachments a \
             JOIN todos t ON a.todo_id = t.id \
             WHERE t.day_title = ?",
        )
        .bind(day_title)
        .fetch_all(&self.pool)
        .await?;
        Ok(urls)
    }

    async fn delete_todos_for_day(&self, day_title: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM todos WHERE day_title = ?")
            .bind(day_title)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
