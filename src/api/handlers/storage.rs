//! Database access for users and todos.
//!
//! Todo mutations filter on both `id` and `user_id`, so a row owned by
//! another user behaves exactly like a missing row.

use super::types::{Todo, UserSummary};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

/// Stored account row, including the credential record.
pub(super) struct UserRecord {
    pub(super) id: Uuid,
    pub(super) email: String,
    pub(super) username: String,
    pub(super) password: String,
}

const TODO_COLUMNS: &str = "id, title, content, user_id, created_at, updated_at";

fn todo_from_row(row: &PgRow) -> Result<Todo, sqlx::Error> {
    Ok(Todo {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        user_id: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub(super) async fn user_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1) AS exists")
        .bind(email)
        .fetch_one(pool)
        .await?;
    row.try_get("exists")
}

pub(super) async fn insert_user(
    pool: &PgPool,
    email: &str,
    username: &str,
    password: &str,
) -> Result<UserSummary, sqlx::Error> {
    let row = sqlx::query(
        "INSERT INTO users (id, email, username, password) VALUES ($1, $2, $3, $4) \
         RETURNING id, email, username",
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(username)
    .bind(password)
    .fetch_one(pool)
    .await?;

    Ok(UserSummary {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        username: row.try_get("username")?,
    })
}

pub(super) async fn find_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query("SELECT id, email, username, password FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    row.map(|row| {
        Ok(UserRecord {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            username: row.try_get("username")?,
            password: row.try_get("password")?,
        })
    })
    .transpose()
}

pub(super) async fn list_todos(pool: &PgPool, user_id: Uuid) -> Result<Vec<Todo>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        "SELECT {TODO_COLUMNS} FROM todos WHERE user_id = $1 ORDER BY created_at, id"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(todo_from_row).collect()
}

pub(super) async fn insert_todo(
    pool: &PgPool,
    user_id: Uuid,
    title: &str,
    content: &str,
) -> Result<Todo, sqlx::Error> {
    let row = sqlx::query(&format!(
        "INSERT INTO todos (id, title, content, user_id) VALUES ($1, $2, $3, $4) \
         RETURNING {TODO_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(content)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    todo_from_row(&row)
}

/// Update the fields that are present; `None` keeps the stored value.
pub(super) async fn update_todo(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    title: Option<&str>,
    content: Option<&str>,
) -> Result<Option<Todo>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "UPDATE todos SET title = COALESCE($3, title), content = COALESCE($4, content), \
         updated_at = NOW() WHERE id = $1 AND user_id = $2 RETURNING {TODO_COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(title)
    .bind(content)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(todo_from_row).transpose()
}

pub(super) async fn delete_todo(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
