// src/handlers/lists.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    models::word_list::{CreateListRequest, ListSummaryRow, UpdateListRequest, WordList},
    utils::jwt::Claims,
};

const LIST_COLUMNS: &str = "id, teacher_id, title, entries, created_at";

/// Loads a list owned by `teacher_id`. Foreign lists look like missing ones.
pub(crate) async fn fetch_owned_list(
    pool: &PgPool,
    teacher_id: i64,
    list_id: i64,
) -> Result<WordList, AppError> {
    sqlx::query_as::<_, WordList>(&format!(
        "SELECT {LIST_COLUMNS} FROM word_lists WHERE id = $1 AND teacher_id = $2"
    ))
    .bind(list_id)
    .bind(teacher_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("List not found".to_string()))
}

/// All lists of one teacher, oldest first.
pub(crate) async fn fetch_teacher_lists(
    pool: &PgPool,
    teacher_id: i64,
) -> Result<Vec<WordList>, AppError> {
    let lists = sqlx::query_as::<_, WordList>(&format!(
        "SELECT {LIST_COLUMNS} FROM word_lists WHERE teacher_id = $1 ORDER BY id"
    ))
    .bind(teacher_id)
    .fetch_all(pool)
    .await?;

    Ok(lists)
}

/// Lists the calling teacher's lists with entry counts.
pub async fn list_lists(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = claims.subject_id()?;

    let lists = sqlx::query_as::<_, ListSummaryRow>(
        r#"
        SELECT id, title, jsonb_array_length(entries)::BIGINT AS entry_count, created_at
        FROM word_lists
        WHERE teacher_id = $1
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(teacher_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(lists))
}

pub async fn get_list(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let list = fetch_owned_list(&pool, claims.subject_id()?, id).await?;
    Ok(Json(list))
}

/// Creates a list. Titles are sanitized and entries trimmed before storage.
pub async fn create_list(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateListRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let teacher_id = claims.subject_id()?;
    let payload = payload.sanitized();

    if payload.title.is_empty() {
        return Err(AppError::BadRequest("Title is empty after sanitization".to_string()));
    }

    let list = sqlx::query_as::<_, WordList>(&format!(
        "INSERT INTO word_lists (teacher_id, title, entries) VALUES ($1, $2, $3) RETURNING {LIST_COLUMNS}"
    ))
    .bind(teacher_id)
    .bind(&payload.title)
    .bind(SqlJson(&payload.entries))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create list: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!(teacher_id, list_id = list.id, "List created");

    Ok((StatusCode::CREATED, Json(list)))
}

/// Updates title and/or entries of an owned list.
pub async fn update_list(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateListRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let teacher_id = claims.subject_id()?;
    let payload = payload.sanitized();

    let current = fetch_owned_list(&pool, teacher_id, id).await?;
    let title = payload.title.unwrap_or(current.title);
    let entries = payload.entries.unwrap_or(current.entries.0);

    let list = sqlx::query_as::<_, WordList>(&format!(
        "UPDATE word_lists SET title = $1, entries = $2 WHERE id = $3 AND teacher_id = $4 RETURNING {LIST_COLUMNS}"
    ))
    .bind(&title)
    .bind(SqlJson(&entries))
    .bind(id)
    .bind(teacher_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("List not found".to_string()))?;

    Ok(Json(list))
}

/// Deletes an owned list.
///
/// Attempts recorded against it are kept; progress reports flag them as
/// referring to an unknown list.
pub async fn delete_list(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = claims.subject_id()?;

    let result = sqlx::query("DELETE FROM word_lists WHERE id = $1 AND teacher_id = $2")
        .bind(id)
        .bind(teacher_id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("List not found".to_string()));
    }

    tracing::info!(teacher_id, list_id = id, "List deleted");

    Ok(StatusCode::NO_CONTENT)
}
