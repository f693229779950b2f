// src/handlers/practice.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    exercises::{grade_answer, scramble_tokens, stars_for},
    handlers::lists::fetch_owned_list,
    models::{
        attempt::{AttemptRecord, AttemptRow, SubmitAttemptRequest},
        user::Student,
        word_list::{EntryKind, Exercise, ExerciseItem, ListSummaryRow, WordList},
    },
    utils::jwt::Claims,
};

/// Loads the calling student. A deleted student holding an old token gets 401.
pub(crate) async fn fetch_student(pool: &PgPool, student_id: i64) -> Result<Student, AppError> {
    sqlx::query_as::<_, Student>(
        "SELECT id, teacher_id, name, login_code, created_at FROM students WHERE id = $1",
    )
    .bind(student_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::AuthError("Student account no longer exists".to_string()))
}

/// Lists available to the student: every list of their teacher.
pub async fn my_lists(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student = fetch_student(&pool, claims.subject_id()?).await?;

    let lists = sqlx::query_as::<_, ListSummaryRow>(
        r#"
        SELECT id, title, jsonb_array_length(entries)::BIGINT AS entry_count, created_at
        FROM word_lists
        WHERE teacher_id = $1
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(student.teacher_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(lists))
}

fn build_exercise(list: WordList) -> Exercise {
    let mut rng = rand::thread_rng();
    let items = list
        .entries
        .0
        .into_iter()
        .map(|entry| {
            let tokens = match entry.kind {
                EntryKind::Sentence => Some(scramble_tokens(&entry.translation, &mut rng)),
                EntryKind::Vocabulary => None,
            };
            ExerciseItem {
                word: entry.word,
                kind: entry.kind,
                tokens,
            }
        })
        .collect();

    Exercise {
        list_id: list.id,
        title: list.title,
        items,
    }
}

/// Practice items for one list. Expected answers are never sent; sentence
/// items come with their words shuffled for unscrambling.
pub async fn get_exercise(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student = fetch_student(&pool, claims.subject_id()?).await?;
    let list = fetch_owned_list(&pool, student.teacher_id, id).await?;

    Ok(Json(build_exercise(list)))
}

/// Grades one answer and records the attempt.
pub async fn submit_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let student = fetch_student(&pool, claims.subject_id()?).await?;
    let list = fetch_owned_list(&pool, student.teacher_id, req.list_id).await?;

    let word = req.word.trim();
    let entry = list
        .entries
        .0
        .iter()
        .find(|e| e.word == word)
        .ok_or(AppError::BadRequest("Word is not part of this list".to_string()))?;

    let correct = grade_answer(&entry.translation, &req.answer);
    let stars = stars_for(correct);

    let row = sqlx::query_as::<_, AttemptRow>(
        r#"
        INSERT INTO attempts (student_id, list_id, word, correct, stars_earned, student_answer)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, student_id, list_id, word, correct, stars_earned, student_answer, created_at
        "#,
    )
    .bind(student.id)
    .bind(list.id)
    .bind(&entry.word)
    .bind(correct)
    .bind(stars as i32)
    .bind(req.answer.trim())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to record attempt: {:?}", e);
        AppError::from(e)
    })?;

    tracing::debug!(
        student_id = student.id,
        list_id = list.id,
        correct,
        "Attempt recorded"
    );

    let record = AttemptRecord::try_from(row)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(record)))
}
