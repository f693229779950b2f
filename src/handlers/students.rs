// src/handlers/students.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    models::{
        attempt::{
            AttemptRecord, ImportAttemptsRequest, ImportAttemptsResponse, RawAttempt,
            RejectedRecord,
        },
        user::{CreateStudentRequest, Student},
    },
    utils::{codes::generate_student_code, jwt::Claims},
};

const MAX_IMPORT_RECORDS: usize = 5000;
const CODE_RETRIES: usize = 5;

/// Loads a student belonging to `teacher_id`. Foreign students look like missing ones.
pub(crate) async fn fetch_owned_student(
    pool: &PgPool,
    teacher_id: i64,
    student_id: i64,
) -> Result<Student, AppError> {
    sqlx::query_as::<_, Student>(
        r#"
        SELECT id, teacher_id, name, login_code, created_at
        FROM students
        WHERE id = $1 AND teacher_id = $2
        "#,
    )
    .bind(student_id)
    .bind(teacher_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Student not found".to_string()))
}

pub async fn list_students(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = claims.subject_id()?;

    let students = sqlx::query_as::<_, Student>(
        r#"
        SELECT id, teacher_id, name, login_code, created_at
        FROM students
        WHERE teacher_id = $1
        ORDER BY name, id
        "#,
    )
    .bind(teacher_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(students))
}

/// Adds a student and generates their login code.
///
/// Codes are random; on the rare collision a fresh one is drawn.
pub async fn create_student(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateStudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let teacher_id = claims.subject_id()?;
    let name = payload.name.trim().to_string();

    for _ in 0..CODE_RETRIES {
        let code = generate_student_code(&mut rand::thread_rng());

        let inserted = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (teacher_id, name, login_code)
            VALUES ($1, $2, $3)
            RETURNING id, teacher_id, name, login_code, created_at
            "#,
        )
        .bind(teacher_id)
        .bind(&name)
        .bind(&code)
        .fetch_one(&pool)
        .await;

        match inserted {
            Ok(student) => {
                tracing::info!(teacher_id, student_id = student.id, "Student created");
                return Ok((StatusCode::CREATED, Json(student)));
            }
            Err(e) if is_unique_violation(&e) => {
                tracing::debug!("Login code collision, retrying");
            }
            Err(e) => {
                tracing::error!("Failed to create student: {:?}", e);
                return Err(AppError::from(e));
            }
        }
    }

    Err(AppError::InternalServerError(
        "Could not allocate a unique login code".to_string(),
    ))
}

/// Deletes a student together with their attempts.
pub async fn delete_student(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = claims.subject_id()?;

    let result = sqlx::query("DELETE FROM students WHERE id = $1 AND teacher_id = $2")
        .bind(id)
        .bind(teacher_id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Student not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Validates raw records one by one. Bad records are reported by index, never fatal.
pub(crate) fn partition_records(
    student_id: i64,
    records: Vec<serde_json::Value>,
) -> (Vec<AttemptRecord>, Vec<RejectedRecord>) {
    let mut valid = Vec::new();
    let mut rejected = Vec::new();

    for (index, value) in records.into_iter().enumerate() {
        let outcome = serde_json::from_value::<RawAttempt>(value)
            .map_err(|e| e.to_string())
            .and_then(|raw| raw.normalize(student_id).map_err(|e| e.to_string()));

        match outcome {
            Ok(record) => valid.push(record),
            Err(reason) => rejected.push(RejectedRecord { index, reason }),
        }
    }

    (valid, rejected)
}

/// Bulk-imports legacy attempt records for one student.
pub async fn import_attempts(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<ImportAttemptsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = claims.subject_id()?;
    let student = fetch_owned_student(&pool, teacher_id, id).await?;

    if payload.records.len() > MAX_IMPORT_RECORDS {
        return Err(AppError::BadRequest(format!(
            "At most {} records per import",
            MAX_IMPORT_RECORDS
        )));
    }

    let (valid, rejected) = partition_records(student.id, payload.records);

    if !rejected.is_empty() {
        tracing::warn!(
            student_id = student.id,
            rejected = rejected.len(),
            "Import contained malformed records"
        );
    }

    if !valid.is_empty() {
        let mut query_builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO attempts (student_id, list_id, word, correct, stars_earned, student_answer, created_at) ",
        );
        query_builder.push_values(&valid, |mut b, r| {
            b.push_bind(r.student_id)
                .push_bind(r.list_id)
                .push_bind(&r.word)
                .push_bind(r.correct)
                .push_bind(r.stars_earned as i32)
                .push_bind(&r.student_answer)
                .push_bind(r.timestamp);
        });

        query_builder.build().execute(&pool).await.map_err(|e| {
            tracing::error!("Failed to import attempts: {:?}", e);
            AppError::from(e)
        })?;
    }

    Ok(Json(ImportAttemptsResponse {
        imported: valid.len(),
        rejected,
    }))
}
