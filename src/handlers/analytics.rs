// src/handlers/analytics.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Serialize;
use sqlx::PgPool;

use crate::{
    analytics::{
        aggregator::{Aggregation, IntegrityWarning, Progress, aggregate},
        summary::{SUMMARY_SYSTEM_PROMPT, SummaryPayload},
    },
    error::AppError,
    handlers::{
        lists::fetch_teacher_lists, practice::fetch_student, students::fetch_owned_student,
    },
    models::{
        attempt::{AttemptRecord, AttemptRow},
        user::Student,
        word_list::catalog_from_lists,
    },
    state::AppState,
    utils::jwt::Claims,
};

#[derive(Debug, Serialize)]
pub struct StudentRef {
    pub id: i64,
    pub name: String,
}

impl From<&Student> for StudentRef {
    fn from(s: &Student) -> Self {
        Self {
            id: s.id,
            name: s.name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub student: StudentRef,
    pub progress: Progress,
    pub warnings: Vec<IntegrityWarning>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub student: StudentRef,
    pub summary: String,
    pub payload: SummaryPayload,
}

/// Converts stored rows into typed records, turning failures into warnings.
pub(crate) fn records_from_rows(
    rows: Vec<AttemptRow>,
) -> (Vec<AttemptRecord>, Vec<IntegrityWarning>) {
    let mut records = Vec::with_capacity(rows.len());
    let mut warnings = Vec::new();

    for row in rows {
        let record_id = row.id;
        match AttemptRecord::try_from(row) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(record_id, error = %e, "Skipping malformed attempt record");
                warnings.push(IntegrityWarning::MalformedRecord {
                    record_id,
                    reason: e.to_string(),
                });
            }
        }
    }

    (records, warnings)
}

/// Fetches one student's attempts and their teacher's catalog, then aggregates.
///
/// Both ids are explicit: the student whose attempts are read and the teacher
/// whose lists make up the catalog.
async fn load_aggregation(
    pool: &PgPool,
    student_id: i64,
    teacher_id: i64,
) -> Result<Aggregation, AppError> {
    let rows = sqlx::query_as::<_, AttemptRow>(
        r#"
        SELECT id, student_id, list_id, word, correct, stars_earned, student_answer, created_at
        FROM attempts
        WHERE student_id = $1
        ORDER BY id
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch attempts: {:?}", e);
        AppError::from(e)
    })?;

    let lists = fetch_teacher_lists(pool, teacher_id).await?;
    let catalog = catalog_from_lists(&lists);

    let (records, mut warnings) = records_from_rows(rows);
    let mut aggregation = aggregate(&records, &catalog);
    warnings.append(&mut aggregation.warnings);
    aggregation.warnings = warnings;

    Ok(aggregation)
}

/// Progress report for one of the teacher's students.
pub async fn student_progress(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = claims.subject_id()?;
    let student = fetch_owned_student(&pool, teacher_id, id).await?;

    let aggregation = load_aggregation(&pool, student.id, teacher_id).await?;

    Ok(Json(ProgressResponse {
        student: StudentRef::from(&student),
        progress: aggregation.progress,
        warnings: aggregation.warnings,
    }))
}

/// Progress report for the calling student.
pub async fn my_progress(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student = fetch_student(&pool, claims.subject_id()?).await?;

    let aggregation = load_aggregation(&pool, student.id, student.teacher_id).await?;

    Ok(Json(ProgressResponse {
        student: StudentRef::from(&student),
        progress: aggregation.progress,
        warnings: aggregation.warnings,
    }))
}

/// Asks the text-generation service for a narrative of a student's progress.
///
/// 503 when no summarizer is configured or the upstream call fails;
/// 404 when the student has nothing to summarize.
pub async fn generate_summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let summarizer = state.summarizer.clone().ok_or(AppError::ServiceUnavailable(
        "AI summaries are not configured".to_string(),
    ))?;

    let teacher_id = claims.subject_id()?;
    let student = fetch_owned_student(&state.pool, teacher_id, id).await?;
    let aggregation = load_aggregation(&state.pool, student.id, teacher_id).await?;

    let stats = match &aggregation.progress {
        Progress::Ready(stats) => stats,
        Progress::NoData => {
            return Err(AppError::NotFound(
                "No attempts recorded for this student".to_string(),
            ));
        }
    };

    let payload = SummaryPayload::from_stats(&student.name, stats);
    let summary = summarizer
        .summarize(SUMMARY_SYSTEM_PROMPT, &payload.render_prompt())
        .await
        .map_err(|e| {
            tracing::error!(student_id = student.id, error = %e, "Summary generation failed");
            AppError::ServiceUnavailable("Summary generation failed".to_string())
        })?;

    Ok(Json(SummaryResponse {
        student: StudentRef::from(&student),
        summary,
        payload,
    }))
}
