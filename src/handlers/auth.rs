// src/handlers/auth.rs

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{Duration, Utc};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::{Config, OTP_MAX_FAILED_ATTEMPTS},
    error::{AppError, is_unique_violation},
    models::{
        otp::OtpCode,
        user::{
            OtpRequest, OtpVerifyRequest, RegisterTeacherRequest, Student, StudentLoginRequest,
            Teacher, normalize_email,
        },
    },
    services::mailer::OtpMailer,
    utils::{
        codes::generate_otp,
        hash::{hash_secret, verify_secret},
        jwt::{ROLE_STUDENT, ROLE_TEACHER, sign_jwt},
    },
};

const OTP_ACCEPTED_MESSAGE: &str = "If the address belongs to a teacher, a login code is on its way.";

/// Registers a new teacher account.
/// Returns 201 Created and the teacher object.
pub async fn register(
    State(pool): State<PgPool>,
    Json(payload): Json<RegisterTeacherRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = normalize_email(&payload.email);

    let teacher = sqlx::query_as::<_, Teacher>(
        r#"
        INSERT INTO teachers (email, name)
        VALUES ($1, $2)
        RETURNING id, email, name, created_at
        "#,
    )
    .bind(&email)
    .bind(payload.name.trim())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("Email '{}' is already registered", email))
        } else {
            tracing::error!("Failed to register teacher: {:?}", e);
            AppError::from(e)
        }
    })?;

    tracing::info!(teacher_id = teacher.id, "Teacher registered");

    Ok((StatusCode::CREATED, Json(teacher)))
}

/// Issues a one-time login code for a teacher.
///
/// Always answers 202 for unknown addresses so accounts cannot be probed.
/// A new code replaces any outstanding one; requests inside the cooldown
/// window are refused with 429.
pub async fn request_otp(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    State(mailer): State<Arc<dyn OtpMailer>>,
    Json(payload): Json<OtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = normalize_email(&payload.email);
    let accepted = (
        StatusCode::ACCEPTED,
        Json(json!({ "message": OTP_ACCEPTED_MESSAGE })),
    );

    let teacher_exists = sqlx::query_scalar::<_, i64>("SELECT id FROM teachers WHERE email = $1")
        .bind(&email)
        .fetch_optional(&pool)
        .await?
        .is_some();

    if !teacher_exists {
        tracing::debug!("OTP requested for unknown address");
        return Ok(accepted);
    }

    let now = Utc::now();
    let last_issued = sqlx::query_scalar::<_, chrono::DateTime<Utc>>(
        "SELECT created_at FROM otp_codes WHERE email = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(&email)
    .fetch_optional(&pool)
    .await?;

    if let Some(issued_at) = last_issued {
        if now - issued_at < Duration::seconds(config.otp_cooldown_seconds) {
            return Err(AppError::TooManyRequests(
                "A code was sent recently. Please wait before requesting another.".to_string(),
            ));
        }
    }

    let code = generate_otp(&mut rand::thread_rng());
    let code_hash = hash_secret(&code)?;
    let expires_at = now + Duration::seconds(config.otp_ttl_seconds);

    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE otp_codes SET consumed_at = NOW() WHERE email = $1 AND consumed_at IS NULL")
        .bind(&email)
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO otp_codes (email, code_hash, expires_at) VALUES ($1, $2, $3)")
        .bind(&email)
        .bind(&code_hash)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    mailer
        .send_code(&email, &code, config.otp_ttl_seconds)
        .await?;

    Ok(accepted)
}

/// Exchanges a one-time code for a teacher token.
///
/// Every guess reserves one of the code's allowed attempts before the hash is
/// checked, so parallel requests cannot exceed the cap. A correct guess then
/// consumes the code; only the first caller wins that step.
pub async fn verify_otp(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<OtpVerifyRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = normalize_email(&payload.email);
    let invalid = || AppError::AuthError("Invalid or expired code".to_string());

    let otp = sqlx::query_as::<_, OtpCode>(
        r#"
        SELECT id, email, code_hash, failed_attempts, expires_at, consumed_at, created_at
        FROM otp_codes
        WHERE email = $1
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(&email)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(invalid)?;

    if !otp.is_redeemable(Utc::now(), OTP_MAX_FAILED_ATTEMPTS) {
        return Err(invalid());
    }

    sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE otp_codes
        SET failed_attempts = failed_attempts + 1
        WHERE id = $1
          AND failed_attempts < $2
          AND consumed_at IS NULL
          AND expires_at > NOW()
        RETURNING id
        "#,
    )
    .bind(otp.id)
    .bind(OTP_MAX_FAILED_ATTEMPTS)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(invalid)?;

    if !verify_secret(payload.code.trim(), &otp.code_hash)? {
        tracing::warn!(otp_id = otp.id, "Wrong OTP code submitted");
        return Err(invalid());
    }

    sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE otp_codes
        SET consumed_at = NOW(), failed_attempts = failed_attempts - 1
        WHERE id = $1 AND consumed_at IS NULL
        RETURNING id
        "#,
    )
    .bind(otp.id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(invalid)?;

    let teacher = sqlx::query_as::<_, Teacher>(
        "SELECT id, email, name, created_at FROM teachers WHERE email = $1",
    )
    .bind(&email)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(invalid)?;

    let token = sign_jwt(
        teacher.id,
        ROLE_TEACHER,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    tracing::info!(teacher_id = teacher.id, "Teacher logged in");

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "teacher": teacher
    })))
}

/// Logs a student in with the short code their teacher handed out.
pub async fn student_login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<StudentLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let student = sqlx::query_as::<_, Student>(
        "SELECT id, teacher_id, name, login_code, created_at FROM students WHERE login_code = $1",
    )
    .bind(&payload.login_code)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::AuthError("Unknown login code".to_string()))?;

    let token = sign_jwt(
        student.id,
        ROLE_STUDENT,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "student": { "id": student.id, "name": student.name }
    })))
}
