// src/models/user.rs

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

static LOGIN_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z0-9]{4,12}$").expect("login code pattern is valid")
});

/// Represents the 'teachers' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Teacher {
    pub id: i64,

    /// Unique login email. OTP codes are sent here.
    pub email: String,

    pub name: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'students' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub teacher_id: i64,
    pub name: String,

    /// Short code the student types to log in.
    pub login_code: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for registering a teacher.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterTeacherRequest {
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name length must be between 1 and 100 characters."
    ))]
    pub name: String,
}

/// DTO for requesting a teacher login code.
#[derive(Debug, Deserialize, Validate)]
pub struct OtpRequest {
    #[validate(email)]
    pub email: String,
}

/// DTO for exchanging a login code for a token.
#[derive(Debug, Deserialize, Validate)]
pub struct OtpVerifyRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 12))]
    pub code: String,
}

/// DTO for student login.
#[derive(Debug, Deserialize, Validate)]
pub struct StudentLoginRequest {
    #[validate(custom(function = validate_login_code))]
    pub login_code: String,
}

/// DTO for a teacher adding a student.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateStudentRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

fn validate_login_code(code: &str) -> Result<(), validator::ValidationError> {
    if !LOGIN_CODE_RE.is_match(code) {
        return Err(validator::ValidationError::new("invalid_login_code"));
    }
    Ok(())
}

/// Canonical form of an email address used for lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_code_shape() {
        let ok = StudentLoginRequest {
            login_code: "AB12CD".into(),
        };
        assert!(ok.validate().is_ok());

        let lower = StudentLoginRequest {
            login_code: "ab12cd".into(),
        };
        assert!(lower.validate().is_err());

        let short = StudentLoginRequest {
            login_code: "A1".into(),
        };
        assert!(short.validate().is_err());
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Guru@School.EDU "), "guru@school.edu");
    }
}
