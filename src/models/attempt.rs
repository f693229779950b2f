// src/models/attempt.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// One recorded answer by a student for one word within one list.
///
/// This is the canonical, fully-normalized shape every consumer receives.
/// Records are append-only: nothing in the crate mutates or deletes them
/// except deletion of the owning student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub student_id: i64,
    pub list_id: i64,
    pub word: String,
    pub correct: bool,
    pub stars_earned: u32,
    pub student_answer: String,
    pub timestamp: DateTime<Utc>,
}

/// Represents the 'attempts' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct AttemptRow {
    pub id: i64,
    pub student_id: i64,
    pub list_id: i64,
    pub word: String,
    pub correct: bool,
    pub stars_earned: i32,
    pub student_answer: String,
    pub created_at: DateTime<Utc>,
}

/// Why a record was refused at the input boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    MissingField(&'static str),
    StarsOutOfRange(i64),
    StarsWithoutCorrect(u32),
    UnknownStudent(i64),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::MissingField(field) => write!(f, "missing required field '{}'", field),
            RecordError::StarsOutOfRange(n) => {
                write!(f, "stars_earned must fit 0..={}, got {}", i32::MAX, n)
            }
            RecordError::StarsWithoutCorrect(n) => {
                write!(f, "{} stars awarded on an incorrect attempt", n)
            }
            RecordError::UnknownStudent(id) => {
                write!(f, "record belongs to student {}, not the import target", id)
            }
        }
    }
}

impl std::error::Error for RecordError {}

impl TryFrom<AttemptRow> for AttemptRecord {
    type Error = RecordError;

    fn try_from(row: AttemptRow) -> Result<Self, Self::Error> {
        let stars_earned = u32::try_from(row.stars_earned)
            .map_err(|_| RecordError::StarsOutOfRange(row.stars_earned.into()))?;

        Ok(AttemptRecord {
            student_id: row.student_id,
            list_id: row.list_id,
            word: row.word,
            correct: row.correct,
            stars_earned,
            student_answer: row.student_answer,
            timestamp: row.created_at,
        })
    }
}

/// DTO for a student answering one exercise item.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    pub list_id: i64,

    #[validate(length(min = 1, max = 200))]
    #[serde(alias = "bahasa")]
    pub word: String,

    #[validate(length(max = 1000))]
    pub answer: String,
}

/// An attempt as it arrives from a legacy export.
///
/// Older exports used different field names depending on the exercise that
/// produced them, so every field is optional here and aliases are accepted.
/// `normalize` turns it into an `AttemptRecord` or says why it cannot.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawAttempt {
    #[serde(default, alias = "studentId")]
    pub student_id: Option<i64>,
    #[serde(default, alias = "listId")]
    pub list_id: Option<i64>,
    #[serde(default, alias = "bahasa")]
    pub word: Option<String>,
    #[serde(default, alias = "isCorrect")]
    pub correct: Option<bool>,
    #[serde(default, alias = "stars", alias = "starsEarned")]
    pub stars_earned: Option<i64>,
    #[serde(default, alias = "answer", alias = "studentAnswer")]
    pub student_answer: Option<String>,
    #[serde(default, alias = "created_at", alias = "createdAt")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl RawAttempt {
    /// Validates the record for `student_id`.
    ///
    /// A missing `correct` flag is an error: defaulting it to `false` would
    /// silently lower the student's score. Missing stars and answer text
    /// default to zero and empty, which cannot distort accuracy.
    pub fn normalize(self, student_id: i64) -> Result<AttemptRecord, RecordError> {
        if let Some(owner) = self.student_id {
            if owner != student_id {
                return Err(RecordError::UnknownStudent(owner));
            }
        }

        let list_id = self.list_id.ok_or(RecordError::MissingField("list_id"))?;
        let word = self
            .word
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .ok_or(RecordError::MissingField("word"))?;
        let correct = self.correct.ok_or(RecordError::MissingField("correct"))?;
        let timestamp = self.timestamp.ok_or(RecordError::MissingField("timestamp"))?;

        let stars = self.stars_earned.unwrap_or(0);
        let stars_earned = i32::try_from(stars)
            .ok()
            .and_then(|s| u32::try_from(s).ok())
            .ok_or(RecordError::StarsOutOfRange(stars))?;
        if stars_earned > 0 && !correct {
            return Err(RecordError::StarsWithoutCorrect(stars_earned));
        }

        Ok(AttemptRecord {
            student_id,
            list_id,
            word,
            correct,
            stars_earned,
            student_answer: self.student_answer.unwrap_or_default(),
            timestamp,
        })
    }
}

/// DTO for bulk importing legacy attempts.
#[derive(Debug, Deserialize)]
pub struct ImportAttemptsRequest {
    pub records: Vec<serde_json::Value>,
}

/// One rejected record in an import response.
#[derive(Debug, Serialize)]
pub struct RejectedRecord {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ImportAttemptsResponse {
    pub imported: usize,
    pub rejected: Vec<RejectedRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawAttempt {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn normalize_accepts_legacy_field_names() {
        let record = raw(json!({
            "listId": 4,
            "bahasa": " kucing ",
            "isCorrect": true,
            "stars": 3,
            "answer": "cat",
            "createdAt": "2024-03-01T10:00:00Z"
        }))
        .normalize(9)
        .unwrap();

        assert_eq!(record.student_id, 9);
        assert_eq!(record.list_id, 4);
        assert_eq!(record.word, "kucing");
        assert!(record.correct);
        assert_eq!(record.stars_earned, 3);
        assert_eq!(record.student_answer, "cat");
    }

    #[test]
    fn normalize_never_defaults_missing_correct_flag() {
        let err = raw(json!({
            "list_id": 1,
            "word": "anjing",
            "timestamp": "2024-03-01T10:00:00Z"
        }))
        .normalize(1)
        .unwrap_err();

        assert_eq!(err, RecordError::MissingField("correct"));
    }

    #[test]
    fn normalize_rejects_stars_on_wrong_answer() {
        let err = raw(json!({
            "list_id": 1,
            "word": "anjing",
            "correct": false,
            "stars_earned": 2,
            "timestamp": "2024-03-01T10:00:00Z"
        }))
        .normalize(1)
        .unwrap_err();

        assert_eq!(err, RecordError::StarsWithoutCorrect(2));
    }

    #[test]
    fn normalize_rejects_negative_stars_and_foreign_student() {
        let negative = raw(json!({
            "list_id": 1,
            "word": "anjing",
            "correct": true,
            "stars_earned": -1,
            "timestamp": "2024-03-01T10:00:00Z"
        }))
        .normalize(1)
        .unwrap_err();
        assert_eq!(negative, RecordError::StarsOutOfRange(-1));

        let foreign = raw(json!({
            "student_id": 2,
            "list_id": 1,
            "word": "anjing",
            "correct": true,
            "timestamp": "2024-03-01T10:00:00Z"
        }))
        .normalize(1)
        .unwrap_err();
        assert_eq!(foreign, RecordError::UnknownStudent(2));
    }

    #[test]
    fn row_with_negative_stars_is_refused() {
        let row = AttemptRow {
            id: 1,
            student_id: 1,
            list_id: 1,
            word: "buku".into(),
            correct: true,
            stars_earned: -3,
            student_answer: "book".into(),
            created_at: Utc::now(),
        };

        assert_eq!(
            AttemptRecord::try_from(row).unwrap_err(),
            RecordError::StarsOutOfRange(-3)
        );
    }
}
