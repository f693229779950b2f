// src/models/otp.rs

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Represents the 'otp_codes' table in the database.
/// Only the argon2 hash of a code is ever stored.
#[derive(Debug, Clone, FromRow)]
pub struct OtpCode {
    pub id: i64,
    pub email: String,
    pub code_hash: String,
    pub failed_attempts: i32,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl OtpCode {
    /// A code can be redeemed while unexpired, unused, and not burned by guesses.
    pub fn is_redeemable(&self, now: DateTime<Utc>, max_failed_attempts: i32) -> bool {
        self.consumed_at.is_none()
            && self.expires_at > now
            && self.failed_attempts < max_failed_attempts
    }
}
