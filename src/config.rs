// src/config.rs

use std::env;
use std::fmt;

use dotenvy::dotenv;
use url::Url;

/// Digits in a teacher one-time login code.
pub const OTP_CODE_LENGTH: usize = 6;

/// Wrong guesses allowed before an OTP code is burned.
pub const OTP_MAX_FAILED_ATTEMPTS: i32 = 5;

/// Characters in a generated student login code.
pub const STUDENT_CODE_LENGTH: usize = 6;

/// Stars awarded for one correct answer.
pub const STARS_PER_CORRECT_ANSWER: u32 = 3;

/// Number of strongest/weakest lists forwarded to the summary generator.
pub const SUMMARY_HIGHLIGHT_COUNT: usize = 3;

/// How teacher login codes leave the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpDelivery {
    /// Development only: announce issued codes in the log.
    Log,
    /// No delivery channel. Code requests are refused with 503.
    Disabled,
}

impl std::str::FromStr for OtpDelivery {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(OtpDelivery::Log),
            "disabled" | "none" => Ok(OtpDelivery::Disabled),
            other => Err(format!("unknown delivery '{}', expected 'log' or 'disabled'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: String,
    pub otp_ttl_seconds: i64,
    pub otp_cooldown_seconds: i64,
    pub otp_delivery: OtpDelivery,
    /// Text-generation API key. Summaries are disabled when absent.
    pub ai_api_key: Option<String>,
    pub ai_base_url: String,
    pub ai_model: String,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid(key, reason) => write!(f, "{} is invalid: {}", key, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let jwt_expiration = parsed("JWT_EXPIRATION", 86_400)?;
        let otp_ttl_seconds = parsed("OTP_TTL_SECONDS", 600)?;
        let otp_cooldown_seconds = parsed("OTP_COOLDOWN_SECONDS", 60)?;
        let otp_delivery = parsed("OTP_DELIVERY", OtpDelivery::Disabled)?;

        let ai_api_key = env::var("AI_API_KEY").ok().filter(|k| !k.trim().is_empty());
        let ai_base_url =
            env::var("AI_BASE_URL").unwrap_or_else(|_| "https://api.anthropic.com".to_string());
        Url::parse(&ai_base_url)
            .map_err(|e| ConfigError::Invalid("AI_BASE_URL", e.to_string()))?;
        let ai_model =
            env::var("AI_MODEL").unwrap_or_else(|_| "claude-3-5-haiku-latest".to_string());

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            bind_addr,
            otp_ttl_seconds,
            otp_cooldown_seconds,
            otp_delivery,
            ai_api_key,
            ai_base_url,
            ai_model,
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn parsed<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::Invalid(key, e.to_string())),
        Err(_) => Ok(default),
    }
}
