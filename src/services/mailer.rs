// src/services/mailer.rs

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::OtpDelivery;
use crate::error::AppError;

/// Delivers teacher login codes.
#[async_trait]
pub trait OtpMailer: Send + Sync {
    async fn send_code(&self, email: &str, code: &str, ttl_seconds: i64) -> Result<(), AppError>;
}

/// Picks the mailer for the configured delivery channel.
pub fn mailer_for(delivery: OtpDelivery) -> Arc<dyn OtpMailer> {
    match delivery {
        OtpDelivery::Log => Arc::new(LogMailer),
        OtpDelivery::Disabled => Arc::new(DisabledMailer),
    }
}

/// Records that a code was issued without sending mail.
///
/// The code itself only reaches the log in debug builds, at debug level.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl OtpMailer for LogMailer {
    async fn send_code(&self, email: &str, code: &str, ttl_seconds: i64) -> Result<(), AppError> {
        tracing::info!(
            target: "otp_delivery",
            %email,
            ttl_seconds,
            "Login code issued (log delivery)"
        );

        #[cfg(debug_assertions)]
        tracing::debug!(target: "otp_delivery", %email, %code, "Development login code");
        #[cfg(not(debug_assertions))]
        let _ = code;

        Ok(())
    }
}

/// Refuses to issue codes when no delivery channel is configured.
#[derive(Debug, Default, Clone)]
pub struct DisabledMailer;

#[async_trait]
impl OtpMailer for DisabledMailer {
    async fn send_code(&self, _email: &str, _code: &str, _ttl: i64) -> Result<(), AppError> {
        tracing::error!("OTP requested but OTP_DELIVERY is disabled");
        Err(AppError::ServiceUnavailable(
            "Login code delivery is not configured".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn log_mailer_keeps_code_out_of_info_logs() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        LogMailer
            .send_code("guru@school.edu", "482913", 600)
            .await
            .unwrap();

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("guru@school.edu"));
        assert!(!output.contains("482913"));
    }

    #[tokio::test]
    async fn disabled_delivery_refuses_with_503() {
        let mailer = mailer_for(OtpDelivery::Disabled);
        let err = mailer
            .send_code("guru@school.edu", "482913", 600)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ServiceUnavailable(_)));
    }
}
