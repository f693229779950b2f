use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::config::Config;
use crate::services::{
    ai::{AnthropicClient, Summarizer},
    mailer::{OtpMailer, mailer_for},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub mailer: Arc<dyn OtpMailer>,
    /// `None` when no text-generation key is configured.
    pub summarizer: Option<Arc<dyn Summarizer>>,
}

impl AppState {
    /// Wires OTP delivery and the summarizer from config.
    pub fn new(pool: PgPool, config: Config) -> Self {
        let summarizer = AnthropicClient::from_config(&config)
            .map(|client| Arc::new(client) as Arc<dyn Summarizer>);

        Self {
            mailer: mailer_for(config.otp_delivery),
            pool,
            config,
            summarizer,
        }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<dyn OtpMailer> {
    fn from_ref(state: &AppState) -> Self {
        state.mailer.clone()
    }
}
