//! Notification sinks for composed alert and status messages.

use crate::config::NotifierConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub mod log;
pub mod mock;
pub mod telegram;
pub mod webhook;

pub use self::log::LogNotifier;
pub use mock::MockNotifier;
pub use telegram::TelegramNotifier;
pub use webhook::WebhookNotifier;

/// Delivers a subject line and a plain-text body.
#[async_trait]
pub trait Notifier: Send + Sync + fmt::Debug {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },
    #[error("rejected by channel: {0}")]
    Rejected(String),
}

/// Build the notifier selected in configuration.
pub fn build_notifier(config: &NotifierConfig) -> Arc<dyn Notifier> {
    match config {
        NotifierConfig::Log => Arc::new(LogNotifier),
        NotifierConfig::Webhook { url } => Arc::new(WebhookNotifier::new(url.clone())),
        NotifierConfig::Telegram { bot_token, chat_id } => {
            Arc::new(TelegramNotifier::new(bot_token.clone(), chat_id.clone()))
        }
    }
}

/// POST a JSON payload once and return the decoded reply.
///
/// Delivery is never retried here: a failed send fails the cycle. For a
/// non-success status the error message is the reply's `description` when it
/// carries one (Telegram style), otherwise the raw body.
pub(crate) async fn post_json(
    client: &Client,
    url: &str,
    payload: &serde_json::Value,
) -> Result<serde_json::Value, NotifyError> {
    let response = client
        .post(url)
        .json(payload)
        .send()
        .await
        .map_err(|e| NotifyError::Network(e.to_string()))?;

    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    if !status.is_success() {
        return Err(NotifyError::Http {
            status: status.as_u16(),
            message: error_message(&text),
        });
    }

    // Some endpoints answer with an empty body.
    Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::Null))
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|reply| {
            reply
                .get("description")
                .and_then(|d| d.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}
