//! Telegram Bot API sink.

use super::{post_json, Notifier, NotifyError};
use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Telegram caps message text at 4096 characters.
const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    api_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self::with_api_url(TELEGRAM_API_URL.to_string(), bot_token, chat_id)
    }

    /// Point at a different Bot API server (self-hosted or test).
    pub fn with_api_url(api_url: String, bot_token: String, chat_id: String) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            bot_token,
            chat_id,
        }
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_url, self.bot_token)
    }
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("api_url", &self.api_url)
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Subject as the first line, then the body, trimmed to Telegram's limit.
fn message_text(subject: &str, body: &str) -> String {
    let text = format!("{}\n\n{}", subject, body);
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        text
    } else {
        let mut truncated: String = text.chars().take(MAX_MESSAGE_CHARS - 1).collect();
        truncated.push('…');
        truncated
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!("Sending Telegram notification: {}", subject);
        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": message_text(subject, body),
            "disable_web_page_preview": true
        });

        let reply = match post_json(&self.client, &self.send_message_url(), &payload).await {
            Ok(reply) => reply,
            // The Bot API reports bad chats, tokens and payloads as 4xx with a description.
            Err(NotifyError::Http { status, message }) if (400..500).contains(&status) => {
                return Err(NotifyError::Rejected(message))
            }
            Err(e) => return Err(e),
        };
        if reply.get("ok").and_then(|v| v.as_bool()) == Some(false) {
            let description = reply
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            return Err(NotifyError::Rejected(description.to_string()));
        }

        info!("Telegram notification dispatched successfully.");
        Ok(())
    }
}
