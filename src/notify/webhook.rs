//! Generic JSON webhook sink (Slack/Discord-style relays, alerting gateways).

use super::{post_json, Notifier, NotifyError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    subject: &'a str,
    body: &'a str,
}

/// Posts `{"subject": ..., "body": ...}` to a fixed URL.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!("Sending webhook notification: {}", subject);
        let payload = serde_json::to_value(WebhookPayload { subject, body })
            .map_err(|e| NotifyError::Rejected(e.to_string()))?;
        post_json(&self.client, &self.url, &payload).await?;
        info!("Webhook notification dispatched successfully.");
        Ok(())
    }
}
