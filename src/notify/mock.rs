//! Recording notifier for tests.

use super::{Notifier, NotifyError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Records every message; optionally fails every send.
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    failure: Option<NotifyError>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send fail with `error` (nothing is recorded).
    pub fn failing(error: NotifyError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// `(subject, body)` pairs in send order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((subject.to_string(), body.to_string()));
        }
        Ok(())
    }
}
