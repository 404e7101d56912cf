use super::{Notifier, NotifyError};
use async_trait::async_trait;
use tracing::info;

/// Writes messages to the log instead of delivering them (dry run).
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!(subject, "Notification (log only):\n{}", body);
        Ok(())
    }
}
