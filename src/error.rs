use crate::document::DocumentError;
use crate::notify::NotifyError;
use thiserror::Error;

/// Failure of a monitoring cycle.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// No populated positions table appeared within the wait budget.
    #[error("Perpetual positions table not found before timeout ({attempts} attempt(s))")]
    TableNotFound {
        attempts: u32,
        #[source]
        last_error: Option<DocumentError>,
    },
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("notification failed: {0}")]
    Notify(#[from] NotifyError),
}
