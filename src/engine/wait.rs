//! Waiting for the positions table to render its rows.

use super::locator::TableLocator;
use super::poll::{PollTimeout, Poller, Ready};
use super::rows::count_rows;
use crate::document::{Document, DocumentError, Element};
use crate::error::MonitorError;
use std::time::Duration;
use tracing::debug;

/// Poll until the located table has at least one row.
///
/// The page may render the table container before its rows arrive, so an
/// empty table is retried like a missing one. Errors from the document are
/// remembered and surface as the cause of [`MonitorError::TableNotFound`].
pub async fn await_ready_table(
    document: &dyn Document,
    locator: &TableLocator,
    budget: Duration,
    interval: Duration,
) -> Result<Element, MonitorError> {
    let outcome = Poller::new(budget, interval)
        .run(|attempt| async move {
            let table = match locator.locate(document).await {
                Ok(Some(table)) => table,
                Ok(None) => {
                    debug!("Perpetual positions table not ready (attempt {}). Retrying...", attempt);
                    return Ok(None);
                }
                Err(e) => {
                    debug!("Perpetual positions table not ready (attempt {}): {}", attempt, e);
                    return Err(e);
                }
            };

            let row_count = count_rows(document, &table).await?;
            if row_count == 0 {
                debug!("Perpetual positions table has no rows yet (attempt {}). Retrying...", attempt);
                return Ok(None);
            }

            debug!(
                "Located PERP table with {} row(s) on attempt {}.",
                row_count, attempt
            );
            Ok::<_, DocumentError>(Some(table))
        })
        .await;

    match outcome {
        Ok(Ready { value, .. }) => Ok(value),
        Err(PollTimeout {
            attempts,
            last_error,
        }) => Err(MonitorError::TableNotFound {
            attempts,
            last_error,
        }),
    }
}
