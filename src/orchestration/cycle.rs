use crate::config::Config;
use crate::document::{Document, DocumentSource};
use crate::domain::Position;
use crate::engine::{
    await_ready_table, build_positions, collect_rows, compose_message, exceeding_positions,
    position_summary, AlertMessage, TableLocator,
};
use crate::error::MonitorError;
use crate::notify::Notifier;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Outcome of one completed cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub positions: Vec<Position>,
    /// Number of positions above the threshold.
    pub exceeding: usize,
    /// Rows dropped because a required field was missing.
    pub rejected_rows: usize,
    pub message: AlertMessage,
}

/// Runs monitoring cycles: load page, extract positions, evaluate, notify.
///
/// Holds no state between cycles.
#[derive(Debug)]
pub struct Monitor {
    config: Config,
    source: Arc<dyn DocumentSource>,
    notifier: Arc<dyn Notifier>,
    locator: TableLocator,
}

/// Positions scraped from the page along with the number of dropped rows.
struct Extraction {
    positions: Vec<Position>,
    rejected_rows: usize,
}

impl Monitor {
    pub fn new(config: Config, source: Arc<dyn DocumentSource>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config,
            source,
            notifier,
            locator: TableLocator::default(),
        }
    }

    /// Replace the default heading/header-keyword locator.
    pub fn with_locator(mut self, locator: TableLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one full cycle. Any error aborts the cycle; nothing is retried here.
    pub async fn run_cycle(&self) -> Result<CycleReport, MonitorError> {
        let cycle_id = Uuid::new_v4();
        self.run_cycle_inner(cycle_id)
            .instrument(info_span!("cycle", id = %cycle_id))
            .await
    }

    async fn run_cycle_inner(&self, cycle_id: Uuid) -> Result<CycleReport, MonitorError> {
        let Extraction {
            positions,
            rejected_rows,
        } = self.scrape_positions().await?;

        for position in &positions {
            debug!("{}", position_summary(position));
        }

        let threshold = self.config.position_value_threshold;
        let exceeding = exceeding_positions(&positions, threshold);
        let message = compose_message(&exceeding, threshold);
        let exceeding = exceeding.len();

        info!("Sending notification: {}", message.subject);
        self.notifier.send(&message.subject, &message.body).await?;
        info!(
            positions = positions.len(),
            exceeding, rejected_rows, "Monitoring cycle complete."
        );

        Ok(CycleReport {
            cycle_id,
            positions,
            exceeding,
            rejected_rows,
            message,
        })
    }

    /// Open the page, extract positions, and always release the browser.
    async fn scrape_positions(&self) -> Result<Extraction, MonitorError> {
        let document = self.source.open(&self.config.source_url).await?;
        let result = self.extract(document.as_ref()).await;
        if let Err(e) = document.close().await {
            warn!("Failed to close browser session: {}", e);
        }
        result
    }

    async fn extract(&self, document: &dyn Document) -> Result<Extraction, MonitorError> {
        let table = await_ready_table(
            document,
            &self.locator,
            self.config.table_wait,
            self.config.poll_interval,
        )
        .await?;

        let rows = collect_rows(document, &table).await?;
        let report = build_positions(&rows);
        info!("Extracted {} perpetual position(s).", report.positions.len());

        Ok(Extraction {
            positions: report.positions,
            rejected_rows: report.rejected.len(),
        })
    }
}
