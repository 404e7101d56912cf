use anyhow::Context;
use hypewatch::notify::build_notifier;
use hypewatch::{Config, Monitor, WebDriverSource};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env().context("Configuration error")?;

    let source = Arc::new(WebDriverSource::from_config(&config));
    let notifier = build_notifier(&config.notifier);
    let monitor = Monitor::new(config, source, notifier);

    tracing::info!("Starting Hyperliquid threshold monitor.");
    let report = monitor
        .run_cycle()
        .await
        .context("Monitoring cycle failed")?;

    tracing::info!(
        "Cycle {} sent {:?} message ({} position(s), {} above threshold)",
        report.cycle_id,
        report.message.kind,
        report.positions.len(),
        report.exceeding
    );
    Ok(())
}
