//! Pennybook - Offline-first trading journal
//!
//! Loads the journal's account, trade, and analytics data through the
//! offline caching layer and reports a portfolio summary.

use anyhow::Context;
use pennybook::{App, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging: console plus a daily file in the log directory
    let log_dir = pennybook::config::log_dir().context("could not determine log directory")?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "pennybook.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pennybook=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();

    // Load configuration
    let config = Config::load_or_default().context("failed to load configuration")?;

    // Run the application
    let app = App::new(config).await.context("failed to start")?;
    app.run().await?;
    app.shutdown()?;

    Ok(())
}
