//! Snapshot cacher binary.
//! Loads config, opens the file store and runs the ingest scheduler until Ctrl-C.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use snapshot_cacher::ingest::{self, config::load_config_default};
use snapshot_cacher::metrics::Metrics;
use snapshot_cacher::{FileStore, IngestObserver, MetricsObserver, NoopObserver, Store};

/// Compact logs by default, JSON lines when LOG_FORMAT=json.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("snapshot_cacher=info,ingest=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = load_config_default().context("loading snapshot config")?;
    tracing::info!(
        period_secs = cfg.period_secs,
        store_dir = %cfg.store_dir.display(),
        feeds = cfg.enabled_feeds().count(),
        "config loaded"
    );

    let store: Arc<dyn Store> = Arc::new(
        FileStore::open(&cfg.store_dir)
            .await
            .with_context(|| format!("opening store at {}", cfg.store_dir.display()))?,
    );

    let cancel = CancellationToken::new();

    let observer: Arc<dyn IngestObserver> = match cfg.metrics_addr {
        Some(addr) => {
            let metrics = Metrics::init()?;
            metrics.serve(addr, cancel.clone()).await?;
            Arc::new(MetricsObserver::new())
        }
        None => Arc::new(NoopObserver),
    };

    let client = reqwest::Client::builder()
        .user_agent(concat!("snapshot-cacher/", env!("CARGO_PKG_VERSION")))
        .timeout(cfg.fetch_timeout())
        .build()
        .context("building http client")?;

    let scheduler = ingest::build_scheduler(&cfg, store, &client, observer);

    if cfg.run_once {
        let report = scheduler.run_cycle().await;
        tracing::info!(stored = report.stored, delivered = report.delivered, "single cycle done");
        cancel.cancel();
        return Ok(());
    }

    let stop = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for ctrl-c; stop the process to exit");
            return;
        }
        tracing::info!("ctrl-c received, shutting down");
        stop.cancel();
    });

    scheduler.run(cancel).await;
    Ok(())
}
