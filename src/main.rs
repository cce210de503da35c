//! Watchdeck - Workspace Status Dashboard Core
//!
//! Probes collaborator services, persists periodic snapshots, serves them
//! back downsampled, and raises notifications on outages and loss thresholds.

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{error, info};
use watchdeck_api::{ApiServer, AppState};
use watchdeck_core::{AppConfig, ServiceStatus};
use watchdeck_data::{SectionCollector, SectionSample};
use watchdeck_observability::metrics::{
    record_ingest_failure, record_probe, record_snapshot_ingested, register_metrics,
};
use watchdeck_observability::{init_default_logging, NotificationEngine};
use watchdeck_persistence::{Database, RetentionPolicy, SnapshotStore};

/// Configuration file path
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Main application state
struct App {
    config: AppConfig,
    state: AppState,
    engine: NotificationEngine,
}

impl App {
    /// Create a new application instance
    async fn new() -> Result<Self> {
        let config = Self::load_config()?;

        let db = Database::new(&config.database.path)
            .await
            .context("Failed to open snapshot database")?;

        let store = SnapshotStore::with_retention(
            db,
            RetentionPolicy {
                cooldown: Duration::from_secs(config.database.retention_cooldown_secs),
                ..Default::default()
            },
        );

        let collector =
            SectionCollector::new(config.collector.sections.clone(), config.probe.clone());
        let engine = NotificationEngine::new(config.notifications.clone());

        let secret = config.collector.resolve_secret();
        if secret.is_none() {
            info!("No collector secret configured; POST /snapshot is closed");
        }

        let state = AppState::new(store, collector, secret);

        Ok(Self {
            config,
            state,
            engine,
        })
    }

    /// Load main configuration
    fn load_config() -> Result<AppConfig> {
        let config_path =
            std::env::var("WATCHDECK_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        if std::path::Path::new(&config_path).exists() {
            AppConfig::load(&config_path)
                .with_context(|| format!("Failed to load config file: {}", config_path))
        } else {
            info!("Config file not found, using defaults");
            Ok(AppConfig::default())
        }
    }

    /// Run the API server and collection loop until Ctrl-C
    async fn run(self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let server = ApiServer::new(&self.config.server, self.state.clone(), shutdown_rx);
        let server_handle = server.spawn();

        let period = Duration::from_secs(self.config.collector.interval_secs.max(1));
        let mut ticker = interval(period);

        info!(
            interval_secs = period.as_secs(),
            sections = self.config.collector.sections.len(),
            "Collection loop started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => self.collect_tick().await,
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        let _ = shutdown_tx.send(true);
        let _ = server_handle.await;
        Ok(())
    }

    /// One collection tick: probe collaborators, feed the notification
    /// engine, and append a snapshot row.
    async fn collect_tick(&self) {
        let samples = self.state.collector().collect().await;

        for sample in &samples {
            record_probe(&sample.name, sample.envelope.status);
            self.engine
                .check_service_transition(&sample.name, sample.envelope.status);
        }

        if let Some(value) = self.pnl_value(&samples) {
            self.engine
                .check_threshold(value, self.config.notifications.loss_threshold);
        }

        let connection = ServiceStatus::combine(samples.iter().map(|s| s.envelope.status));
        let sections = SectionCollector::sections_map(&samples);

        match self.state.store().ingest(sections).await {
            Ok(ack) => {
                record_snapshot_ingested();
                self.state
                    .health()
                    .record_snapshot(ack.created_at, connection);
                info!(id = ack.id, connection = %connection, "snapshot ingested");
            }
            Err(e) => {
                record_ingest_failure();
                error!(error = %e, "snapshot ingest failed");
            }
        }
    }

    /// Read the configured PnL metric out of the collected samples.
    fn pnl_value(&self, samples: &[SectionSample]) -> Option<f64> {
        let notifications = &self.config.notifications;
        let sample = samples
            .iter()
            .find(|s| s.name == notifications.pnl_section)?;
        let data = sample.envelope.data.as_ref()?;
        data.get(&notifications.pnl_field)?.as_f64()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_default_logging();
    register_metrics();

    info!("Starting Watchdeck");

    let app = App::new().await?;
    app.run().await
}
