//! Shared state for API handlers.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use watchdeck_core::ServiceStatus;
use watchdeck_data::SectionCollector;
use watchdeck_persistence::SnapshotStore;

/// Live dashboard health: combined connection status and last ingest time.
#[derive(Clone, Default)]
pub struct DashboardHealth {
    inner: Arc<RwLock<HealthInner>>,
}

#[derive(Default)]
struct HealthInner {
    connection: ServiceStatus,
    last_snapshot_at: Option<DateTime<Utc>>,
}

impl DashboardHealth {
    /// Record a completed ingest and the combined status it observed.
    pub fn record_snapshot(&self, at: DateTime<Utc>, connection: ServiceStatus) {
        let mut inner = self.inner.write();
        inner.last_snapshot_at = Some(at);
        inner.connection = connection;
    }

    pub fn connection(&self) -> ServiceStatus {
        self.inner.read().connection
    }

    pub fn last_snapshot_at(&self) -> Option<DateTime<Utc>> {
        self.inner.read().last_snapshot_at
    }
}

/// Shared state for all API handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: SnapshotStore,
    collector: SectionCollector,
    secret: Option<String>,
    health: DashboardHealth,
    started_at: Instant,
}

impl AppState {
    pub fn new(store: SnapshotStore, collector: SectionCollector, secret: Option<String>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                collector,
                secret,
                health: DashboardHealth::default(),
                started_at: Instant::now(),
            }),
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.inner.store
    }

    pub fn collector(&self) -> &SectionCollector {
        &self.inner.collector
    }

    pub fn secret(&self) -> Option<&str> {
        self.inner.secret.as_deref()
    }

    pub fn health(&self) -> &DashboardHealth {
        &self.inner.health
    }

    pub fn uptime_secs(&self) -> u64 {
        self.inner.started_at.elapsed().as_secs()
    }
}
