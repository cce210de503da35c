//! Prometheus metrics for Watchdeck

use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use watchdeck_core::ServiceStatus;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Probe metrics
    pub static ref PROBES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("watchdeck_probes_total", "Total service probes by outcome"),
        &["service", "status"]
    ).unwrap();

    // Snapshot metrics
    pub static ref SNAPSHOTS_INGESTED: IntCounter = IntCounter::new(
        "watchdeck_snapshots_ingested_total",
        "Total snapshot rows ingested"
    ).unwrap();

    pub static ref SNAPSHOT_INGEST_FAILURES: IntCounter = IntCounter::new(
        "watchdeck_snapshot_ingest_failures_total",
        "Total failed snapshot ingests"
    ).unwrap();

    // Notification metrics
    pub static ref NOTIFICATIONS_EMITTED: IntCounterVec = IntCounterVec::new(
        Opts::new("watchdeck_notifications_emitted_total", "Total notifications emitted"),
        &["kind"]
    ).unwrap();

    pub static ref NOTIFICATIONS_SUPPRESSED: IntCounterVec = IntCounterVec::new(
        Opts::new("watchdeck_notifications_suppressed_total", "Total notifications suppressed"),
        &["reason"]
    ).unwrap();

    pub static ref DELIVERY_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("watchdeck_delivery_failures_total", "Total notification delivery failures"),
        &["channel"]
    ).unwrap();
}

/// Register all metrics with the registry. Idempotent: re-registration of an
/// already-known collector is ignored.
pub fn register_metrics() {
    REGISTRY.register(Box::new(PROBES_TOTAL.clone())).ok();
    REGISTRY.register(Box::new(SNAPSHOTS_INGESTED.clone())).ok();
    REGISTRY
        .register(Box::new(SNAPSHOT_INGEST_FAILURES.clone()))
        .ok();
    REGISTRY
        .register(Box::new(NOTIFICATIONS_EMITTED.clone()))
        .ok();
    REGISTRY
        .register(Box::new(NOTIFICATIONS_SUPPRESSED.clone()))
        .ok();
    REGISTRY.register(Box::new(DELIVERY_FAILURES.clone())).ok();
}

/// Encode the registry in Prometheus text format.
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    encoder
        .encode_to_string(&REGISTRY.gather())
        .unwrap_or_default()
}

pub fn record_probe(service: &str, status: ServiceStatus) {
    PROBES_TOTAL
        .with_label_values(&[service, &status.to_string()])
        .inc();
}

pub fn record_snapshot_ingested() {
    SNAPSHOTS_INGESTED.inc();
}

pub fn record_ingest_failure() {
    SNAPSHOT_INGEST_FAILURES.inc();
}

pub fn record_notification_emitted(kind: &str) {
    NOTIFICATIONS_EMITTED.with_label_values(&[kind]).inc();
}

pub fn record_notification_suppressed(reason: &str) {
    NOTIFICATIONS_SUPPRESSED.with_label_values(&[reason]).inc();
}

pub fn record_delivery_failure(channel: &str) {
    DELIVERY_FAILURES.with_label_values(&[channel]).inc();
}
