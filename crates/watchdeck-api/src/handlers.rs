//! HTTP handlers for snapshot ingest, query, health, and metrics.

use crate::response::{ApiResponse, SnapshotQueryResponse};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{error, info};
use watchdeck_core::{RangeKey, ServiceStatus};
use watchdeck_data::SectionCollector;
use watchdeck_observability::metrics::{
    record_ingest_failure, record_probe, record_snapshot_ingested, render_metrics,
};
use watchdeck_persistence::IngestAck;

/// `POST /snapshot` — gather collaborator payloads and append one row.
///
/// The request body is ignored; authorization happens in middleware.
pub async fn ingest_snapshot(State(state): State<AppState>) -> impl IntoResponse {
    let started = Instant::now();

    let samples = state.collector().collect().await;
    for sample in &samples {
        record_probe(&sample.name, sample.envelope.status);
    }
    let connection = ServiceStatus::combine(samples.iter().map(|s| s.envelope.status));
    let sections = SectionCollector::sections_map(&samples);

    match state.store().ingest(sections).await {
        Ok(ack) => {
            record_snapshot_ingested();
            state.health().record_snapshot(ack.created_at, connection);
            info!(id = ack.id, connection = %connection, "snapshot ingested");
            (StatusCode::OK, Json(ApiResponse::online(ack, started))).into_response()
        }
        Err(e) => {
            record_ingest_failure();
            error!(error = %e, "snapshot insert failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<IngestAck>::offline(e.to_string(), started)),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RangeParams {
    range: Option<String>,
}

/// `GET /snapshot?range=24h|7d|30d` — downsampled rows for the range.
/// Unknown or missing range falls back to `24h`.
pub async fn query_snapshots(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> impl IntoResponse {
    let started = Instant::now();
    let range = params
        .range
        .as_deref()
        .map(RangeKey::parse_lossy)
        .unwrap_or(RangeKey::Day);

    match state.store().query(range).await {
        Ok((rows, meta)) => (
            StatusCode::OK,
            Json(SnapshotQueryResponse {
                response: ApiResponse::online(rows, started),
                meta,
            }),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, %range, "snapshot fetch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Vec<serde_json::Value>>::offline(
                    e.to_string(),
                    started,
                )),
            )
                .into_response()
        }
    }
}

/// Basic liveness check - returns 200 OK if server is running
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatusBody {
    pub status: ServiceStatus,
    pub uptime_secs: u64,
    pub last_snapshot_at: Option<DateTime<Utc>>,
}

/// Detailed status check - combined connection status and last ingest time
pub async fn health_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthStatusBody {
        status: state.health().connection(),
        uptime_secs: state.uptime_secs(),
        last_snapshot_at: state.health().last_snapshot_at(),
    })
}

/// Prometheus metrics in text format
pub async fn metrics_endpoint() -> impl IntoResponse {
    render_metrics()
}
