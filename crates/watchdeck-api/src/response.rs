//! Standard API response envelope.
//!
//! Every endpoint answers with the same wrapper the probe envelope uses on
//! the wire: payload, service status, fetch time, and per-request response
//! time. "Service is down" is a normal response body, not an exception.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use watchdeck_core::ServiceStatus;
use watchdeck_persistence::{SnapshotMeta, SnapshotRecord};

/// Response wrapper shared by all API endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub status: ServiceStatus,
    pub fetched_at: DateTime<Utc>,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn online(data: T, started: Instant) -> Self {
        Self {
            data: Some(data),
            status: ServiceStatus::Online,
            fetched_at: Utc::now(),
            response_time_ms: started.elapsed().as_millis() as u64,
            error: None,
        }
    }

    pub fn offline(error: impl Into<String>, started: Instant) -> Self {
        Self {
            data: None,
            status: ServiceStatus::Offline,
            fetched_at: Utc::now(),
            response_time_ms: started.elapsed().as_millis() as u64,
            error: Some(error.into()),
        }
    }
}

/// Query response: downsampled rows plus metadata about the fetched set.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotQueryResponse {
    #[serde(flatten)]
    pub response: ApiResponse<Vec<SnapshotRecord>>,
    pub meta: SnapshotMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_online_wire_shape() {
        let response = ApiResponse::online(serde_json::json!({"id": 7}), Instant::now());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "online");
        assert_eq!(json["data"]["id"], 7);
        assert!(json.get("fetchedAt").is_some());
        assert!(json.get("responseTimeMs").is_some());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_offline_wire_shape() {
        let response: ApiResponse<Value> = ApiResponse::offline("Unauthorized", Instant::now());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "offline");
        assert!(json["data"].is_null());
        assert_eq!(json["error"], "Unauthorized");
    }

    #[test]
    fn test_query_response_flattens_envelope() {
        let response = SnapshotQueryResponse {
            response: ApiResponse::online(Vec::new(), Instant::now()),
            meta: SnapshotMeta {
                total_rows: 0,
                oldest_at: None,
                newest_at: None,
            },
        };
        let json = serde_json::to_value(&response).unwrap();

        assert!(json.get("data").is_some());
        assert_eq!(json["meta"]["totalRows"], 0);
        assert!(json["meta"]["oldestAt"].is_null());
    }
}
