//! Probe classification for external collaborator services.
//!
//! Wraps an outbound HTTP call and infers a `ServiceStatus` from the outcome:
//!
//! - 2xx under the latency threshold -> online
//! - 2xx at or over the latency threshold -> degraded (payload kept)
//! - non-2xx -> offline with `HTTP <code> <reason>`
//! - transport failure, timeout, or undecodable body -> offline
//!
//! Failures never surface as errors to the caller; a down service is a
//! normal, observable envelope.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::debug;
use watchdeck_core::{ProbeConfig, ProbeEnvelope, ServiceStatus};

/// Run `call` under a hard timeout and classify the result.
///
/// The timeout cancels the in-flight request; latency is wall-clock from
/// call start to decoded body.
pub async fn probe<T, F, Fut>(call: F, config: &ProbeConfig) -> ProbeEnvelope<T>
where
    T: DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let fetched_at = Utc::now();
    let start = Instant::now();
    let timeout = Duration::from_millis(config.timeout_ms);

    let response = match tokio::time::timeout(timeout, call()).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            return offline(e.to_string(), fetched_at, start);
        }
        Err(_) => {
            return offline(
                format!("timeout after {}ms", config.timeout_ms),
                fetched_at,
                start,
            );
        }
    };

    let status = response.status();
    if !status.is_success() {
        let reason = status.canonical_reason().unwrap_or("Unknown");
        return offline(
            format!("HTTP {} {}", status.as_u16(), reason),
            fetched_at,
            start,
        );
    }

    let data: T = match response.json().await {
        Ok(data) => data,
        Err(e) => return offline(format!("invalid JSON body: {e}"), fetched_at, start),
    };

    let latency_ms = elapsed_ms(start);
    if latency_ms >= config.degraded_threshold_ms {
        debug!(latency_ms, threshold_ms = config.degraded_threshold_ms, "slow probe");
        ProbeEnvelope {
            data: Some(data),
            status: ServiceStatus::Degraded,
            fetched_at,
            latency_ms,
            error: Some(format!(
                "latency {}ms exceeds threshold ({}ms)",
                latency_ms, config.degraded_threshold_ms
            )),
        }
    } else {
        ProbeEnvelope {
            data: Some(data),
            status: ServiceStatus::Online,
            fetched_at,
            latency_ms,
            error: None,
        }
    }
}

fn offline<T>(error: String, fetched_at: DateTime<Utc>, start: Instant) -> ProbeEnvelope<T> {
    ProbeEnvelope::offline(error, fetched_at, elapsed_ms(start))
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn response(status: u16, body: &'static str) -> reqwest::Response {
        reqwest::Response::from(
            http::Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(body)
                .unwrap(),
        )
    }

    fn config(timeout_ms: u64, degraded_threshold_ms: u64) -> ProbeConfig {
        ProbeConfig {
            timeout_ms,
            degraded_threshold_ms,
        }
    }

    #[tokio::test]
    async fn test_fast_2xx_is_online() {
        let envelope: ProbeEnvelope<Value> =
            probe(|| async { Ok(response(200, r#"{"balance": 42}"#)) }, &config(5000, 3000)).await;

        assert_eq!(envelope.status, ServiceStatus::Online);
        assert_eq!(envelope.data.unwrap()["balance"], 42);
        assert!(envelope.error.is_none());
    }

    #[tokio::test]
    async fn test_slow_2xx_is_degraded_with_latency_error() {
        let envelope: ProbeEnvelope<Value> = probe(
            || async {
                tokio::time::sleep(Duration::from_millis(30)).await;
                Ok(response(200, r#"{"ok": true}"#))
            },
            &config(5000, 10),
        )
        .await;

        assert_eq!(envelope.status, ServiceStatus::Degraded);
        assert!(envelope.data.is_some());
        let error = envelope.error.unwrap();
        assert!(error.contains("exceeds threshold"), "got: {error}");
        assert!(error.contains("(10ms)"), "got: {error}");
        assert!(envelope.latency_ms >= 10);
    }

    #[tokio::test]
    async fn test_non_2xx_is_offline_regardless_of_latency() {
        let envelope: ProbeEnvelope<Value> = probe(
            || async { Ok(response(503, r#"{"ignored": true}"#)) },
            &config(5000, 3000),
        )
        .await;

        assert_eq!(envelope.status, ServiceStatus::Offline);
        assert!(envelope.data.is_none());
        assert_eq!(envelope.error.as_deref(), Some("HTTP 503 Service Unavailable"));
    }

    #[tokio::test]
    async fn test_timeout_is_offline_with_timeout_error() {
        let envelope: ProbeEnvelope<Value> = probe(
            || async { std::future::pending::<Result<reqwest::Response, reqwest::Error>>().await },
            &config(50, 3000),
        )
        .await;

        assert_eq!(envelope.status, ServiceStatus::Offline);
        assert_eq!(envelope.error.as_deref(), Some("timeout after 50ms"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_offline() {
        let envelope: ProbeEnvelope<Value> = probe(
            || async { Ok(response(200, "not json at all")) },
            &config(5000, 3000),
        )
        .await;

        assert_eq!(envelope.status, ServiceStatus::Offline);
        assert!(envelope.error.unwrap().contains("invalid JSON body"));
    }
}
