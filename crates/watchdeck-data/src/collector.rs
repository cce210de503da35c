//! Collects named section payloads for snapshot ingestion.
//!
//! Each configured collaborator endpoint is probed concurrently; the results
//! become one JSON blob per section. A failed probe yields an offline-shaped
//! envelope rather than an error, so ingestion always proceeds.

use crate::classifier;
use futures::future::join_all;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;
use watchdeck_core::{ProbeConfig, ProbeEnvelope, SectionEndpoint};

/// One collected section: the endpoint's name and its probe result.
#[derive(Debug, Clone)]
pub struct SectionSample {
    pub name: String,
    pub envelope: ProbeEnvelope<Value>,
}

/// Probes configured collaborator services and assembles snapshot sections.
pub struct SectionCollector {
    client: reqwest::Client,
    config: ProbeConfig,
    endpoints: Vec<SectionEndpoint>,
}

impl SectionCollector {
    pub fn new(endpoints: Vec<SectionEndpoint>, config: ProbeConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            config,
            endpoints,
        }
    }

    /// Probe every configured endpoint concurrently.
    pub async fn collect(&self) -> Vec<SectionSample> {
        join_all(self.endpoints.iter().map(|ep| self.sample(ep))).await
    }

    async fn sample(&self, endpoint: &SectionEndpoint) -> SectionSample {
        let request = self.client.get(&endpoint.url);
        let envelope = classifier::probe(|| request.send(), &self.config).await;

        debug!(
            section = %endpoint.name,
            status = %envelope.status,
            latency_ms = envelope.latency_ms,
            "section collected"
        );

        SectionSample {
            name: endpoint.name.clone(),
            envelope,
        }
    }

    /// Serialize samples into the `sections` map stored on a snapshot row.
    pub fn sections_map(samples: &[SectionSample]) -> Map<String, Value> {
        let mut sections = Map::new();
        for sample in samples {
            let blob = serde_json::to_value(&sample.envelope).unwrap_or_else(|e| {
                serde_json::json!({ "status": "offline", "error": e.to_string() })
            });
            sections.insert(sample.name.clone(), blob);
        }
        sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use watchdeck_core::ServiceStatus;

    fn endpoint(name: &str, url: &str) -> SectionEndpoint {
        SectionEndpoint {
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn test_collect_with_no_endpoints() {
        let collector = SectionCollector::new(Vec::new(), ProbeConfig::default());
        let samples = collector.collect().await;
        assert!(samples.is_empty());
        assert!(SectionCollector::sections_map(&samples).is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_offline_section() {
        // Nothing listens on port 1; the connection is refused immediately.
        let collector = SectionCollector::new(
            vec![endpoint("make_money", "http://127.0.0.1:1/portfolio")],
            ProbeConfig {
                timeout_ms: 2000,
                ..Default::default()
            },
        );

        let samples = collector.collect().await;
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].envelope.status, ServiceStatus::Offline);
        assert!(samples[0].envelope.error.is_some());
        assert!(samples[0].envelope.data.is_none());
    }

    #[test]
    fn test_sections_map_serializes_envelopes() {
        let samples = vec![SectionSample {
            name: "events".to_string(),
            envelope: ProbeEnvelope::offline("telegram HTTP 502", Utc::now(), 7),
        }];

        let sections = SectionCollector::sections_map(&samples);
        let blob = sections.get("events").unwrap();
        assert_eq!(blob["status"], "offline");
        assert_eq!(blob["error"], "telegram HTTP 502");
        assert_eq!(blob["latencyMs"], 7);
    }
}
