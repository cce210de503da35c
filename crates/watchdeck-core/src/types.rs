//! Shared wire types: service status, probe envelopes, and range configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Health of a probed external service.
///
/// Variants are ordered by severity so multiple sub-statuses can be combined
/// into a single connection status: `unknown < online < degraded < offline`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    #[default]
    Unknown,
    Online,
    Degraded,
    Offline,
}

impl ServiceStatus {
    /// Combine multiple sub-service statuses into one overall status by
    /// picking the most severe. An empty input yields `Unknown`.
    pub fn combine<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = ServiceStatus>,
    {
        statuses.into_iter().max().unwrap_or(Self::Unknown)
    }

    /// Whether a probe with this status carries a decoded payload.
    pub fn carries_data(&self) -> bool {
        matches!(self, Self::Online | Self::Degraded)
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Online => write!(f, "online"),
            Self::Degraded => write!(f, "degraded"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

/// Uniform wrapper around any probe result.
///
/// `data` is populated iff the service answered with a decodable 2xx
/// response; `error` is set for offline probes and for latency-degraded ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeEnvelope<T> {
    pub data: Option<T>,
    pub status: ServiceStatus,
    pub fetched_at: DateTime<Utc>,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ProbeEnvelope<T> {
    /// Envelope for an unreachable or failed probe.
    pub fn offline(error: impl Into<String>, fetched_at: DateTime<Utc>, latency_ms: u64) -> Self {
        Self {
            data: None,
            status: ServiceStatus::Offline,
            fetched_at,
            latency_ms,
            error: Some(error.into()),
        }
    }
}

/// Supported chart/query time ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeKey {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

/// Downsampling parameters for one query range.
#[derive(Debug, Clone, Copy)]
pub struct RangeConfig {
    pub lookback: Duration,
    pub bucket_width: Duration,
    pub max_points: usize,
}

impl RangeKey {
    pub const ALL: [RangeKey; 3] = [RangeKey::Day, RangeKey::Week, RangeKey::Month];

    /// Lookback window, bucket width, and point budget for this range.
    pub const fn config(&self) -> RangeConfig {
        match self {
            RangeKey::Day => RangeConfig {
                lookback: Duration::from_secs(24 * 60 * 60),
                bucket_width: Duration::from_secs(5 * 60),
                max_points: 288,
            },
            RangeKey::Week => RangeConfig {
                lookback: Duration::from_secs(7 * 24 * 60 * 60),
                bucket_width: Duration::from_secs(30 * 60),
                max_points: 336,
            },
            RangeKey::Month => RangeConfig {
                lookback: Duration::from_secs(30 * 24 * 60 * 60),
                bucket_width: Duration::from_secs(60 * 60),
                max_points: 720,
            },
        }
    }

    /// The longest supported lookback; doubles as the retention horizon.
    pub const fn longest_lookback() -> Duration {
        RangeKey::Month.config().lookback
    }

    /// Parse a range parameter, falling back to `24h` for unknown input.
    pub fn parse_lossy(s: &str) -> Self {
        s.parse().unwrap_or(RangeKey::Day)
    }
}

impl std::fmt::Display for RangeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Day => write!(f, "24h"),
            Self::Week => write!(f, "7d"),
            Self::Month => write!(f, "30d"),
        }
    }
}

impl std::str::FromStr for RangeKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "24h" => Ok(Self::Day),
            "7d" => Ok(Self::Week),
            "30d" => Ok(Self::Month),
            other => Err(format!("unknown range: {other}")),
        }
    }
}
