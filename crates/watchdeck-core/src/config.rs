//! Application configuration
//!
//! Deserialized from a TOML file; every section falls back to defaults so a
//! missing file yields a runnable local setup.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Environment variable holding the shared collector secret.
pub const COLLECTOR_SECRET_ENV: &str = "COLLECTOR_SECRET";

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub probe: ProbeConfig,
    pub collector: CollectorConfig,
    pub notifications: NotifyConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

/// HTTP API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8090,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Snapshot database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    /// Minimum seconds between retention sweeps.
    pub retention_cooldown_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/watchdeck.db".to_string(),
            retention_cooldown_secs: 24 * 60 * 60,
        }
    }
}

/// Outbound probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Hard timeout for one probe call.
    pub timeout_ms: u64,
    /// 2xx responses slower than this are classified degraded.
    pub degraded_threshold_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            degraded_threshold_ms: 3000,
        }
    }
}

/// A named collaborator service whose payload becomes one snapshot section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionEndpoint {
    pub name: String,
    pub url: String,
}

/// Snapshot collection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Seconds between collection ticks.
    pub interval_secs: u64,
    /// Shared secret for `POST /snapshot`; falls back to `COLLECTOR_SECRET`.
    pub secret: Option<String>,
    pub sections: Vec<SectionEndpoint>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            secret: None,
            sections: Vec::new(),
        }
    }
}

impl CollectorConfig {
    /// Resolve the collector secret from config or environment.
    pub fn resolve_secret(&self) -> Option<String> {
        if let Some(ref secret) = self.secret {
            if !secret.is_empty() {
                return Some(secret.clone());
            }
        }
        std::env::var(COLLECTOR_SECRET_ENV).ok().filter(|s| !s.is_empty())
    }
}

/// Notification engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub enabled: bool,
    /// Emit offline/recovered alerts on service transitions.
    pub service_down_alert: bool,
    /// PnL values at or below this emit a loss warning.
    pub loss_threshold: f64,
    /// Snapshot section and field the PnL metric is read from.
    pub pnl_section: String,
    pub pnl_field: String,
    /// Suppression window stamped on a fingerprint at dismissal.
    pub snooze_ms: u64,
    /// Auto-dismiss window for displayed notifications; 0 disables the timer.
    pub display_window_ms: u64,
    pub webhook: WebhookChannelConfig,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_down_alert: true,
            loss_threshold: -10.0,
            pnl_section: "make_money".to_string(),
            pnl_field: "totalPnL".to_string(),
            snooze_ms: 5 * 60 * 1000,
            display_window_ms: 10 * 1000,
            webhook: WebhookChannelConfig::default(),
        }
    }
}

/// Outbound webhook delivery channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookChannelConfig {
    pub enabled: bool,
    pub url: String,
}

impl Default for WebhookChannelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
        }
    }
}
