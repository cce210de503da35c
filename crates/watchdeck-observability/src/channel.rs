//! Best-effort notification delivery channels.
//!
//! Delivery is fire-and-forget: a failing channel is logged and counted,
//! never surfaced to the code that raised the notification.

use crate::notifications::Notification;
use thiserror::Error;
use watchdeck_core::WebhookChannelConfig;

/// Delivery errors
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Channel not configured: {0}")]
    NotConfigured(String),
}

/// A notification delivery target
pub trait DeliveryChannel: Send + Sync {
    fn name(&self) -> &str;
    fn send(&self, notification: &Notification) -> Result<(), DeliveryError>;
    fn is_enabled(&self) -> bool;
}

/// Posts notifications as JSON to a configured webhook.
pub struct WebhookChannel {
    config: WebhookChannelConfig,
}

impl WebhookChannel {
    pub fn new(config: WebhookChannelConfig) -> Self {
        Self { config }
    }
}

impl DeliveryChannel for WebhookChannel {
    fn name(&self) -> &str {
        "webhook"
    }

    fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        if !self.is_enabled() {
            return Err(DeliveryError::NotConfigured("webhook".to_string()));
        }

        let payload = serde_json::json!({
            "id": notification.id,
            "kind": notification.kind,
            "title": notification.title,
            "message": notification.message,
            "timestamp": notification.timestamp,
            "fingerprint": notification.fingerprint,
        });

        ureq::post(&self.config.url)
            .set("Content-Type", "application/json")
            .send_string(&payload.to_string())
            .map(|_| ())
            .map_err(|e| DeliveryError::Http(e.to_string()))
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.url.is_empty()
    }
}
