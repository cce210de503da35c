//! Notification engine
//!
//! Derives deduplicated, snoozable alerts from service status transitions
//! and metric threshold crossings. The engine is passive: callers feed it
//! observations (`check_service_transition`, `check_threshold`); it never
//! polls anything itself.
//!
//! Suppression model: dismissing a notification (manually or via the
//! auto-dismiss timer) snoozes its fingerprint for a fixed window. An
//! offline service therefore re-alerts after each snooze expiry for as long
//! as it stays down. Snooze state is process-local; across processes each
//! instance alerts independently.

use crate::channel::{DeliveryChannel, WebhookChannel};
use crate::metrics::{
    record_delivery_failure, record_notification_emitted, record_notification_suppressed,
};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use watchdeck_core::{NotifyConfig, ServiceStatus};

/// Notification history retained, most recent first.
pub const HISTORY_CAP: usize = 10;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Warning,
    Error,
    Info,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// One raised alert.
///
/// The fingerprint identifies the underlying condition (service + alert
/// kind), not the message text, so repeated occurrences collapse into one
/// suppressible stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub dismissed: bool,
    pub fingerprint: String,
}

#[cfg(test)]
impl Notification {
    pub fn test_fixture(fingerprint: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: NotificationKind::Warning,
            title: "test".to_string(),
            message: "test".to_string(),
            timestamp: Utc::now(),
            dismissed: false,
            fingerprint: fingerprint.to_string(),
        }
    }
}

struct EngineState {
    notifications: VecDeque<Notification>,
    last_service_state: HashMap<String, ServiceStatus>,
    offline_since: HashMap<String, DateTime<Utc>>,
    snoozed_until: HashMap<String, DateTime<Utc>>,
}

struct EngineInner {
    config: NotifyConfig,
    state: Mutex<EngineState>,
    timers: Mutex<HashMap<String, JoinHandle<()>>>,
    channels: Vec<Box<dyn DeliveryChannel>>,
}

/// Notification engine handle. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct NotificationEngine {
    inner: Arc<EngineInner>,
}

impl NotificationEngine {
    /// Build an engine with channels derived from configuration.
    pub fn new(config: NotifyConfig) -> Self {
        let mut channels: Vec<Box<dyn DeliveryChannel>> = Vec::new();
        if config.webhook.enabled {
            channels.push(Box::new(WebhookChannel::new(config.webhook.clone())));
        }
        Self::with_channels(config, channels)
    }

    pub fn with_channels(config: NotifyConfig, channels: Vec<Box<dyn DeliveryChannel>>) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                config,
                state: Mutex::new(EngineState {
                    notifications: VecDeque::with_capacity(HISTORY_CAP),
                    last_service_state: HashMap::new(),
                    offline_since: HashMap::new(),
                    snoozed_until: HashMap::new(),
                }),
                timers: Mutex::new(HashMap::new()),
                channels,
            }),
        }
    }

    /// Feed one observed service status.
    ///
    /// Offline emits an error alert whose message carries how long the
    /// service has been down; any change back to a non-offline status emits
    /// a recovery info alert.
    pub fn check_service_transition(&self, service: &str, status: ServiceStatus) {
        self.check_service_transition_at(service, status, Utc::now());
    }

    fn check_service_transition_at(
        &self,
        service: &str,
        status: ServiceStatus,
        now: DateTime<Utc>,
    ) {
        if !self.inner.config.enabled || !self.inner.config.service_down_alert {
            return;
        }

        let (previous, pending) = {
            let mut state = self.inner.state.lock();
            let previous = state.last_service_state.get(service).copied();

            let pending = if status == ServiceStatus::Offline {
                let since = *state
                    .offline_since
                    .entry(service.to_string())
                    .or_insert(now);
                let elapsed_minutes = ((now - since).num_seconds() / 60).max(1);
                Some((
                    NotificationKind::Error,
                    format!("{service} offline"),
                    format!("{service} offline for {elapsed_minutes}m"),
                    format!("service-offline:{service}"),
                    false,
                ))
            } else {
                state.offline_since.remove(service);
                previous
                    .filter(|prev| *prev != status)
                    .map(|_| {
                        (
                            NotificationKind::Info,
                            format!("{service} recovered"),
                            format!("{service} status changed to {status}"),
                            format!("service-recovered:{service}"),
                            false,
                        )
                    })
            };

            state
                .last_service_state
                .insert(service.to_string(), status);
            (previous, pending)
        };

        if let Some((kind, title, message, fingerprint, single_slot)) = pending {
            debug!(service, ?previous, %status, "service transition");
            self.emit(kind, title, message, fingerprint, single_slot, now);
        }
    }

    /// Feed one observed metric value; at or below `threshold` raises a
    /// loss warning. The fixed fingerprint keeps a single active slot:
    /// repeat crossings never duplicate an undismissed entry.
    pub fn check_threshold(&self, value: f64, threshold: f64) {
        self.check_threshold_at(value, threshold, Utc::now());
    }

    fn check_threshold_at(&self, value: f64, threshold: f64, now: DateTime<Utc>) {
        if !self.inner.config.enabled {
            return;
        }
        if value <= threshold {
            self.emit(
                NotificationKind::Warning,
                "PnL loss warning".to_string(),
                format!("P&L {value:.2}$ (threshold {threshold}$)"),
                "pnl-threshold".to_string(),
                true,
                now,
            );
        }
    }

    fn emit(
        &self,
        kind: NotificationKind,
        title: String,
        message: String,
        fingerprint: String,
        single_slot: bool,
        now: DateTime<Utc>,
    ) {
        let notification = {
            let mut state = self.inner.state.lock();

            if let Some(&until) = state.snoozed_until.get(&fingerprint) {
                if now < until {
                    debug!(%fingerprint, %until, "notification snoozed");
                    record_notification_suppressed("snoozed");
                    return;
                }
            }

            if single_slot
                && state
                    .notifications
                    .iter()
                    .any(|n| !n.dismissed && n.fingerprint == fingerprint)
            {
                record_notification_suppressed("active_duplicate");
                return;
            }

            let notification = Notification {
                id: uuid::Uuid::new_v4().to_string(),
                kind,
                title,
                message,
                timestamp: now,
                dismissed: false,
                fingerprint,
            };

            state.notifications.push_front(notification.clone());
            state.notifications.truncate(HISTORY_CAP);
            notification
        };

        record_notification_emitted(&kind.to_string());
        self.deliver(&notification);
        self.schedule_auto_dismiss(&notification.id);
    }

    fn deliver(&self, notification: &Notification) {
        for channel in &self.inner.channels {
            if !channel.is_enabled() {
                continue;
            }
            if let Err(e) = channel.send(notification) {
                record_delivery_failure(channel.name());
                warn!(channel = channel.name(), error = %e, "notification delivery failed");
            }
        }
    }

    /// Schedule the display-window auto-dismiss for a fresh notification.
    /// Requires an ambient tokio runtime; without one dismissal stays manual.
    fn schedule_auto_dismiss(&self, id: &str) {
        let window_ms = self.inner.config.display_window_ms;
        if window_ms == 0 {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let engine = self.clone();
        let id = id.to_string();
        let task_id = id.clone();
        let task = handle.spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(window_ms)).await;
            engine.dismiss(&id);
        });

        self.inner.timers.lock().insert(task_id, task);
    }

    /// Dismiss one notification and snooze its fingerprint.
    pub fn dismiss(&self, id: &str) {
        self.dismiss_at(id, Utc::now());
    }

    fn dismiss_at(&self, id: &str, now: DateTime<Utc>) {
        let snooze_until = now + Duration::milliseconds(self.inner.config.snooze_ms as i64);
        {
            let mut state = self.inner.state.lock();
            let mut fingerprint = None;
            if let Some(n) = state.notifications.iter_mut().find(|n| n.id == id) {
                if !n.dismissed {
                    n.dismissed = true;
                    fingerprint = Some(n.fingerprint.clone());
                }
            }
            if let Some(fingerprint) = fingerprint {
                state.snoozed_until.insert(fingerprint, snooze_until);
            }
        }

        if let Some(task) = self.inner.timers.lock().remove(id) {
            task.abort();
        }
    }

    /// Dismiss every undismissed notification and snooze their fingerprints.
    pub fn dismiss_all(&self) {
        self.dismiss_all_at(Utc::now());
    }

    fn dismiss_all_at(&self, now: DateTime<Utc>) {
        let snooze_until = now + Duration::milliseconds(self.inner.config.snooze_ms as i64);
        let dismissed_ids = {
            let mut state = self.inner.state.lock();
            let mut snoozed = Vec::new();
            let mut ids = Vec::new();
            for n in state.notifications.iter_mut().filter(|n| !n.dismissed) {
                n.dismissed = true;
                snoozed.push(n.fingerprint.clone());
                ids.push(n.id.clone());
            }
            for fingerprint in snoozed {
                state.snoozed_until.insert(fingerprint, snooze_until);
            }
            ids
        };

        let mut timers = self.inner.timers.lock();
        for id in dismissed_ids {
            if let Some(task) = timers.remove(&id) {
                task.abort();
            }
        }
    }

    /// Full retained history, most recent first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.state.lock().notifications.iter().cloned().collect()
    }

    /// Undismissed notifications, most recent first. Renderers cap the
    /// visible count themselves.
    pub fn active(&self) -> Vec<Notification> {
        self.inner
            .state
            .lock()
            .notifications
            .iter()
            .filter(|n| !n.dismissed)
            .cloned()
            .collect()
    }

    pub fn has_unread(&self) -> bool {
        self.inner
            .state
            .lock()
            .notifications
            .iter()
            .any(|n| !n.dismissed)
    }

    /// Last observed status for a service, if any.
    pub fn last_status(&self, service: &str) -> Option<ServiceStatus> {
        self.inner
            .state
            .lock()
            .last_service_state
            .get(service)
            .copied()
    }
}
