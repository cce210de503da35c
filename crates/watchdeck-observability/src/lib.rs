//! Watchdeck Observability
//!
//! Logging setup, Prometheus metrics, and the notification engine with its
//! delivery channels.

pub mod channel;
pub mod logging;
pub mod metrics;
pub mod notifications;

pub use channel::{DeliveryChannel, DeliveryError, WebhookChannel};
pub use logging::{init_default_logging, init_logging, LogFormat};
pub use notifications::{Notification, NotificationEngine, NotificationKind, HISTORY_CAP};
