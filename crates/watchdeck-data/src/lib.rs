//! Watchdeck Data
//!
//! Outbound HTTP: probe classification and snapshot section collection.

mod classifier;
mod collector;

pub use classifier::probe;
pub use collector::{SectionCollector, SectionSample};
