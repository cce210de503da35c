//! Watchdeck Persistence
//!
//! SQLite-backed snapshot store: append-only rows of collected sections,
//! range queries with bucketed downsampling, and gated retention pruning.

mod database;
mod downsample;
mod error;
mod models;
mod repository;
mod series;
mod store;

pub use database::Database;
pub use downsample::downsample;
pub use error::{Result, StoreError};
pub use models::{IngestAck, SnapshotMeta, SnapshotRecord};
pub use repository::SnapshotRepository;
pub use series::{extract_series, SeriesPoint};
pub use store::{RetentionPolicy, SnapshotStore, ROW_CEILING};
