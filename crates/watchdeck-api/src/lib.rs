//! Watchdeck API
//!
//! Axum HTTP surface: snapshot ingest/query, health, and metrics endpoints.

mod handlers;
mod response;
mod server;
mod state;

pub use response::{ApiResponse, SnapshotQueryResponse};
pub use server::{create_router, ApiServer};
pub use state::{AppState, DashboardHealth};
