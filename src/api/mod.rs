//! REST API for a finished scenario run.
//!
//! Provides three GET endpoints:
//! - `/state`: scenario config, playback summary, and latest tick
//! - `/telemetry`: every tick by session sequence number, with optional range filtering
//! - `/stations`: latest per-station allocation

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::config::ScenarioConfig;
use crate::runner::ScenarioRun;
use crate::sim::kpi::PlaybackSummary;
use crate::sim::types::TickResult;

pub use types::{
    ErrorResponse, StateResponse, StationsResponse, TelemetryQuery, TelemetryRecord,
};

/// Immutable application state shared across all request handlers.
///
/// Built once after the run completes and wrapped in `Arc`; nothing is
/// mutated afterwards so handlers take no locks.
pub struct AppState {
    /// Scenario configuration used for this run.
    pub config: ScenarioConfig,
    /// Summary over the whole session.
    pub summary: PlaybackSummary,
    /// Baseline then outage ticks; the position is the sequence number.
    pub results: Vec<TickResult>,
}

impl AppState {
    /// Collects a finished run into API state.
    pub fn from_run(config: ScenarioConfig, run: &ScenarioRun) -> Self {
        Self {
            config,
            summary: run.summary.clone(),
            results: run.results().cloned().collect(),
        }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/telemetry", get(handlers::get_telemetry))
        .route("/stations", get(handlers::get_stations))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process exits.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, router(state)).await
}
