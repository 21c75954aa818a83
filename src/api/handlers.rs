//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{
    ErrorResponse, StateResponse, StationsResponse, TelemetryQuery, TelemetryRecord,
};

/// Returns scenario config, summary, and the latest tick.
///
/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    let latest = state
        .results
        .len()
        .checked_sub(1)
        .map(|seq| TelemetryRecord::new(seq, &state.results[seq]));

    Json(StateResponse {
        config: state.config.clone(),
        summary: state.summary.clone(),
        latest_tick: latest,
    })
}

/// Returns tick records, optionally filtered by sequence range.
///
/// `GET /telemetry` → 200 + `Vec<TelemetryRecord>` JSON
/// `GET /telemetry?from=N&to=M` → filtered range (inclusive)
/// `GET /telemetry?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_telemetry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TelemetryQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `to` ({to})"),
            }),
        ));
    }

    let records: Vec<TelemetryRecord> = state
        .results
        .iter()
        .enumerate()
        .skip(from)
        .take_while(|(seq, _)| *seq <= to)
        .map(|(seq, tick)| TelemetryRecord::new(seq, tick))
        .collect();

    Ok(Json(records))
}

/// Returns the latest allocation of every station.
///
/// `GET /stations` → 200 + `StationsResponse` JSON
pub async fn get_stations(State(state): State<Arc<AppState>>) -> Json<StationsResponse> {
    let latest = state.results.last();
    Json(StationsResponse {
        timestamp: latest.map(|t| t.timestamp.clone()),
        stations: latest.map(|t| t.stations.clone()).unwrap_or_default(),
    })
}
