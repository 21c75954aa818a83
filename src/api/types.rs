//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::config::ScenarioConfig;
use crate::sim::kpi::PlaybackSummary;
use crate::sim::stations::StationAllocation;
use crate::sim::types::TickResult;

/// Combined state response: config, summary, and latest tick.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    /// Scenario configuration.
    pub config: ScenarioConfig,
    /// Session summary.
    pub summary: PlaybackSummary,
    /// Most recent tick, absent before any tick ran.
    pub latest_tick: Option<TelemetryRecord>,
}

/// One tick with its position in the session.
///
/// `tick_index` restarts with every run; `seq` does not.
#[derive(Debug, Serialize)]
pub struct TelemetryRecord {
    /// Sequence number across the whole session.
    pub seq: usize,
    #[serde(flatten)]
    pub tick: TickResult,
}

impl TelemetryRecord {
    pub fn new(seq: usize, tick: &TickResult) -> Self {
        Self {
            seq,
            tick: tick.clone(),
        }
    }
}

/// Latest allocation for each station.
#[derive(Debug, Serialize)]
pub struct StationsResponse {
    /// Label of the tick the allocations come from.
    pub timestamp: Option<String>,
    pub stations: Vec<StationAllocation>,
}

/// Optional range query parameters for the telemetry endpoint.
#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    /// First sequence number (inclusive).
    pub from: Option<usize>,
    /// Last sequence number (inclusive).
    pub to: Option<usize>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::mode::OperatingMode;

    #[test]
    fn telemetry_record_flattens_tick_fields() {
        let tick = TickResult {
            tick_index: 3,
            timestamp: "2024-01-01T03:00:00".to_string(),
            mode: OperatingMode::Islanded,
            original_load_kw: 30.0,
            flexible_load_kw: 28.0,
            served_load_kw: 0.0,
            state_of_charge_kwh: 0.9,
            display_soc_kwh: 0.9,
            soc_percent: 18.0,
            battery_supply_kw: 0.1,
            stations: Vec::new(),
        };
        let json = serde_json::to_value(TelemetryRecord::new(27, &tick)).unwrap();
        assert_eq!(json["seq"], 27);
        assert_eq!(json["tick_index"], 3);
        assert_eq!(json["mode"], "islanded");
        assert!(json.get("tick").is_none());
    }
}
