//! Core simulation types: trajectory input and per-tick output.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::mode::OperatingMode;
use super::stations::StationAllocation;

/// One load observation pulled from a trajectory source.
///
/// Every numeric field is optional. Missing values fall back to zero when
/// read through the accessor methods, so a malformed point never stops a run.
///
/// # Examples
///
/// ```
/// use outage_sim::sim::types::TrajectoryPoint;
///
/// let point = TrajectoryPoint {
///     forecast_kw: Some(3.5),
///     ..TrajectoryPoint::at("2024-01-01T02:00:00")
/// };
/// assert_eq!(point.original_load_kw(), 3.5);
/// assert_eq!(point.served_or_zero(), 0.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// Opaque time label.
    pub timestamp: String,
    /// Observed load (kW).
    pub load_kw: Option<f32>,
    /// Load after demand-response shifting (kW).
    pub shifted_load_kw: Option<f32>,
    /// Load actually served (kW).
    pub served_kw: Option<f32>,
    /// Baseline trend (kW).
    pub trend_kw: Option<f32>,
    /// Model forecast of the load (kW).
    pub forecast_kw: Option<f32>,
}

impl TrajectoryPoint {
    /// Creates a point with the given label and no readings.
    pub fn at(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            ..Self::default()
        }
    }

    /// Observed load, falling back to the forecast, then zero.
    pub fn original_load_kw(&self) -> f32 {
        finite(self.load_kw)
            .or(finite(self.forecast_kw))
            .unwrap_or(0.0)
    }

    /// Shifted load, falling back to the trend, then zero.
    pub fn flexible_load_kw(&self) -> f32 {
        finite(self.shifted_load_kw)
            .or(finite(self.trend_kw))
            .unwrap_or(0.0)
    }

    /// Served load or zero.
    pub fn served_or_zero(&self) -> f32 {
        finite(self.served_kw).unwrap_or(0.0)
    }
}

fn finite(value: Option<f32>) -> Option<f32> {
    value.filter(|v| v.is_finite())
}

/// Consolidated record of one processed tick, handed to the rendering sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickResult {
    /// Tick index within the current run (starts at 0).
    pub tick_index: usize,
    /// Label copied from the trajectory point.
    pub timestamp: String,
    /// Mode that governed this tick.
    pub mode: OperatingMode,
    /// Observed (or forecast) load (kW).
    pub original_load_kw: f32,
    /// Demand-response shifted load (kW).
    pub flexible_load_kw: f32,
    /// Load served by the grid (kW); zero while islanded.
    pub served_load_kw: f32,
    /// True battery state of charge after this tick (kWh).
    pub state_of_charge_kwh: f32,
    /// Smoothed state of charge for display (kWh).
    pub display_soc_kwh: f32,
    /// Display state of charge as a percentage of capacity.
    pub soc_percent: f32,
    /// Battery discharge power during this tick (kW).
    pub battery_supply_kw: f32,
    /// Per-station allocation, in station order.
    pub stations: Vec<StationAllocation>,
}

impl fmt::Display for TickResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active = self.stations.iter().filter(|s| s.active).count();
        write!(
            f,
            "t={:>3} [{}] {:<14} | load={:>6.2} kW  flex={:>6.2} kW  served={:>6.2} kW | \
             SoC={:.3} kWh ({:.0}%)  supply={:.3} kW | stations {}/{} active",
            self.tick_index,
            self.timestamp,
            self.mode,
            self.original_load_kw,
            self.flexible_load_kw,
            self.served_load_kw,
            self.display_soc_kwh,
            self.soc_percent,
            self.battery_supply_kw,
            active,
            self.stations.len(),
        )
    }
}
