use chrono::NaiveTime;
use tracing::info;

use super::{TrajectoryPoint, time_of_day, to_minute};

/// Rebuilds a trajectory's served load for a storm outage.
///
/// A reserve starts full. Inside the storm window, while the reserve lasts,
/// each point serves a small fixed draw (or the configured critical load) and
/// the reserve is drawn down. Outside the window nothing is served and the
/// reserve recharges slowly.
#[derive(Debug, Clone)]
pub struct OutageScenario {
    /// First minute of the storm (inclusive).
    pub storm_start: NaiveTime,
    /// Last minute of the storm (inclusive).
    pub storm_end: NaiveTime,
    /// Reserve at the start of the scenario and its ceiling (kWh).
    pub reserve_kwh: f32,
    /// Energy drawn per storm point when no critical load is set (kWh).
    pub slow_discharge_kwh: f32,
    /// Energy returned to the reserve per point outside the storm (kWh).
    pub recharge_kwh: f32,
    /// Served load inside the storm window, if fixed (kW).
    ///
    /// Each point draws this value from the reserve as energy, so it reads as
    /// kW held for an hourly point. Never more than the reserve has left.
    pub critical_load_kw: Option<f32>,
}

impl OutageScenario {
    /// Returns `true` when `timestamp` falls inside the storm window.
    ///
    /// Unparseable timestamps are outside. A window whose start is after its
    /// end contains nothing.
    pub fn in_storm(&self, timestamp: &str) -> bool {
        time_of_day(timestamp)
            .map(to_minute)
            .is_some_and(|t| self.storm_start <= t && t <= self.storm_end)
    }

    /// Produces the outage trajectory; every other reading is kept as is.
    pub fn apply(&self, points: &[TrajectoryPoint]) -> Vec<TrajectoryPoint> {
        let ceiling = self.reserve_kwh.max(0.0);
        let mut reserve = ceiling;
        let mut storm_points = 0_usize;
        let mut supplied_kwh = 0.0_f32;

        let out: Vec<TrajectoryPoint> = points
            .iter()
            .map(|point| {
                let served = if self.in_storm(&point.timestamp) && reserve > 0.0 {
                    storm_points += 1;
                    let draw = self
                        .critical_load_kw
                        .unwrap_or(self.slow_discharge_kwh)
                        .max(0.0)
                        .min(reserve);
                    reserve = (reserve - draw).max(0.0);
                    supplied_kwh += draw;
                    draw
                } else {
                    reserve = (reserve + self.recharge_kwh.max(0.0)).min(ceiling);
                    0.0
                };
                TrajectoryPoint {
                    served_kw: Some(served),
                    ..point.clone()
                }
            })
            .collect();

        info!(
            points = out.len(),
            storm_points,
            supplied_kwh,
            "outage scenario generated"
        );
        out
    }
}
