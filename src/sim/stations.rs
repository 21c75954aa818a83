//! Target-tracking allocation of battery supply across stations.
//!
//! Each tick nudges every station's allocation toward an index-biased share of
//! the supply instead of solving an exact partition. Allocations may sum to
//! more or less than the supply; the per-station values stay smooth.

use serde::{Deserialize, Serialize};

use super::battery::BatteryOutput;
use super::mode::OperatingMode;

/// Tuning constants of the allocation heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationParams {
    /// Multiplier applied to every allocation when no supply is available.
    pub decay: f32,
    /// Extra share given by the index bias.
    pub bias_strength: f32,
    /// Weight of the previous allocation in the blend.
    pub blend_previous: f32,
    /// Weight of the new target in the blend.
    pub blend_target: f32,
    /// Allocation above which a station counts as active (kW).
    pub activity_threshold_kw: f32,
}

impl Default for AllocationParams {
    fn default() -> Self {
        Self {
            decay: 0.6,
            bias_strength: 0.1,
            blend_previous: 0.45,
            blend_target: 0.55,
            activity_threshold_kw: 0.05,
        }
    }
}

/// One downstream load point.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    /// Stable 0-based position; sets display order and allocation bias.
    pub index: usize,
    /// Name shown to the user.
    pub display_name: String,
    /// Running allocation (kW, never negative).
    pub allocated_kw: f32,
}

/// Read-only per-station snapshot emitted with each tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationAllocation {
    /// Station position.
    pub index: usize,
    /// Station name.
    pub display_name: String,
    /// Allocation after this tick (kW).
    pub allocated_kw: f32,
    /// Share of the tick's supply, clamped to `[0, 100]`.
    pub percent: f32,
    /// Whether the allocation exceeds the activity threshold.
    pub active: bool,
}

/// Owns the fixed station list and their running allocations.
#[derive(Debug, Clone)]
pub struct StationDistributor {
    params: AllocationParams,
    stations: Vec<Station>,
}

impl StationDistributor {
    /// Builds the station table from an ordered roster.
    ///
    /// Blank or missing names become `"Station {index + 1}"`.
    pub fn new<I, S>(params: AllocationParams, roster: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let stations = roster
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                let name = name.map(Into::into).unwrap_or_default();
                let display_name = if name.trim().is_empty() {
                    fallback_name(index)
                } else {
                    name.trim().to_string()
                };
                Station {
                    index,
                    display_name,
                    allocated_kw: 0.0,
                }
            })
            .collect();
        Self { params, stations }
    }

    /// Builds `count` unnamed stations.
    pub fn unnamed(params: AllocationParams, count: usize) -> Self {
        Self::new(params, std::iter::repeat_n(None::<String>, count))
    }

    /// Updates every station from the battery's output for this tick.
    pub fn distribute(
        &mut self,
        mode: OperatingMode,
        battery: &BatteryOutput,
    ) -> Vec<StationAllocation> {
        let supply = battery.supply_kw;
        let n = self.stations.len();

        if !mode.is_islanded() || supply <= 0.0 || n == 0 {
            for station in &mut self.stations {
                station.allocated_kw = (station.allocated_kw * self.params.decay).max(0.0);
            }
        } else {
            let base_share = supply / n as f32;
            for station in &mut self.stations {
                let target = biased_target(
                    base_share,
                    station.index,
                    n,
                    self.params.bias_strength,
                );
                let blended = station.allocated_kw * self.params.blend_previous
                    + target * self.params.blend_target;
                station.allocated_kw = blended.max(0.0);
            }
        }

        self.snapshot(supply)
    }

    /// Current allocations expressed against `supply_kw`.
    pub fn snapshot(&self, supply_kw: f32) -> Vec<StationAllocation> {
        self.stations
            .iter()
            .map(|station| StationAllocation {
                index: station.index,
                display_name: station.display_name.clone(),
                allocated_kw: station.allocated_kw,
                percent: share_percent(station.allocated_kw, supply_kw),
                active: station.allocated_kw > self.params.activity_threshold_kw,
            })
            .collect()
    }

    /// Returns the station table.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Returns the tuning constants.
    pub fn params(&self) -> &AllocationParams {
        &self.params
    }
}

/// Index-biased target share.
///
/// `(n - 1 - index)` is largest at index 0, so the first station gets the
/// biggest multiplier.
pub fn biased_target(base_share: f32, index: usize, n: usize, bias_strength: f32) -> f32 {
    let span = n.saturating_sub(1).max(1) as f32;
    let rank = n.saturating_sub(1).saturating_sub(index) as f32;
    base_share * (1.0 + bias_strength * rank / span)
}

fn share_percent(allocated_kw: f32, supply_kw: f32) -> f32 {
    if supply_kw > 0.0 {
        (allocated_kw / supply_kw * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn fallback_name(index: usize) -> String {
    format!("Station {}", index + 1)
}
