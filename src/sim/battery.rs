//! Battery state-of-charge dynamics for the two operating modes.

use serde::{Deserialize, Serialize};

use super::mode::OperatingMode;
use super::types::TrajectoryPoint;

/// Floor applied to the tick duration before dividing by it.
pub const MIN_TICK_DURATION_HOURS: f32 = 1e-9;

/// Fixed constants of the battery model.
///
/// The depletion factor is a damping constant that keeps the outage playback
/// slow enough to follow; it is not a round-trip efficiency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryParams {
    /// Usable capacity (kWh).
    pub capacity_kwh: f32,
    /// Energy added per grid-connected tick (kWh).
    pub charge_rate_per_tick: f32,
    /// Exponential smoothing factor for the display value (0..=1).
    pub smoothing_factor: f32,
    /// Logical duration of one tick (hours).
    pub tick_duration_hours: f32,
    /// Fraction of the served demand drawn from the battery while islanded.
    pub depletion_factor: f32,
}

impl Default for BatteryParams {
    fn default() -> Self {
        Self {
            capacity_kwh: 5.0,
            charge_rate_per_tick: 0.02,
            smoothing_factor: 0.1,
            tick_duration_hours: 1.0,
            depletion_factor: 0.05,
        }
    }
}

impl BatteryParams {
    /// Tick duration with the division floor applied.
    pub fn effective_tick_hours(&self) -> f32 {
        self.tick_duration_hours.max(MIN_TICK_DURATION_HOURS)
    }
}

/// Mutable state owned by the [`BatterySimulator`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationState {
    /// Ticks processed in the current run.
    pub tick_index: usize,
    /// Stored energy (kWh), always within `[0, capacity]`.
    pub state_of_charge_kwh: f32,
    /// Smoothed stored energy for display (kWh).
    pub display_soc_kwh: f32,
    /// Discharge power of the most recent tick (kW).
    pub last_supply_kw: f32,
}

/// Result of one [`BatterySimulator::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryOutput {
    /// Stored energy after the tick (kWh).
    pub state_of_charge_kwh: f32,
    /// Display value after the tick (kWh).
    pub display_soc_kwh: f32,
    /// Discharge power (kW, zero while grid-connected).
    pub supply_kw: f32,
    /// Energy removed during the tick (kWh).
    pub depletion_kwh: f32,
}

/// Advances the battery one logical tick at a time.
///
/// # Examples
///
/// ```
/// use outage_sim::sim::battery::{BatteryParams, BatterySimulator};
/// use outage_sim::sim::mode::OperatingMode;
/// use outage_sim::sim::types::TrajectoryPoint;
///
/// let mut battery = BatterySimulator::new(BatteryParams::default(), 0.0);
/// let out = battery.advance(OperatingMode::GridConnected, &TrajectoryPoint::default());
/// assert!((out.state_of_charge_kwh - 0.02).abs() < 1e-6);
/// assert_eq!(out.supply_kw, 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct BatterySimulator {
    params: BatteryParams,
    state: SimulationState,
}

impl BatterySimulator {
    /// Creates a simulator holding `initial_soc_kwh`, clamped into `[0, capacity]`.
    ///
    /// A non-positive capacity is treated as zero, which pins the charge at zero.
    pub fn new(params: BatteryParams, initial_soc_kwh: f32) -> Self {
        let capacity = params.capacity_kwh.max(0.0);
        let soc = if initial_soc_kwh.is_finite() {
            initial_soc_kwh.clamp(0.0, capacity)
        } else {
            0.0
        };
        Self {
            params,
            state: SimulationState {
                tick_index: 0,
                state_of_charge_kwh: soc,
                display_soc_kwh: soc,
                last_supply_kw: 0.0,
            },
        }
    }

    /// Applies the dynamics rule of `mode` for one tick.
    pub fn advance(&mut self, mode: OperatingMode, point: &TrajectoryPoint) -> BatteryOutput {
        let capacity = self.params.capacity_kwh.max(0.0);
        let soc = self.state.state_of_charge_kwh;

        let (next_soc, display, supply_kw, depletion_kwh) = match mode {
            OperatingMode::GridConnected => {
                let charged = (soc + self.params.charge_rate_per_tick.max(0.0)).min(capacity);
                let display = self.state.display_soc_kwh
                    + (charged - self.state.display_soc_kwh) * self.params.smoothing_factor;
                (charged, display.clamp(0.0, capacity), 0.0, 0.0)
            }
            OperatingMode::Islanded => {
                let dt = self.params.effective_tick_hours();
                let demand_kwh = point.served_or_zero().max(0.0) * self.params.tick_duration_hours;
                let depletion = soc.min(demand_kwh * self.params.depletion_factor).max(0.0);
                let remaining = (soc - depletion).max(0.0);
                (remaining, remaining, depletion / dt, depletion)
            }
        };

        self.state.tick_index += 1;
        self.state.state_of_charge_kwh = next_soc;
        self.state.display_soc_kwh = display;
        self.state.last_supply_kw = supply_kw;

        BatteryOutput {
            state_of_charge_kwh: next_soc,
            display_soc_kwh: display,
            supply_kw,
            depletion_kwh,
        }
    }

    /// Restarts the tick counter for a fresh playback run, keeping the charge.
    pub fn restart_ticks(&mut self) {
        self.state.tick_index = 0;
    }

    /// Returns the current simulation state.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Returns the model constants.
    pub fn params(&self) -> &BatteryParams {
        &self.params
    }

    /// Display state of charge as a percentage of capacity.
    pub fn display_percent(&self) -> f32 {
        percent_of(self.state.display_soc_kwh, self.params.capacity_kwh)
    }
}

/// `value / capacity * 100`, zero when the capacity is not positive.
fn percent_of(value_kwh: f32, capacity_kwh: f32) -> f32 {
    if capacity_kwh > 0.0 {
        (value_kwh / capacity_kwh * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn served(kw: f32) -> TrajectoryPoint {
        TrajectoryPoint {
            served_kw: Some(kw),
            ..TrajectoryPoint::at("t")
        }
    }

    #[test]
    fn grid_connected_charges_and_caps_at_capacity() {
        let params = BatteryParams {
            capacity_kwh: 0.05,
            ..BatteryParams::default()
        };
        let mut battery = BatterySimulator::new(params, 0.0);
        for _ in 0..5 {
            battery.advance(OperatingMode::GridConnected, &served(10.0));
        }
        assert_abs_diff_eq!(battery.state().state_of_charge_kwh, 0.05);
        assert_eq!(battery.state().last_supply_kw, 0.0);
    }

    #[test]
    fn display_value_lags_true_charge_while_charging() {
        let mut battery = BatterySimulator::new(BatteryParams::default(), 0.0);
        let out = battery.advance(OperatingMode::GridConnected, &served(0.0));
        assert_abs_diff_eq!(out.state_of_charge_kwh, 0.02, epsilon = 1e-6);
        assert_abs_diff_eq!(out.display_soc_kwh, 0.002, epsilon = 1e-6);
        assert_abs_diff_eq!(
            battery.display_percent(),
            out.display_soc_kwh / battery.params().capacity_kwh * 100.0,
            epsilon = 1e-4
        );
    }

    #[test]
    fn islanded_discharge_follows_served_load() {
        let mut battery = BatterySimulator::new(BatteryParams::default(), 4.0);
        let out = battery.advance(OperatingMode::Islanded, &served(10.0));
        // 10 kW * 1 h * 0.05
        assert_abs_diff_eq!(out.depletion_kwh, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(out.state_of_charge_kwh, 3.5, epsilon = 1e-6);
        assert_abs_diff_eq!(out.supply_kw, 0.5, epsilon = 1e-6);
        assert_eq!(out.display_soc_kwh, out.state_of_charge_kwh);
    }

    #[test]
    fn missing_served_load_means_no_discharge() {
        let mut battery = BatterySimulator::new(BatteryParams::default(), 2.0);
        let out = battery.advance(OperatingMode::Islanded, &TrajectoryPoint::default());
        assert_eq!(out.supply_kw, 0.0);
        assert_eq!(out.state_of_charge_kwh, 2.0);
    }

    #[test]
    fn negative_served_load_does_not_charge() {
        let mut battery = BatterySimulator::new(BatteryParams::default(), 2.0);
        let out = battery.advance(OperatingMode::Islanded, &served(-50.0));
        assert_eq!(out.state_of_charge_kwh, 2.0);
        assert_eq!(out.supply_kw, 0.0);
    }

    #[test]
    fn zero_tick_duration_does_not_divide_by_zero() {
        let params = BatteryParams {
            tick_duration_hours: 0.0,
            ..BatteryParams::default()
        };
        let mut battery = BatterySimulator::new(params, 1.0);
        let out = battery.advance(OperatingMode::Islanded, &served(40.0));
        assert!(out.supply_kw.is_finite());
        assert_eq!(out.state_of_charge_kwh, 1.0);
    }

    #[test]
    fn initial_charge_is_clamped() {
        let battery = BatterySimulator::new(BatteryParams::default(), 9.0);
        assert_eq!(battery.state().state_of_charge_kwh, 5.0);
        let battery = BatterySimulator::new(BatteryParams::default(), -1.0);
        assert_eq!(battery.state().state_of_charge_kwh, 0.0);
    }

    #[test]
    fn tick_index_counts_every_advance_and_restarts() {
        let mut battery = BatterySimulator::new(BatteryParams::default(), 0.0);
        battery.advance(OperatingMode::GridConnected, &served(0.0));
        battery.advance(OperatingMode::Islanded, &served(0.0));
        assert_eq!(battery.state().tick_index, 2);
        let soc = battery.state().state_of_charge_kwh;
        battery.restart_ticks();
        assert_eq!(battery.state().tick_index, 0);
        assert_eq!(battery.state().state_of_charge_kwh, soc);
    }

    #[test]
    fn percent_of_guards_zero_capacity() {
        assert_eq!(percent_of(1.0, 0.0), 0.0);
        assert_abs_diff_eq!(percent_of(1.0, 5.0), 20.0);
    }
}
