//! Simulation engine that owns the mode, the battery, and the station table.

use tracing::{debug, info};

use super::battery::BatterySimulator;
use super::mode::{ModeController, OperatingMode};
use super::stations::StationDistributor;
use super::types::{TickResult, TrajectoryPoint};

/// Explicit owned simulation state.
///
/// The playback scheduler is its only mutator during a run; everything else
/// receives [`TickResult`] snapshots.
#[derive(Debug, Clone)]
pub struct Engine {
    mode: ModeController,
    battery: BatterySimulator,
    stations: StationDistributor,
}

impl Engine {
    /// Creates an engine starting in grid-connected mode.
    pub fn new(battery: BatterySimulator, stations: StationDistributor) -> Self {
        Self {
            mode: ModeController::default(),
            battery,
            stations,
        }
    }

    /// Returns the active operating mode.
    pub fn mode(&self) -> OperatingMode {
        self.mode.current_mode()
    }

    /// Switches the operating mode; charge and tick index are untouched.
    ///
    /// Returns `true` if the mode changed.
    pub fn set_mode(&mut self, target: OperatingMode) -> bool {
        let changed = self.mode.set_mode(target);
        if changed {
            info!(
                mode = %target,
                soc_kwh = self.battery.state().state_of_charge_kwh,
                tick = self.battery.state().tick_index,
                "operating mode switched"
            );
        }
        changed
    }

    /// Prepares for a fresh playback run: tick index back to zero, charge kept.
    pub fn begin_run(&mut self) {
        self.battery.restart_ticks();
    }

    /// Executes one tick: battery first, then station allocation.
    ///
    /// # Arguments
    ///
    /// * `point` - Trajectory point for this tick
    ///
    /// # Returns
    ///
    /// The consolidated `TickResult` for the rendering sink.
    pub fn step(&mut self, point: &TrajectoryPoint) -> TickResult {
        let mode = self.mode.current_mode();
        let tick_index = self.battery.state().tick_index;

        let output = self.battery.advance(mode, point);
        let stations = self.stations.distribute(mode, &output);

        let served_load_kw = match mode {
            OperatingMode::GridConnected => point.served_or_zero(),
            OperatingMode::Islanded => 0.0,
        };

        let result = TickResult {
            tick_index,
            timestamp: point.timestamp.clone(),
            mode,
            original_load_kw: point.original_load_kw(),
            flexible_load_kw: point.flexible_load_kw(),
            served_load_kw,
            state_of_charge_kwh: output.state_of_charge_kwh,
            display_soc_kwh: output.display_soc_kwh,
            soc_percent: self.battery.display_percent(),
            battery_supply_kw: output.supply_kw,
            stations,
        };
        debug!(
            tick = tick_index,
            %mode,
            soc_kwh = result.state_of_charge_kwh,
            supply_kw = result.battery_supply_kw,
            "tick processed"
        );
        result
    }

    /// Returns the battery simulator.
    pub fn battery(&self) -> &BatterySimulator {
        &self.battery
    }

    /// Returns the station distributor.
    pub fn stations(&self) -> &StationDistributor {
        &self.stations
    }
}
