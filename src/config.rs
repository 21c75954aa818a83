//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::battery::{BatteryParams, BatterySimulator};
use crate::sim::engine::Engine;
use crate::sim::stations::{AllocationParams, StationDistributor};
use crate::trajectory::outage::OutageScenario;
use crate::trajectory::synthetic::{SyntheticLoad, SyntheticTrajectory};
use crate::trajectory::{TrajectoryPoint, parse_clock};

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Battery model constants.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Station allocation heuristic and station count.
    #[serde(default)]
    pub allocation: AllocationConfig,
    /// Real-time playback cadence.
    #[serde(default)]
    pub playback: PlaybackConfig,
    /// Outage trigger and storm scenario.
    #[serde(default)]
    pub outage: OutageConfig,
    /// Synthetic trajectory used when no dataset is given.
    #[serde(default)]
    pub synthetic: SyntheticConfig,
}

/// Battery model constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Usable capacity (kWh).
    pub capacity_kwh: f32,
    /// Stored energy at start-up (kWh).
    pub initial_soc_kwh: f32,
    /// Energy added per grid-connected tick (kWh).
    pub charge_rate_per_tick: f32,
    /// Display smoothing factor (0.0–1.0).
    pub smoothing_factor: f32,
    /// Logical tick length (hours).
    pub tick_duration_hours: f32,
    /// Share of the served load drawn from the battery while islanded.
    pub depletion_factor: f32,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        let p = BatteryParams::default();
        Self {
            capacity_kwh: p.capacity_kwh,
            initial_soc_kwh: 0.0,
            charge_rate_per_tick: p.charge_rate_per_tick,
            smoothing_factor: p.smoothing_factor,
            tick_duration_hours: p.tick_duration_hours,
            depletion_factor: p.depletion_factor,
        }
    }
}

/// Station allocation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AllocationConfig {
    /// Multiplier applied to allocations when there is no supply (0.0–1.0).
    pub decay: f32,
    /// Extra share given by the index bias.
    pub bias_strength: f32,
    /// Weight of the previous allocation.
    pub blend_previous: f32,
    /// Weight of the new target.
    pub blend_target: f32,
    /// Allocation above which a station is active (kW).
    pub activity_threshold_kw: f32,
    /// Maximum number of stations taken from a roster.
    pub max_stations: usize,
    /// Station count used when no roster is loaded.
    pub default_station_count: usize,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        let p = AllocationParams::default();
        Self {
            decay: p.decay,
            bias_strength: p.bias_strength,
            blend_previous: p.blend_previous,
            blend_target: p.blend_target,
            activity_threshold_kw: p.activity_threshold_kw,
            max_stations: 8,
            default_station_count: 5,
        }
    }
}

/// Real-time playback parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaybackConfig {
    /// Wall-clock interval between ticks (ms).
    pub cadence_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self { cadence_ms: 300 }
    }
}

/// Outage trigger and storm scenario parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutageConfig {
    /// Whether the islanded run follows the baseline run.
    pub enabled: bool,
    /// Baseline ticks played before the outage; `None` plays the whole baseline.
    pub trigger_after_tick: Option<usize>,
    /// Start of the storm window, `HH:MM`.
    pub storm_start: String,
    /// End of the storm window, `HH:MM` (inclusive).
    pub storm_end: String,
    /// Reserve at the start of the storm scenario (kWh); defaults to battery capacity.
    pub reserve_kwh: Option<f32>,
    /// Served energy per storm point (kWh).
    pub slow_discharge_kwh: f32,
    /// Reserve recovered per point outside the storm (kWh).
    pub recharge_kwh: f32,
    /// Fixed served load inside the storm window (kW).
    pub critical_load_kw: Option<f32>,
}

impl Default for OutageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger_after_tick: None,
            storm_start: "02:00".to_string(),
            storm_end: "08:00".to_string(),
            reserve_kwh: None,
            slow_discharge_kwh: 0.01,
            recharge_kwh: 0.005,
            critical_load_kw: None,
        }
    }
}

/// Synthetic trajectory parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntheticConfig {
    /// Number of points.
    pub points: usize,
    /// Label of the first point, `YYYY-MM-DDTHH:MM:SS`.
    pub start: String,
    /// Minutes between points.
    pub step_minutes: i64,
    /// Points per simulated day.
    pub steps_per_day: usize,
    /// Baseline load (kW).
    pub base_kw: f32,
    /// Daily amplitude (kW).
    pub amp_kw: f32,
    /// Phase offset (radians).
    pub phase_rad: f32,
    /// Gaussian noise standard deviation (kW).
    pub noise_std: f32,
    /// Random seed.
    pub seed: u64,
    /// Fraction of load above trend removed by demand response (0.0–1.0).
    pub shift_fraction: f32,
    /// Fraction of load that is served (0.0–1.0).
    pub served_fraction: f32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            points: 24,
            start: "2024-01-01T00:00:00".to_string(),
            step_minutes: 60,
            steps_per_day: 24,
            base_kw: 30.0,
            amp_kw: 12.0,
            phase_rad: 1.2,
            noise_std: 1.5,
            seed: 42,
            shift_fraction: 0.5,
            served_fraction: 0.95,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.capacity_kwh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: a full grid-connected day, then a storm
    /// between 02:00 and 08:00.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the early-storm preset: the grid drops after six hours and the
    /// storm covers the small hours.
    pub fn early_storm() -> Self {
        Self {
            outage: OutageConfig {
                trigger_after_tick: Some(6),
                storm_start: "00:00".to_string(),
                storm_end: "06:00".to_string(),
                ..OutageConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the critical-load preset: a larger battery holding a fixed
    /// critical load through the storm.
    pub fn critical_load() -> Self {
        Self {
            battery: BatteryConfig {
                capacity_kwh: 10.0,
                initial_soc_kwh: 2.0,
                ..BatteryConfig::default()
            },
            outage: OutageConfig {
                critical_load_kw: Some(1.5),
                ..OutageConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "early_storm", "critical_load"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "early_storm" => Ok(Self::early_storm()),
            "critical_load" => Ok(Self::critical_load()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut check = |ok: bool, field: &str, message: &str| {
            if !ok {
                errors.push(ConfigError::new(field, message));
            }
        };

        let b = &self.battery;
        check(b.capacity_kwh > 0.0, "battery.capacity_kwh", "must be > 0");
        check(
            (0.0..=b.capacity_kwh.max(0.0)).contains(&b.initial_soc_kwh),
            "battery.initial_soc_kwh",
            "must be in [0, battery.capacity_kwh]",
        );
        check(
            b.charge_rate_per_tick >= 0.0,
            "battery.charge_rate_per_tick",
            "must be >= 0",
        );
        check(
            (0.0..=1.0).contains(&b.smoothing_factor),
            "battery.smoothing_factor",
            "must be in [0.0, 1.0]",
        );
        check(
            b.tick_duration_hours > 0.0,
            "battery.tick_duration_hours",
            "must be > 0",
        );
        check(
            b.depletion_factor >= 0.0,
            "battery.depletion_factor",
            "must be >= 0",
        );

        let a = &self.allocation;
        check(
            (0.0..=1.0).contains(&a.decay),
            "allocation.decay",
            "must be in [0.0, 1.0]",
        );
        check(a.bias_strength >= 0.0, "allocation.bias_strength", "must be >= 0");
        check(a.blend_previous >= 0.0, "allocation.blend_previous", "must be >= 0");
        check(a.blend_target >= 0.0, "allocation.blend_target", "must be >= 0");
        check(
            a.activity_threshold_kw >= 0.0,
            "allocation.activity_threshold_kw",
            "must be >= 0",
        );
        check(a.max_stations > 0, "allocation.max_stations", "must be > 0");
        check(
            a.default_station_count <= a.max_stations,
            "allocation.default_station_count",
            "must be <= allocation.max_stations",
        );

        check(self.playback.cadence_ms > 0, "playback.cadence_ms", "must be > 0");

        let o = &self.outage;
        let start = parse_clock(&o.storm_start);
        let end = parse_clock(&o.storm_end);
        check(start.is_some(), "outage.storm_start", "must be HH:MM");
        check(end.is_some(), "outage.storm_end", "must be HH:MM");
        if let (Some(start), Some(end)) = (start, end) {
            check(start <= end, "outage.storm_start", "must be <= outage.storm_end");
        }
        check(
            o.reserve_kwh.is_none_or(|r| r >= 0.0),
            "outage.reserve_kwh",
            "must be >= 0",
        );
        check(
            o.slow_discharge_kwh >= 0.0,
            "outage.slow_discharge_kwh",
            "must be >= 0",
        );
        check(o.recharge_kwh >= 0.0, "outage.recharge_kwh", "must be >= 0");
        check(
            o.critical_load_kw.is_none_or(|kw| kw >= 0.0),
            "outage.critical_load_kw",
            "must be >= 0",
        );

        let s = &self.synthetic;
        check(
            NaiveDateTime::parse_from_str(&s.start, crate::trajectory::synthetic::LABEL_FORMAT)
                .is_ok(),
            "synthetic.start",
            "must be YYYY-MM-DDTHH:MM:SS",
        );
        check(s.step_minutes > 0, "synthetic.step_minutes", "must be > 0");
        check(s.steps_per_day > 0, "synthetic.steps_per_day", "must be > 0");
        check(s.noise_std >= 0.0, "synthetic.noise_std", "must be >= 0");
        check(
            (0.0..=1.0).contains(&s.shift_fraction),
            "synthetic.shift_fraction",
            "must be in [0.0, 1.0]",
        );
        check(
            (0.0..=1.0).contains(&s.served_fraction),
            "synthetic.served_fraction",
            "must be in [0.0, 1.0]",
        );

        errors
    }

    /// Battery constants for the simulator.
    pub fn battery_params(&self) -> BatteryParams {
        let b = &self.battery;
        BatteryParams {
            capacity_kwh: b.capacity_kwh,
            charge_rate_per_tick: b.charge_rate_per_tick,
            smoothing_factor: b.smoothing_factor,
            tick_duration_hours: b.tick_duration_hours,
            depletion_factor: b.depletion_factor,
        }
    }

    /// Allocation constants for the distributor.
    pub fn allocation_params(&self) -> AllocationParams {
        let a = &self.allocation;
        AllocationParams {
            decay: a.decay,
            bias_strength: a.bias_strength,
            blend_previous: a.blend_previous,
            blend_target: a.blend_target,
            activity_threshold_kw: a.activity_threshold_kw,
        }
    }

    /// Wall-clock interval between real-time ticks.
    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.playback.cadence_ms)
    }

    /// Builds a grid-connected engine.
    ///
    /// # Arguments
    ///
    /// * `roster_names` - Station names in roster order; `None` entries get an
    ///   ordinal name. An empty slice uses `allocation.default_station_count`
    ///   unnamed stations. At most `allocation.max_stations` are taken.
    pub fn build_engine(&self, roster_names: &[Option<String>]) -> Engine {
        let battery = BatterySimulator::new(self.battery_params(), self.battery.initial_soc_kwh);
        let stations = if roster_names.is_empty() {
            StationDistributor::unnamed(
                self.allocation_params(),
                self.allocation.default_station_count,
            )
        } else {
            StationDistributor::new(
                self.allocation_params(),
                roster_names
                    .iter()
                    .take(self.allocation.max_stations)
                    .cloned(),
            )
        };
        Engine::new(battery, stations)
    }

    /// Builds the storm scenario generator.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a storm time is not `HH:MM`.
    pub fn outage_scenario(&self) -> Result<OutageScenario, ConfigError> {
        let o = &self.outage;
        Ok(OutageScenario {
            storm_start: clock(&o.storm_start, "outage.storm_start")?,
            storm_end: clock(&o.storm_end, "outage.storm_end")?,
            reserve_kwh: o.reserve_kwh.unwrap_or(self.battery.capacity_kwh),
            slow_discharge_kwh: o.slow_discharge_kwh,
            recharge_kwh: o.recharge_kwh,
            critical_load_kw: o.critical_load_kw,
        })
    }

    /// Generates the synthetic trajectory.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `synthetic.start` is not a date-time.
    pub fn synthetic_trajectory(&self) -> Result<Vec<TrajectoryPoint>, ConfigError> {
        let s = &self.synthetic;
        let start =
            NaiveDateTime::parse_from_str(&s.start, crate::trajectory::synthetic::LABEL_FORMAT)
                .map_err(|e| ConfigError::new("synthetic.start", e.to_string()))?;
        let mut load = SyntheticLoad::new(
            s.base_kw,
            s.amp_kw,
            s.phase_rad,
            s.noise_std,
            s.steps_per_day,
            s.seed,
        );
        let shape = SyntheticTrajectory {
            start,
            step_minutes: s.step_minutes,
            points: s.points,
            shift_fraction: s.shift_fraction,
            served_fraction: s.served_fraction,
        };
        Ok(shape.generate(&mut load))
    }
}

fn clock(value: &str, field: &str) -> Result<NaiveTime, ConfigError> {
    parse_clock(value).ok_or_else(|| ConfigError::new(field, format!("\"{value}\" is not HH:MM")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::mode::OperatingMode;

    #[test]
    fn baseline_preset_valid() {
        let errors = ScenarioConfig::baseline().validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn from_preset_unknown() {
        let e = ScenarioConfig::from_preset("hurricane").unwrap_err();
        assert_eq!(e.field, "preset");
        assert!(e.message.contains("unknown preset"));
        assert!(e.message.contains("early_storm"));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[battery]
capacity_kwh = 8.0

[outage]
trigger_after_tick = 3
critical_load_kw = 2.0
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).expect("valid TOML should parse");
        assert_eq!(cfg.battery.capacity_kwh, 8.0);
        assert_eq!(cfg.battery.charge_rate_per_tick, 0.02);
        assert_eq!(cfg.outage.trigger_after_tick, Some(3));
        assert_eq!(cfg.outage.storm_start, "02:00");
        assert_eq!(cfg.allocation.max_stations, 8);
        assert_eq!(cfg.playback.cadence_ms, 300);
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[battery]
capacity_kwh = 5.0
bogus_field = true
"#;
        let err = ScenarioConfig::from_toml_str(toml).unwrap_err();
        assert_eq!(err.field, "toml");
    }

    #[test]
    fn validation_catches_soc_above_capacity() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.battery.initial_soc_kwh = 6.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "battery.initial_soc_kwh"));
    }

    #[test]
    fn validation_catches_reversed_storm_window() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.outage.storm_start = "09:00".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "outage.storm_start"));
    }

    #[test]
    fn validation_catches_bad_clock_and_start() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.outage.storm_end = "late".to_string();
        cfg.synthetic.start = "yesterday".to_string();
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"outage.storm_end".to_string()));
        assert!(fields.contains(&"synthetic.start".to_string()));
        assert!(cfg.outage_scenario().is_err());
        assert!(cfg.synthetic_trajectory().is_err());
    }

    #[test]
    fn validation_catches_too_many_default_stations() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.allocation.default_station_count = 9;
        let errors = cfg.validate();
        assert!(
            errors
                .iter()
                .any(|e| e.field == "allocation.default_station_count")
        );
    }

    #[test]
    fn engine_uses_default_station_count_without_roster() {
        let engine = ScenarioConfig::baseline().build_engine(&[]);
        assert_eq!(engine.stations().stations().len(), 5);
        assert_eq!(engine.mode(), OperatingMode::GridConnected);
        assert_eq!(engine.stations().stations()[4].display_name, "Station 5");
    }

    #[test]
    fn engine_caps_roster_at_max_stations() {
        let names: Vec<Option<String>> = (0..12).map(|i| Some(format!("S{i}"))).collect();
        let engine = ScenarioConfig::baseline().build_engine(&names);
        assert_eq!(engine.stations().stations().len(), 8);
        assert_eq!(engine.stations().stations()[0].display_name, "S0");
    }

    #[test]
    fn reserve_defaults_to_capacity() {
        let cfg = ScenarioConfig::critical_load();
        let scenario = cfg.outage_scenario().expect("preset storm times parse");
        assert_eq!(scenario.reserve_kwh, 10.0);
        assert_eq!(scenario.critical_load_kw, Some(1.5));
    }

    #[test]
    fn critical_load_preset_never_serves_more_than_its_reserve() {
        let cfg = ScenarioConfig::critical_load();
        let scenario = cfg.outage_scenario().expect("preset storm times parse");
        let day = cfg.synthetic_trajectory().expect("preset start parses");
        let served: f32 = scenario
            .apply(&day)
            .iter()
            .map(TrajectoryPoint::served_or_zero)
            .sum();
        assert!(served > 0.0);
        assert!(
            served <= scenario.reserve_kwh + 1e-4,
            "served {served} > reserve {}",
            scenario.reserve_kwh
        );
    }

    #[test]
    fn synthetic_trajectory_has_configured_length() {
        let points = ScenarioConfig::baseline()
            .synthetic_trajectory()
            .expect("default start parses");
        assert_eq!(points.len(), 24);
        assert_eq!(points[0].timestamp, "2024-01-01T00:00:00");
    }
}
