//! Post-hoc summary computed from playback results.

use std::fmt;

use serde::Serialize;

use super::types::TickResult;

/// Aggregate indicators derived from one or more playback runs.
///
/// Computed after the fact from `&[TickResult]` so that the summary always
/// agrees with the per-tick records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaybackSummary {
    /// Number of ticks processed.
    pub tick_count: usize,
    /// Number of ticks processed while islanded.
    pub islanded_ticks: usize,
    /// Highest observed load (kW).
    pub peak_original_load_kw: f32,
    /// Highest shifted load (kW).
    pub peak_flexible_load_kw: f32,
    /// State of charge after the last tick (kWh).
    pub final_soc_kwh: f32,
    /// Lowest state of charge seen (kWh).
    pub min_soc_kwh: f32,
    /// Highest battery discharge power (kW).
    pub peak_battery_supply_kw: f32,
    /// Total energy delivered by the battery (kWh).
    pub battery_energy_kwh: f32,
    /// Energy allocated to each station, in station order (kWh).
    pub station_energy_kwh: Vec<f32>,
}

impl PlaybackSummary {
    /// Computes the summary from the complete tick record vector.
    ///
    /// # Arguments
    ///
    /// * `results` - Tick results, in playback order
    /// * `tick_hours` - Logical duration of one tick in hours
    pub fn from_results(results: &[TickResult], tick_hours: f32) -> Self {
        let Some(last) = results.last() else {
            return Self::default();
        };

        let mut summary = Self {
            tick_count: results.len(),
            final_soc_kwh: last.state_of_charge_kwh,
            min_soc_kwh: f32::INFINITY,
            ..Self::default()
        };

        for r in results {
            if r.mode.is_islanded() {
                summary.islanded_ticks += 1;
            }
            summary.peak_original_load_kw = summary.peak_original_load_kw.max(r.original_load_kw);
            summary.peak_flexible_load_kw = summary.peak_flexible_load_kw.max(r.flexible_load_kw);
            summary.min_soc_kwh = summary.min_soc_kwh.min(r.state_of_charge_kwh);
            summary.peak_battery_supply_kw =
                summary.peak_battery_supply_kw.max(r.battery_supply_kw);
            summary.battery_energy_kwh += r.battery_supply_kw * tick_hours;

            if summary.station_energy_kwh.len() < r.stations.len() {
                summary.station_energy_kwh.resize(r.stations.len(), 0.0);
            }
            for s in &r.stations {
                summary.station_energy_kwh[s.index] += s.allocated_kw * tick_hours;
            }
        }

        summary
    }
}

impl fmt::Display for PlaybackSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Playback Summary ---")?;
        writeln!(
            f,
            "Ticks:                {} ({} islanded)",
            self.tick_count, self.islanded_ticks
        )?;
        writeln!(f, "Peak load:            {:.2} kW", self.peak_original_load_kw)?;
        writeln!(f, "Peak flexible load:   {:.2} kW", self.peak_flexible_load_kw)?;
        writeln!(f, "Final SoC:            {:.3} kWh", self.final_soc_kwh)?;
        writeln!(f, "Minimum SoC:          {:.3} kWh", self.min_soc_kwh)?;
        writeln!(f, "Peak battery supply:  {:.3} kW", self.peak_battery_supply_kw)?;
        write!(f, "Battery energy:       {:.3} kWh", self.battery_energy_kwh)?;
        for (i, kwh) in self.station_energy_kwh.iter().enumerate() {
            write!(f, "\n  station {:>2}:         {kwh:.3} kWh", i + 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::sim::mode::OperatingMode;
    use crate::sim::stations::StationAllocation;

    fn tick(mode: OperatingMode, load: f32, soc: f32, supply: f32) -> TickResult {
        TickResult {
            tick_index: 0,
            timestamp: String::new(),
            mode,
            original_load_kw: load,
            flexible_load_kw: load * 0.8,
            served_load_kw: 0.0,
            state_of_charge_kwh: soc,
            display_soc_kwh: soc,
            soc_percent: soc * 20.0,
            battery_supply_kw: supply,
            stations: vec![StationAllocation {
                index: 0,
                display_name: "Station 1".to_string(),
                allocated_kw: supply,
                percent: 100.0,
                active: supply > 0.05,
            }],
        }
    }

    #[test]
    fn empty_results_give_zeroed_summary() {
        let s = PlaybackSummary::from_results(&[], 1.0);
        assert_eq!(s, PlaybackSummary::default());
    }

    #[test]
    fn summary_tracks_peaks_and_energy() {
        let results = vec![
            tick(OperatingMode::GridConnected, 30.0, 1.0, 0.0),
            tick(OperatingMode::Islanded, 45.0, 0.6, 0.4),
            tick(OperatingMode::Islanded, 20.0, 0.3, 0.3),
        ];
        let s = PlaybackSummary::from_results(&results, 1.0);
        assert_eq!(s.tick_count, 3);
        assert_eq!(s.islanded_ticks, 2);
        assert_eq!(s.peak_original_load_kw, 45.0);
        assert_abs_diff_eq!(s.peak_flexible_load_kw, 36.0);
        assert_eq!(s.final_soc_kwh, 0.3);
        assert_eq!(s.min_soc_kwh, 0.3);
        assert_abs_diff_eq!(s.battery_energy_kwh, 0.7, epsilon = 1e-6);
        assert_abs_diff_eq!(s.station_energy_kwh[0], 0.7, epsilon = 1e-6);
    }

    #[test]
    fn display_does_not_panic() {
        let results = vec![tick(OperatingMode::Islanded, 10.0, 0.5, 0.1)];
        let text = PlaybackSummary::from_results(&results, 1.0).to_string();
        assert!(text.contains("Playback Summary"));
    }
}
