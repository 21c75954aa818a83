//! CSV export for playback tick results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::TickResult;

/// Fixed leading columns; one `station_{n}_kw` column per station follows.
const HEADER: &str = "tick,timestamp,mode,original_load_kw,flexible_load_kw,\
                      served_load_kw,soc_kwh,display_soc_kwh,soc_pct,battery_supply_kw";

/// Exports tick results to a CSV file at the given path.
///
/// Writes a header row followed by one data row per tick. Produces
/// deterministic output for identical inputs.
///
/// # Arguments
///
/// * `results` - Tick results, in playback order
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(results: &[TickResult], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(results, buf)
}

/// Writes tick results as CSV to any writer.
///
/// The station column count is the largest station count among `results`;
/// shorter rows are padded with empty cells.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(results: &[TickResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    let stations = results.iter().map(|r| r.stations.len()).max().unwrap_or(0);

    let header = HEADER
        .split(',')
        .map(|h| h.trim().to_string())
        .chain((1..=stations).map(|n| format!("station_{n}_kw")));
    wtr.write_record(header)?;

    for r in results {
        let fixed = [
            r.tick_index.to_string(),
            r.timestamp.clone(),
            r.mode.to_string(),
            format!("{:.4}", r.original_load_kw),
            format!("{:.4}", r.flexible_load_kw),
            format!("{:.4}", r.served_load_kw),
            format!("{:.4}", r.state_of_charge_kwh),
            format!("{:.4}", r.display_soc_kwh),
            format!("{:.2}", r.soc_percent),
            format!("{:.4}", r.battery_supply_kw),
        ];
        let per_station = (0..stations).map(|i| {
            r.stations
                .get(i)
                .map_or_else(String::new, |s| format!("{:.4}", s.allocated_kw))
        });
        wtr.write_record(fixed.into_iter().chain(per_station))?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::mode::OperatingMode;
    use crate::sim::stations::StationAllocation;

    fn make_tick(t: usize, stations: usize) -> TickResult {
        TickResult {
            tick_index: t,
            timestamp: format!("2024-01-01T{t:02}:00:00"),
            mode: OperatingMode::Islanded,
            original_load_kw: 31.5,
            flexible_load_kw: 30.0,
            served_load_kw: 0.0,
            state_of_charge_kwh: 0.4,
            display_soc_kwh: 0.4,
            soc_percent: 8.0,
            battery_supply_kw: 0.05,
            stations: (0..stations)
                .map(|i| StationAllocation {
                    index: i,
                    display_name: format!("Station {}", i + 1),
                    allocated_kw: 0.01 * (i + 1) as f32,
                    percent: 20.0,
                    active: false,
                })
                .collect(),
        }
    }

    fn lines(results: &[TickResult]) -> Vec<String> {
        let mut buf = Vec::new();
        write_csv(results, &mut buf).ok();
        String::from_utf8(buf)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn header_has_one_column_per_station() {
        let out = lines(&[make_tick(0, 3)]);
        assert_eq!(
            out[0],
            "tick,timestamp,mode,original_load_kw,flexible_load_kw,served_load_kw,\
             soc_kwh,display_soc_kwh,soc_pct,battery_supply_kw,\
             station_1_kw,station_2_kw,station_3_kw"
        );
    }

    #[test]
    fn rows_format_values_and_mode() {
        let out = lines(&[make_tick(2, 2)]);
        assert_eq!(
            out[1],
            "2,2024-01-01T02:00:00,islanded,31.5000,30.0000,0.0000,\
             0.4000,0.4000,8.00,0.0500,0.0100,0.0200"
        );
    }

    #[test]
    fn row_count_matches_tick_count() {
        let results: Vec<TickResult> = (0..24).map(|t| make_tick(t, 5)).collect();
        assert_eq!(lines(&results).len(), 25);
    }

    #[test]
    fn empty_results_write_fixed_header_only() {
        let out = lines(&[]);
        assert_eq!(out.len(), 1);
        assert!(out[0].ends_with("battery_supply_kw"));
    }

    #[test]
    fn deterministic_output() {
        let results: Vec<TickResult> = (0..5).map(|t| make_tick(t, 4)).collect();
        assert_eq!(lines(&results), lines(&results));
    }
}
