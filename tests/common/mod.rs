//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use outage_sim::sim::battery::{BatteryParams, BatterySimulator};
use outage_sim::sim::engine::Engine;
use outage_sim::sim::stations::{AllocationParams, StationDistributor};
use outage_sim::sim::types::TrajectoryPoint;

/// Engine with default constants (5 kWh capacity) and `stations` unnamed stations.
pub fn default_engine(stations: usize, initial_soc_kwh: f32) -> Engine {
    Engine::new(
        BatterySimulator::new(BatteryParams::default(), initial_soc_kwh),
        StationDistributor::unnamed(AllocationParams::default(), stations),
    )
}

/// One trajectory point with a load and a served reading.
pub fn point(label: &str, load_kw: f32, served_kw: f32) -> TrajectoryPoint {
    TrajectoryPoint {
        load_kw: Some(load_kw),
        shifted_load_kw: Some(load_kw * 0.9),
        served_kw: Some(served_kw),
        ..TrajectoryPoint::at(label)
    }
}

/// `n` hourly points starting at midnight with a constant served load.
pub fn hourly_day(n: usize, served_kw: f32) -> Vec<TrajectoryPoint> {
    (0..n)
        .map(|i| {
            point(
                &format!("2024-01-01T{:02}:00:00", i % 24),
                30.0,
                served_kw,
            )
        })
        .collect()
}

/// Writes `contents` to a fresh file in the temp directory and returns its path.
pub fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("outage-sim-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir should be writable");
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("temp file should be writable");
    path
}
