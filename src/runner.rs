//! Baseline-then-outage scenario runs.

use tracing::info;

use crate::config::ScenarioConfig;
use crate::error::Result;
use crate::sim::engine::Engine;
use crate::sim::kpi::PlaybackSummary;
use crate::sim::mode::OperatingMode;
use crate::sim::playback::{NullSink, Playback, RenderSink};
use crate::sim::types::{TickResult, TrajectoryPoint};

/// Everything produced by one scenario run.
#[derive(Debug, Clone)]
pub struct ScenarioRun {
    /// Grid-connected ticks, in order.
    pub baseline: Vec<TickResult>,
    /// Islanded ticks, in order; empty when the outage is disabled.
    pub outage: Vec<TickResult>,
    /// Summary over both runs.
    pub summary: PlaybackSummary,
    /// Engine state after the last tick.
    pub engine: Engine,
}

impl ScenarioRun {
    /// Baseline then outage ticks.
    pub fn results(&self) -> impl Iterator<Item = &TickResult> {
        self.baseline.iter().chain(&self.outage)
    }

    /// Station names in display order.
    pub fn station_names(&self) -> Vec<String> {
        self.engine
            .stations()
            .stations()
            .iter()
            .map(|s| s.display_name.clone())
            .collect()
    }
}

/// Keeps every tick while forwarding it to another sink.
struct Recorder<S> {
    results: Vec<TickResult>,
    inner: S,
}

impl<S> Recorder<S> {
    fn new(inner: S) -> Self {
        Self {
            results: Vec::new(),
            inner,
        }
    }
}

impl<S: RenderSink> RenderSink for Recorder<S> {
    fn render(&mut self, result: &TickResult) {
        self.inner.render(result);
        self.results.push(result.clone());
    }
}

/// Points played grid-connected before the outage.
fn baseline_points(config: &ScenarioConfig, trajectory: &[TrajectoryPoint]) -> Vec<TrajectoryPoint> {
    let len = config
        .outage
        .trigger_after_tick
        .unwrap_or(trajectory.len())
        .min(trajectory.len());
    trajectory[..len].to_vec()
}

fn finish(
    config: &ScenarioConfig,
    baseline: Vec<TickResult>,
    outage: Vec<TickResult>,
    engine: Engine,
) -> ScenarioRun {
    let all: Vec<TickResult> = baseline.iter().chain(&outage).cloned().collect();
    let summary = PlaybackSummary::from_results(&all, config.battery.tick_duration_hours);
    info!(
        baseline_ticks = baseline.len(),
        outage_ticks = outage.len(),
        final_soc_kwh = summary.final_soc_kwh,
        "scenario finished"
    );
    ScenarioRun {
        baseline,
        outage,
        summary,
        engine,
    }
}

/// Runs a scenario without rendering.
///
/// # Errors
///
/// Returns an error if the outage storm window is not a valid time range.
pub fn run_scenario(
    config: &ScenarioConfig,
    trajectory: &[TrajectoryPoint],
    roster_names: &[Option<String>],
) -> Result<ScenarioRun> {
    run_scenario_with(config, trajectory, roster_names, &mut NullSink)
}

/// Runs a scenario, sending every tick to `sink` as it is produced.
///
/// The baseline trajectory is played grid-connected, truncated after
/// `outage.trigger_after_tick` ticks when set. If the outage is enabled the
/// engine then islands and plays the storm trajectory as a fresh run; the
/// state of charge carries over.
///
/// # Arguments
///
/// * `config` - Scenario configuration
/// * `trajectory` - Facility trajectory for the day
/// * `roster_names` - Station names; empty uses the default station count
/// * `sink` - Receives each tick result
///
/// # Errors
///
/// Returns an error if the outage storm window is not a valid time range.
pub fn run_scenario_with(
    config: &ScenarioConfig,
    trajectory: &[TrajectoryPoint],
    roster_names: &[Option<String>],
    sink: &mut impl RenderSink,
) -> Result<ScenarioRun> {
    let mut engine = config.build_engine(roster_names);
    info!(
        points = trajectory.len(),
        stations = engine.stations().stations().len(),
        outage = config.outage.enabled,
        "scenario started"
    );

    let mut recorder = Recorder::new(&mut *sink);
    Playback::start(&mut engine, baseline_points(config, trajectory))
        .run_to_end(&mut engine, &mut recorder);
    let baseline = std::mem::take(&mut recorder.results);

    if config.outage.enabled {
        let storm = config.outage_scenario()?.apply(trajectory);
        engine.set_mode(OperatingMode::Islanded);
        Playback::start(&mut engine, storm).run_to_end(&mut engine, &mut recorder);
    }
    let outage = recorder.results;

    Ok(finish(config, baseline, outage, engine))
}

/// Runs a scenario at the configured cadence on the current tokio runtime.
///
/// Same sequence as [`run_scenario_with`], one tick per
/// `playback.cadence_ms`.
///
/// # Errors
///
/// Returns an error if the storm window is invalid or a playback task fails.
#[cfg(feature = "realtime")]
pub async fn run_scenario_realtime<S>(
    config: &ScenarioConfig,
    trajectory: &[TrajectoryPoint],
    roster_names: &[Option<String>],
    sink: S,
) -> Result<ScenarioRun>
where
    S: RenderSink + Send + 'static,
{
    use crate::sim::realtime::PlaybackHandle;

    let storm = if config.outage.enabled {
        Some(config.outage_scenario()?.apply(trajectory))
    } else {
        None
    };

    let engine = config.build_engine(roster_names);
    let handle = PlaybackHandle::spawn(
        engine,
        baseline_points(config, trajectory),
        config.cadence(),
        Recorder::new(sink),
    );
    let (mut engine, mut recorder) = handle.join().await?;
    let baseline = std::mem::take(&mut recorder.results);

    let (engine, recorder) = match storm {
        Some(points) => {
            engine.set_mode(OperatingMode::Islanded);
            PlaybackHandle::spawn(engine, points, config.cadence(), recorder)
                .join()
                .await?
        }
        None => (engine, recorder),
    };

    Ok(finish(config, baseline, recorder.results, engine))
}
