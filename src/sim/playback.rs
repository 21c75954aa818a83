//! Tick-by-tick playback of a trajectory through the engine.

use tracing::{debug, info};

use super::engine::Engine;
use super::mode::OperatingMode;
use super::types::{TickResult, TrajectoryPoint};

/// Receives one read-only [`TickResult`] per processed tick.
pub trait RenderSink {
    /// Called once per tick, after the engine has finished the tick.
    fn render(&mut self, tick: &TickResult);
}

impl<T: RenderSink + ?Sized> RenderSink for &mut T {
    fn render(&mut self, tick: &TickResult) {
        (**self).render(tick);
    }
}

impl RenderSink for Vec<TickResult> {
    fn render(&mut self, tick: &TickResult) {
        self.push(tick.clone());
    }
}

/// Sink that writes each tick to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl RenderSink for LogSink {
    fn render(&mut self, tick: &TickResult) {
        info!("{tick}");
    }
}

/// Sink that drops every tick.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn render(&mut self, _tick: &TickResult) {}
}

/// One playback run over a finite, pre-fetched trajectory.
///
/// A run owns its label buffer; starting a new run discards everything from
/// the previous one except the engine's charge level. Once the source is
/// exhausted or the run is stopped, no further ticks are processed.
///
/// # Examples
///
/// ```
/// use outage_sim::sim::battery::{BatteryParams, BatterySimulator};
/// use outage_sim::sim::engine::Engine;
/// use outage_sim::sim::playback::Playback;
/// use outage_sim::sim::stations::{AllocationParams, StationDistributor};
/// use outage_sim::sim::types::{TickResult, TrajectoryPoint};
///
/// let mut engine = Engine::new(
///     BatterySimulator::new(BatteryParams::default(), 0.0),
///     StationDistributor::unnamed(AllocationParams::default(), 2),
/// );
/// let points = vec![TrajectoryPoint::at("00:00"), TrajectoryPoint::at("01:00")];
/// let mut sink: Vec<TickResult> = Vec::new();
///
/// let mut run = Playback::start(&mut engine, points);
/// assert_eq!(run.run_to_end(&mut engine, &mut sink), 2);
/// assert!(run.is_finished());
/// ```
pub struct Playback<I = std::vec::IntoIter<TrajectoryPoint>> {
    source: Option<I>,
    labels: Vec<String>,
}

impl<I: Iterator<Item = TrajectoryPoint>> Playback<I> {
    /// Begins a fresh run over `source`.
    pub fn start<S>(engine: &mut Engine, source: S) -> Self
    where
        S: IntoIterator<IntoIter = I>,
    {
        engine.begin_run();
        info!(
            mode = %engine.mode(),
            soc_kwh = engine.battery().state().state_of_charge_kwh,
            "playback run started"
        );
        Self {
            source: Some(source.into_iter()),
            labels: Vec::new(),
        }
    }

    /// Processes the next point, if any.
    ///
    /// # Returns
    ///
    /// `true` if a tick was processed, `false` once the run has ended.
    pub fn tick(&mut self, engine: &mut Engine, sink: &mut impl RenderSink) -> bool {
        let Some(point) = self.source.as_mut().and_then(Iterator::next) else {
            if self.source.take().is_some() {
                info!(ticks = self.labels.len(), "playback run finished");
            }
            return false;
        };
        let result = engine.step(&point);
        sink.render(&result);
        self.labels.push(point.timestamp);
        true
    }

    /// Processes every remaining point and returns how many ticks ran.
    pub fn run_to_end(&mut self, engine: &mut Engine, sink: &mut impl RenderSink) -> usize {
        let mut ticks = 0;
        while self.tick(engine, sink) {
            ticks += 1;
        }
        ticks
    }

    /// Cancels the run; points not yet processed are discarded.
    pub fn stop(&mut self) {
        if self.source.take().is_some() {
            debug!(ticks = self.labels.len(), "playback run stopped");
        }
    }

    /// Applies a mode trigger between ticks.
    ///
    /// Leaving [`OperatingMode::Islanded`] for grid-connected ends the run.
    pub fn set_mode(&mut self, engine: &mut Engine, target: OperatingMode) {
        let previous = engine.mode();
        if engine.set_mode(target) && previous.is_islanded() {
            self.stop();
        }
    }

    /// Returns `true` once the run can process no more ticks.
    pub fn is_finished(&self) -> bool {
        self.source.is_none()
    }

    /// Labels of the ticks processed in this run, in order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}
