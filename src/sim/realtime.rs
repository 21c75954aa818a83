//! Fixed-cadence playback as a cancellable tokio task.
//!
//! Feature-gated behind `realtime`. The task owns the engine for the length
//! of the run. Mode triggers and stop requests travel through a
//! single-consumer queue that is always drained before the next timer tick,
//! so ticks never interleave with commands and nothing fires after a stop.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use super::engine::Engine;
use super::mode::OperatingMode;
use super::playback::{Playback, RenderSink};
use super::types::TrajectoryPoint;

/// Commands accepted by a running playback task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    SetMode(OperatingMode),
    Stop,
}

/// Handle to a running playback task.
pub struct PlaybackHandle<S> {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<(Engine, S)>,
}

impl<S: RenderSink + Send + 'static> PlaybackHandle<S> {
    /// Starts a fresh run of `points`, one tick every `cadence`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        mut engine: Engine,
        points: Vec<TrajectoryPoint>,
        cadence: Duration,
        mut sink: S,
    ) -> Self {
        let (commands, mut rx) = mpsc::unbounded_channel();
        let cadence = cadence.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let mut run = Playback::start(&mut engine, points);
            let mut interval = time::interval(cadence);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    command = rx.recv() => match command {
                        Some(Command::SetMode(mode)) => {
                            run.set_mode(&mut engine, mode);
                            if run.is_finished() {
                                break;
                            }
                        }
                        Some(Command::Stop) | None => {
                            run.stop();
                            break;
                        }
                    },
                    _ = interval.tick() => {
                        if !run.tick(&mut engine, &mut sink) {
                            break;
                        }
                    }
                }
            }
            debug!(ticks = run.labels().len(), "playback task exited");
            (engine, sink)
        });

        Self { commands, task }
    }

    /// Requests a mode switch before the next tick.
    pub fn set_mode(&self, mode: OperatingMode) {
        // A send error only means the task has already ended.
        let _ = self.commands.send(Command::SetMode(mode));
    }

    /// Cancels the run; ticks not yet dispatched are discarded.
    pub fn stop(&self) {
        let _ = self.commands.send(Command::Stop);
    }

    /// Returns `true` once the task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the run to end and hands back the engine and the sink.
    ///
    /// # Errors
    ///
    /// Returns a `JoinError` if the task panicked or was aborted.
    pub async fn join(self) -> Result<(Engine, S), JoinError> {
        let Self { commands, task } = self;
        let out = task.await;
        drop(commands);
        out
    }
}
