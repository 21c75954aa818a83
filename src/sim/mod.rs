/// Battery state-of-charge dynamics.
pub mod battery;
pub mod engine;
pub mod kpi;
/// Operating mode and its controller.
pub mod mode;
pub mod playback;
/// Fixed-cadence playback task.
#[cfg(feature = "realtime")]
pub mod realtime;
/// Station allocation distributor.
pub mod stations;
pub mod types;
