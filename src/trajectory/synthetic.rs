use chrono::{NaiveDateTime, TimeDelta};
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::TrajectoryPoint;
use super::forecast::NaiveForecast;

/// Label format of generated timestamps.
pub const LABEL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A facility load generator that models a daily consumption pattern.
///
/// `SyntheticLoad` produces a sinusoidal demand with configurable baseline,
/// amplitude, phase, and seeded Gaussian noise. It stands in for the facility
/// dataset when no CSV is available.
///
/// # Examples
///
/// ```
/// use outage_sim::trajectory::synthetic::SyntheticLoad;
///
/// let mut load = SyntheticLoad::new(
///     30.0, // base_kw
///     12.0, // amp_kw
///     0.0,  // phase_rad
///     0.0,  // noise_std
///     24,   // steps_per_day
///     42,   // seed
/// );
/// assert_eq!(load.demand_kw(0), load.trend_kw(0));
/// ```
#[derive(Debug, Clone)]
pub struct SyntheticLoad {
    /// Baseline power consumption in kilowatts.
    pub base_kw: f32,

    /// Amplitude of the daily variation in kilowatts.
    pub amp_kw: f32,

    /// Phase offset of the daily pattern in radians.
    pub phase_rad: f32,

    /// Standard deviation of the Gaussian noise in kilowatts.
    pub noise_std: f32,

    /// Number of points per simulated day.
    pub steps_per_day: usize,

    rng: StdRng,
}

impl SyntheticLoad {
    /// Creates a new generator; `steps_per_day` is floored at 1.
    pub fn new(
        base_kw: f32,
        amp_kw: f32,
        phase_rad: f32,
        noise_std: f32,
        steps_per_day: usize,
        seed: u64,
    ) -> Self {
        Self {
            base_kw,
            amp_kw,
            phase_rad,
            noise_std,
            steps_per_day: steps_per_day.max(1),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Noise-free daily pattern at `step`, never negative.
    pub fn trend_kw(&self, step: usize) -> f32 {
        let day_pos = (step % self.steps_per_day) as f32 / self.steps_per_day as f32;
        let angle = 2.0 * std::f32::consts::PI * day_pos + self.phase_rad;
        (self.base_kw + self.amp_kw * angle.sin()).max(0.0)
    }

    /// Observed demand at `step`: the trend plus noise, never negative.
    pub fn demand_kw(&mut self, step: usize) -> f32 {
        let noise = if self.noise_std > 0.0 {
            // Box-Muller
            let u1: f32 = self.rng.random::<f32>().clamp(1e-6, 1.0);
            let u2: f32 = self.rng.random::<f32>();
            let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
            z0 * self.noise_std
        } else {
            0.0
        };
        (self.trend_kw(step) + noise).max(0.0)
    }
}

/// Shape of a generated trajectory.
#[derive(Debug, Clone)]
pub struct SyntheticTrajectory {
    /// Label of the first point.
    pub start: NaiveDateTime,
    /// Spacing between points in minutes.
    pub step_minutes: i64,
    /// Number of points.
    pub points: usize,
    /// Fraction of the load above trend removed by demand response (0..=1).
    pub shift_fraction: f32,
    /// Fraction of the load that is served (0..=1).
    pub served_fraction: f32,
}

impl SyntheticTrajectory {
    /// Generates the points, drawing demand from `load`.
    ///
    /// The forecast column repeats the first day's observed load.
    pub fn generate(&self, load: &mut SyntheticLoad) -> Vec<TrajectoryPoint> {
        let observed: Vec<f32> = (0..self.points).map(|t| load.demand_kw(t)).collect();
        let first_day = &observed[..observed.len().min(load.steps_per_day)];
        let forecast = NaiveForecast.forecast(first_day, self.points);

        observed
            .iter()
            .zip(forecast)
            .enumerate()
            .map(|(t, (&load_kw, forecast_kw))| {
                let trend_kw = load.trend_kw(t);
                let excess = (load_kw - trend_kw).max(0.0);
                TrajectoryPoint {
                    timestamp: self.label(t),
                    load_kw: Some(load_kw),
                    shifted_load_kw: Some(load_kw - self.shift_fraction * excess),
                    served_kw: Some(load_kw * self.served_fraction),
                    trend_kw: Some(trend_kw),
                    forecast_kw: Some(forecast_kw),
                }
            })
            .collect()
    }

    fn label(&self, step: usize) -> String {
        let minutes = self.step_minutes.saturating_mul(step as i64);
        TimeDelta::try_minutes(minutes)
            .and_then(|delta| self.start.checked_add_signed(delta))
            .map_or_else(|| format!("step-{step}"), |dt| dt.format(LABEL_FORMAT).to_string())
    }
}
