//! Naive "tomorrow is today" forecast used to fill the forecast column of
//! synthetic trajectories.

/// Repeats one observed day across the requested horizon.
#[derive(Debug, Default, Clone, Copy)]
pub struct NaiveForecast;

impl NaiveForecast {
    /// Produce a naive forecast for the given horizon.
    ///
    /// # Arguments
    ///
    /// * `observed_day` - Values of the first observed day
    /// * `horizon` - Number of points to forecast
    ///
    /// # Returns
    ///
    /// A vector of length `horizon`; zeros when nothing was observed.
    pub fn forecast(&self, observed_day: &[f32], horizon: usize) -> Vec<f32> {
        if observed_day.is_empty() {
            return vec![0.0; horizon];
        }
        observed_day.iter().copied().cycle().take(horizon).collect()
    }
}
