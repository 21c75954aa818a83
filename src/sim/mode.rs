//! Operating mode of the facility and the single rule for switching it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether the facility draws from the grid or runs on the battery alone.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// Grid supplies the load; the battery tops up slowly and supplies nothing.
    #[default]
    GridConnected,
    /// Grid outage; the battery is the sole source for the stations.
    Islanded,
}

impl OperatingMode {
    /// Returns `true` for [`OperatingMode::Islanded`].
    pub fn is_islanded(self) -> bool {
        matches!(self, Self::Islanded)
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GridConnected => f.pad("grid_connected"),
            Self::Islanded => f.pad("islanded"),
        }
    }
}

/// Holds the current [`OperatingMode`].
///
/// The mode only changes when an external actor asks for it; nothing in the
/// engine switches modes on a timer.
#[derive(Debug, Default, Clone)]
pub struct ModeController {
    mode: OperatingMode,
}

impl ModeController {
    /// Creates a controller starting in `mode`.
    pub fn new(mode: OperatingMode) -> Self {
        Self { mode }
    }

    /// Returns the active mode.
    pub fn current_mode(&self) -> OperatingMode {
        self.mode
    }

    /// Switches to `target` immediately.
    ///
    /// # Returns
    ///
    /// `true` if the mode changed, `false` if `target` was already active.
    pub fn set_mode(&mut self, target: OperatingMode) -> bool {
        if self.mode == target {
            return false;
        }
        self.mode = target;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_grid_connected_by_default() {
        let controller = ModeController::default();
        assert_eq!(controller.current_mode(), OperatingMode::GridConnected);
    }

    #[test]
    fn setting_current_mode_is_a_no_op() {
        let mut controller = ModeController::new(OperatingMode::Islanded);
        assert!(!controller.set_mode(OperatingMode::Islanded));
        assert_eq!(controller.current_mode(), OperatingMode::Islanded);
    }

    #[test]
    fn switch_is_immediate_both_ways() {
        let mut controller = ModeController::default();
        assert!(controller.set_mode(OperatingMode::Islanded));
        assert!(controller.current_mode().is_islanded());
        assert!(controller.set_mode(OperatingMode::GridConnected));
        assert!(!controller.current_mode().is_islanded());
    }

    #[test]
    fn display_uses_snake_case() {
        assert_eq!(OperatingMode::GridConnected.to_string(), "grid_connected");
        assert_eq!(OperatingMode::Islanded.to_string(), "islanded");
    }
}
