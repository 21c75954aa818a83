use std::path::PathBuf;

use clap::Parser;

/// Battery outage playback: a grid-connected day, then the same day islanded.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct CliOptions {
    /// Scenario TOML file.
    #[arg(long, value_name = "PATH", conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Built-in preset (baseline, early_storm, critical_load).
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Facility dataset CSV; a synthetic day is generated when omitted.
    #[arg(long, value_name = "PATH", env = "OUTAGE_SIM_TRAJECTORY")]
    pub trajectory: Option<PathBuf>,

    /// Station details CSV.
    #[arg(long, value_name = "PATH", env = "OUTAGE_SIM_STATIONS")]
    pub stations: Option<PathBuf>,

    /// Override the synthetic trajectory seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Island after this many grid-connected ticks.
    #[arg(long = "outage-at", value_name = "TICK", conflicts_with = "no_outage")]
    pub outage_at: Option<usize>,

    /// Play the grid-connected run only.
    #[arg(long)]
    pub no_outage: bool,

    /// Export tick results to CSV.
    #[arg(long, value_name = "PATH")]
    pub telemetry_out: Option<PathBuf>,

    /// Do not print each tick.
    #[arg(long, short)]
    pub quiet: bool,

    /// Play at the configured wall-clock cadence (`realtime` feature).
    #[arg(long)]
    pub realtime: bool,

    /// Serve the results over HTTP after the run (`api` feature).
    #[arg(long)]
    pub serve: bool,

    /// API server port.
    #[arg(long, default_value_t = 3000)]
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_scenario_cli() {
        let opts = CliOptions::try_parse_from(["outage-sim", "--scenario", "storm.toml"])
            .expect("parse should succeed");
        assert_eq!(
            opts.scenario.as_deref().and_then(|p| p.to_str()),
            Some("storm.toml")
        );
        assert!(opts.preset.is_none());
    }

    #[test]
    fn supports_preset_and_outage_tick() {
        let opts =
            CliOptions::try_parse_from(["outage-sim", "--preset", "early_storm", "--outage-at", "4"])
                .expect("parse should succeed");
        assert_eq!(opts.preset.as_deref(), Some("early_storm"));
        assert_eq!(opts.outage_at, Some(4));
        assert!(!opts.no_outage);
    }

    #[test]
    fn scenario_and_preset_are_exclusive() {
        let err = CliOptions::try_parse_from([
            "outage-sim",
            "--scenario",
            "a.toml",
            "--preset",
            "baseline",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn outage_tick_conflicts_with_no_outage() {
        let err =
            CliOptions::try_parse_from(["outage-sim", "--outage-at", "3", "--no-outage"]);
        assert!(err.is_err());
    }
}
