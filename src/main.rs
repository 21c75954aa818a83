//! outage-sim entry point: CLI wiring, input loading, and the scenario run.

mod cli;

use std::process;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use outage_sim::config::ScenarioConfig;
use outage_sim::io::export::export_csv;
use outage_sim::roster::StationRoster;
use outage_sim::runner::{ScenarioRun, run_scenario_with};
use outage_sim::sim::playback::{LogSink, NullSink, RenderSink};
use outage_sim::sim::types::{TickResult, TrajectoryPoint};
use outage_sim::trajectory::dataset;
use outage_sim::{Error, Result};

use crate::cli::CliOptions;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = CliOptions::parse();
    if let Err(e) = run(&cli) {
        error!("{e}");
        process::exit(1);
    }
}

/// Loads the scenario: `--scenario` takes priority, then `--preset`, then baseline.
fn load_config(cli: &CliOptions) -> Result<ScenarioConfig> {
    let mut config = match (&cli.scenario, &cli.preset) {
        (Some(path), _) => ScenarioConfig::from_toml_file(path)?,
        (None, Some(name)) => ScenarioConfig::from_preset(name)?,
        (None, None) => ScenarioConfig::baseline(),
    };

    if let Some(seed) = cli.seed {
        config.synthetic.seed = seed;
    }
    if let Some(tick) = cli.outage_at {
        config.outage.trigger_after_tick = Some(tick);
    }
    if cli.no_outage {
        config.outage.enabled = false;
    }

    let errors = config.validate();
    if errors.is_empty() {
        Ok(config)
    } else {
        Err(Error::Invalid(errors))
    }
}

fn run(cli: &CliOptions) -> Result<()> {
    let config = load_config(cli)?;

    let trajectory = match &cli.trajectory {
        Some(path) => dataset::load_path(path)?,
        None => config.synthetic_trajectory()?,
    };
    let names = match &cli.stations {
        Some(path) => StationRoster::load_path(path)?.names(config.allocation.max_stations),
        None => Vec::new(),
    };

    let outcome = if cli.quiet {
        play(cli, &config, &trajectory, &names, NullSink)?
    } else {
        play(cli, &config, &trajectory, &names, LogSink)?
    };

    println!("\n{}", outcome.summary);

    if let Some(path) = &cli.telemetry_out {
        let results: Vec<TickResult> = outcome.results().cloned().collect();
        export_csv(&results, path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), rows = results.len(), "telemetry written");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(outage_sim::api::AppState::from_run(config, &outcome));
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = runtime();
        if let Err(e) = rt.block_on(outage_sim::api::serve(state, addr)) {
            error!(%addr, "server error: {e}");
            process::exit(1);
        }
    }

    #[cfg(not(feature = "api"))]
    if cli.serve {
        tracing::warn!("built without the `api` feature; not serving");
    }

    Ok(())
}

#[cfg(feature = "realtime")]
fn play<S>(
    cli: &CliOptions,
    config: &ScenarioConfig,
    trajectory: &[TrajectoryPoint],
    names: &[Option<String>],
    mut sink: S,
) -> Result<ScenarioRun>
where
    S: RenderSink + Send + 'static,
{
    if cli.realtime {
        runtime().block_on(outage_sim::runner::run_scenario_realtime(
            config, trajectory, names, sink,
        ))
    } else {
        run_scenario_with(config, trajectory, names, &mut sink)
    }
}

#[cfg(not(feature = "realtime"))]
fn play<S: RenderSink>(
    cli: &CliOptions,
    config: &ScenarioConfig,
    trajectory: &[TrajectoryPoint],
    names: &[Option<String>],
    mut sink: S,
) -> Result<ScenarioRun> {
    if cli.realtime {
        tracing::warn!("built without the `realtime` feature; playing without a cadence");
    }
    run_scenario_with(config, trajectory, names, &mut sink)
}

#[cfg(feature = "realtime")]
fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| {
            error!("failed to create tokio runtime: {e}");
            process::exit(1);
        })
}
