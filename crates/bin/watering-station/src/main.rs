//! # watering-station: one watering cycle per invocation
//!
//! Composition root meant to be started periodically (cron, systemd timer).
//!
//! ## Responsibilities
//! - Parse CLI arguments and load the TOML configuration
//! - Initialize logging
//! - Construct the hardware backend, state store and reporting sinks
//! - Run the watering engine once, racing it against the termination
//!   signals listed in [`signal::INTERRUPTING`]
//! - Map the result to an exit code
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;
mod signal;

use std::io::IsTerminal as _;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt as _;
use watering_adapter_hardware::{HardwareBackend, HardwareMode};
use watering_adapter_reporting::{ConsoleReporter, CsvReporter};
use watering_adapter_state_json::JsonStateStore;
use watering_app::watering_engine::WateringEngine;
use watering_domain::error::StateSaveError;
use watering_domain::outcome::RunSummary;

use crate::config::{DEFAULT_CONFIG_FILE, StationConfig, expand_home};
use crate::signal::Shutdown;

const EXIT_FATAL: u8 = 1;
const EXIT_STATE_NOT_SAVED: u8 = 2;
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Debug, Parser)]
#[command(name = "watering-station", version)]
#[command(
    about = "Water plant pots whose soil moisture sensors report dry soil",
    long_about = None
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short = 'c', long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    config_file: PathBuf,

    /// Log at debug level
    #[arg(short = 'D', long)]
    debug: bool,

    /// Log at info level
    #[arg(short, long)]
    verbose: bool,

    /// Use simulated sensors and relays instead of the real hardware
    #[arg(long)]
    fake_hardware: bool,
}

impl Cli {
    fn hardware_mode(&self) -> HardwareMode {
        if self.fake_hardware {
            HardwareMode::Fake
        } else {
            HardwareMode::Real
        }
    }

    /// Level forced on the command line, if any.
    fn log_level(&self) -> Option<&'static str> {
        if self.debug {
            Some("debug")
        } else if self.verbose {
            Some("info")
        } else {
            None
        }
    }
}

enum RunEnd {
    Finished(Result<RunSummary, StateSaveError>),
    Interrupted(&'static str),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match StationConfig::load(&expand_home(&cli.config_file)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("watering-station: {:#}", anyhow::Error::new(err));
            return ExitCode::from(EXIT_FATAL);
        }
    };

    init_tracing(&cli, &config);

    match run(&cli, &config).await {
        Ok(code) => code,
        Err(err) => {
            error!(error = %format!("{err:#}"), "fatal error");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn init_tracing(cli: &Cli, config: &StationConfig) {
    let directive = log_directive(cli, config);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|err| {
        eprintln!("watering-station: ignoring invalid log filter {directive:?}: {err}");
        EnvFilter::new("warn")
    });

    log_subscriber(filter, std::io::stderr().is_terminal(), std::io::stderr).init();
}

/// Command-line level, then the configured filter, then `warn`.
fn log_directive(cli: &Cli, config: &StationConfig) -> String {
    cli.log_level()
        .map(str::to_string)
        .or_else(|| config.log_filter.clone())
        .unwrap_or_else(|| "warn".to_string())
}

/// Formatted subscriber that emits ANSI colors only when `ansi` is set.
fn log_subscriber<W>(
    filter: EnvFilter,
    ansi: bool,
    writer: W,
) -> impl tracing::Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(ansi)
        .with_writer(writer)
        .finish()
}

async fn run(cli: &Cli, config: &StationConfig) -> anyhow::Result<ExitCode> {
    let csv = config
        .stats_file
        .as_ref()
        .map(|path| CsvReporter::new(path, config.timestamp_format.as_str()))
        .transpose()
        .context("invalid statistics sink configuration")?;
    let console = std::io::stdout().is_terminal().then(ConsoleReporter::new);

    let hardware = HardwareBackend::from_settings(cli.hardware_mode(), &config.hardware);
    let store = JsonStateStore::new(&config.state_file);
    let engine =
        WateringEngine::new(hardware, (csv, console)).with_settle_delay(config.settle_delay);

    info!(
        pots = config.roster.len(),
        state_file = %store.path().display(),
        hardware = ?cli.hardware_mode(),
        "starting watering run",
    );

    let mut shutdown = Shutdown::listen();
    let end = until_shutdown(engine.execute(&config.roster, &store), &mut shutdown).await;

    Ok(match end {
        RunEnd::Finished(Ok(summary)) => {
            for failure in &summary.failures {
                warn!(pot = %failure.pot_id, error = %failure.error, "pot not fully processed");
            }
            ExitCode::SUCCESS
        }
        RunEnd::Finished(Err(_)) => ExitCode::from(EXIT_STATE_NOT_SAVED),
        RunEnd::Interrupted(signal) => {
            warn!(signal, "run interrupted, relays closed, pot state not saved");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    })
}

/// Drive `run` to completion unless a termination signal arrives first, in
/// which case `run` is dropped before returning.
async fn until_shutdown<F>(run: F, shutdown: &mut Shutdown) -> RunEnd
where
    F: Future<Output = Result<RunSummary, StateSaveError>>,
{
    tokio::select! {
        result = run => RunEnd::Finished(result),
        signal = shutdown.recv() => RunEnd::Interrupted(signal),
    }
}
