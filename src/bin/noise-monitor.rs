use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use noise_monitor::capture::CpalSource;
use noise_monitor::clock::SystemClock;
use noise_monitor::config::MonitorConfig;
use noise_monitor::indicator::ConsoleIndicator;
use noise_monitor::monitor::{EndReason, MonitorSession};
use noise_monitor::storage::{aggregate, replay};

#[derive(Parser, Debug)]
#[command(
    name = "noise-monitor",
    about = "Ambient noise monitor: live metering, infraction tracking, daily logs"
)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, default_value = "settings.json")]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Monitor the microphone until interrupted
    Run,
    /// Recover one day's infraction count from its log
    Replay {
        /// Day to replay (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Per-day infraction counts over a trailing window
    Report {
        /// Number of days in the window
        #[arg(long, default_value_t = 7)]
        days: u32,
        /// Last day of the window inclusive (defaults to today)
        #[arg(long)]
        end: Option<NaiveDate>,
    },
}

fn main() -> ExitCode {
    noise_monitor::init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = MonitorConfig::load_from_file(&cli.config);

    match cli.command {
        Commands::Run => run_monitor(config),
        Commands::Replay { date } => run_replay(&config, date),
        Commands::Report { days, end } => run_report(&config, days, end),
    }
}

fn run_monitor(config: MonitorConfig) -> Result<ExitCode> {
    let source = CpalSource::open(&config.audio).context("opening audio input")?;
    let mut session = MonitorSession::start(config, source, ConsoleIndicator, SystemClock)
        .context("starting monitor session")?;

    // Ctrl-c is awaited on a dedicated thread with its own small runtime;
    // the monitor loop itself stays synchronous and observes the flag at
    // its acquisition point.
    let shutdown = session.shutdown_handle();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to create Tokio runtime for signal handling");
        rt.block_on(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("[Main] Interrupt received; stopping after current frame");
                shutdown.store(true, Ordering::SeqCst);
            }
        });
    });

    let summary = session.run();
    println!(
        "{} frame(s), {} acquisition error(s), {} infraction(s) today",
        summary.frames_processed, summary.acquisition_errors, summary.infraction_count
    );

    match summary.end_reason {
        EndReason::ShutdownRequested => Ok(ExitCode::from(0)),
        EndReason::SourceLost | EndReason::AcquisitionStalled => Ok(ExitCode::from(1)),
    }
}

fn run_replay(config: &MonitorConfig, date: Option<NaiveDate>) -> Result<ExitCode> {
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let data_dir = PathBuf::from(&config.storage.data_dir);

    let summary = replay(&data_dir, date, &config.thresholds)
        .with_context(|| format!("replaying log for {date}"))?;

    println!("{}: {} infraction(s)", summary.date, summary.infraction_count);
    if let Some(last) = summary.last_infraction {
        println!("last infraction at {last}");
    }
    if summary.skipped_records > 0 {
        println!(
            "{} unparseable record(s) skipped; count may be low",
            summary.skipped_records
        );
    }
    Ok(ExitCode::from(0))
}

fn run_report(config: &MonitorConfig, days: u32, end: Option<NaiveDate>) -> Result<ExitCode> {
    let end = end.unwrap_or_else(|| Local::now().date_naive());
    let data_dir = PathBuf::from(&config.storage.data_dir);

    let window = aggregate(&data_dir, end, days, &config.thresholds)
        .with_context(|| format!("aggregating {days} day(s) ending {end}"))?;

    for day in &window {
        println!("{}  {:>4}", day.date, day.infraction_count);
    }
    Ok(ExitCode::from(0))
}
