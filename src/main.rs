//! CLI entry point for the UQ Lakes station bus tracker.
//!
//! Asks for a departure date, time and route (or takes them as flags),
//! refreshes the realtime feeds and prints the buses due within the window.

use std::ffi::OsStr;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::Parser;
use lakes_tracker::{
    config::Settings,
    fetch::BasicClient,
    output::append_record,
    tracker::{Outcome, Tracker, TripQuery, present},
};
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "lakes-tracker")]
#[command(about = "Shows buses due at UQ Lakes station around a departure time", long_about = None)]
struct Cli {
    /// Departure date (YYYY-MM-DD); prompted for when omitted
    #[arg(short, long)]
    date: Option<String>,

    /// Departure time (HH:mm); prompted for when omitted
    #[arg(short, long)]
    time: Option<String>,

    /// Bus route short name, or "all"; prompted for when omitted
    #[arg(short, long)]
    route: Option<String>,

    /// CSV file to append the matching buses to
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/lakes_tracker.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("lakes_tracker.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    println!("Welcome to the UQ Lakes station bus tracker!\n");

    let date = answer(
        cli.date,
        "What date will you depart UQ Lakes station by bus? (YYYY-MM-DD): ",
    )?;
    let time = answer(
        cli.time,
        "What time will you depart UQ Lakes station by bus? (HH:mm): ",
    )?;
    let route = answer(
        cli.route,
        "What Bus Route would you like to take? (Show All Routes, 66, 169, 209, etc): ",
    )?;

    let query = TripQuery::parse(&date, &time, &route, &Local)?;
    info!(departure = query.departure, route = ?query.route, "Query ready");

    let client = BasicClient::with_timeout(settings.timeout)?;
    let tracker = Tracker::new(client, settings);
    let outcome = tracker.run(&query).await;

    present(&outcome, &mut io::stdout().lock())?;

    if let (Some(path), Outcome::Buses(buses)) = (&cli.csv, &outcome) {
        for bus in buses {
            if let Err(e) = append_record(path, bus) {
                error!(path = %path.display(), error = %e, "Failed to write CSV record");
                break;
            }
        }
    }

    Ok(())
}

/// Returns the flag value if given, otherwise asks on stdin.
fn answer(given: Option<String>, question: &str) -> Result<String> {
    if let Some(value) = given {
        return Ok(value);
    }

    let mut stdout = io::stdout().lock();
    stdout.write_all(question.as_bytes())?;
    stdout.flush()?;

    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading answer from stdin")?;
    if read == 0 {
        bail!("input closed before answering: {}", question.trim());
    }
    Ok(line.trim().to_string())
}
