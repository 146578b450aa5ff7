use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use craftdo::cli::commands::Cli;
use craftdo::cli::handlers;
use craftdo::io::storage;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE: &str = "craftdo.log";

/// Tracing is opt-in via RUST_LOG; an empty or invalid filter means off.
fn env_filter() -> Option<EnvFilter> {
    let raw = std::env::var("RUST_LOG").ok()?;
    let raw = raw.trim();
    if raw.is_empty() || raw.len() > 4096 {
        return None;
    }
    EnvFilter::try_new(raw).ok()
}

/// CLI commands log to stderr
fn init_stderr_tracing() {
    let filter = env_filter().unwrap_or_else(|| EnvFilter::new("off"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// The TUI owns the terminal, so it logs to a file in the data dir
fn init_file_tracing(data_dir: &Path) {
    let Some(filter) = env_filter() else {
        return;
    };
    let _ = std::fs::create_dir_all(data_dir);
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join(LOG_FILE))
    else {
        return;
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .with(filter)
        .init();
}

fn run_tui(data_dir: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let dir = storage::resolve_data_dir(data_dir)?;
    init_file_tracing(&dir);
    craftdo::tui::run(&dir)
}

fn main() {
    let cli = Cli::parse();

    if cli.command.is_none() {
        // No subcommand → launch TUI
        if let Err(e) = run_tui(cli.data_dir.as_deref()) {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    init_stderr_tracing();
    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
