//! Tracing subscriber setup.
//!
//! The TUI owns the terminal, so interactive runs only log when a log file is
//! given. Headless runs fall back to stderr.

use anyhow::Result;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Where log lines go for this run.
pub enum LogTarget<'a> {
    File(&'a Path),
    Stderr,
    Off,
}

impl<'a> LogTarget<'a> {
    pub fn choose(log_file: Option<&'a Path>, headless: bool) -> Self {
        match (log_file, headless) {
            (Some(path), _) => LogTarget::File(path),
            (None, true) => LogTarget::Stderr,
            (None, false) => LogTarget::Off,
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Build a subscriber that writes to `log_file`.
pub fn file_subscriber(log_file: File) -> impl tracing::Subscriber + Send + Sync {
    let fmt_layer = fmt::layer().with_ansi(false).with_writer(Arc::new(log_file));
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter())
}

/// Install the global subscriber for `target`.
pub fn init(target: LogTarget<'_>) -> Result<()> {
    match target {
        LogTarget::File(path) => {
            let log_file = File::create(path)?;
            file_subscriber(log_file).try_init()?;
        }
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(env_filter())
                .try_init()?;
        }
        LogTarget::Off => {}
    }
    Ok(())
}
