//! Tracing initialization.
//!
//! Builds a subscriber that writes every record to stdout and, when a log
//! file is configured, appends the same records to that file. Each line
//! carries a local timestamp and the severity.
//!
//! - The level comes from configuration; `RUST_LOG` is not consulted.
//! - The file layer uses `tracing_appender::non_blocking`; the returned
//!   [`LogHandle`] owns its worker guard and must be kept alive until exit.
//! - If the log file cannot be opened a warning is printed and logging
//!   continues on the console only.

use crate::config::{LogFormat, LogLevel, LoggingConfig};
use crate::output::OutputFormatter;
use anyhow::{Context, Result};
use chrono::Local;
use std::fmt as stdfmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, registry};

/// Local timestamp (YYYY-MM-DD HH:MM:SS).
#[derive(Debug, Clone, Copy)]
struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut tsfmt::format::Writer<'_>) -> stdfmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Keeps file logging alive. Dropping it flushes pending records.
#[derive(Debug, Default)]
pub struct LogHandle {
    log_file: Option<PathBuf>,
    _guard: Option<WorkerGuard>,
}

impl LogHandle {
    /// The file being appended to, if file logging is active.
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::new(level.to_string())
}

/// Opens `path` for appending, creating it and its parent directory.
pub fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}

fn maybe_open_non_blocking_writer(path: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    match open_log_file(path) {
        Ok(file) => Some(tracing_appender::non_blocking(file)),
        Err(e) => {
            OutputFormatter::warning(&format!(
                "File logging disabled: {e:#}. Logs will continue on the console."
            ));
            None
        }
    }
}

/// Installs the global subscriber described by `config`.
pub fn init(config: &LoggingConfig) -> Result<LogHandle> {
    let mut handle = LogHandle::default();

    let console_layer = match config.format {
        LogFormat::Compact => tsfmt::layer()
            .with_ansi(io::stdout().is_terminal())
            .with_timer(LocalTime)
            .with_level(true)
            .with_target(false)
            .compact()
            .boxed(),
        LogFormat::Json => tsfmt::layer()
            .json()
            .with_timer(LocalTime)
            .with_level(true)
            .with_target(false)
            .boxed(),
    };

    let file_writer = config.log_file().and_then(|path| {
        let writer = maybe_open_non_blocking_writer(&path)?;
        handle.log_file = Some(path);
        Some(writer)
    });

    let file_layer = file_writer.map(|(writer, guard)| {
        handle._guard = Some(guard);
        match config.format {
            LogFormat::Compact => tsfmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_timer(LocalTime)
                .with_level(true)
                .with_target(false)
                .compact()
                .boxed(),
            LogFormat::Json => tsfmt::layer()
                .json()
                .with_writer(writer)
                .with_timer(LocalTime)
                .with_level(true)
                .with_target(false)
                .boxed(),
        }
    });

    registry()
        .with(env_filter(config.level))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("installing log subscriber")?;

    Ok(handle)
}
