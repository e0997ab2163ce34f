//! Command-line interface for dirsort.
//!
//! This module handles:
//! - Argument parsing and config overrides
//! - Resolving the target directory (prompting when it is omitted)
//! - Validating the target before anything is moved
//! - Wiring configuration, logging and the organizer together

use crate::config::{Config, LogFormat, LogLevel};
use crate::file_category::CategoryMap;
use crate::file_organizer::FileOrganizer;
use crate::logging::{self, LogHandle};
use crate::output::OutputFormatter;
use crate::report;
use anyhow::Result;
use clap::{Parser, ValueHint};
use dialoguer::Input;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing::{error, info};

/// Exit code for configuration and logging setup failures.
pub const EXIT_SETUP_FAILURE: u8 = 2;

/// Errors raised while resolving the target directory.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("'{}' is not an existing directory", .0.display())]
    InvalidDirectory(PathBuf),

    #[error("no directory given")]
    EmptyPath,

    #[error("failed to read directory path: {0}")]
    Prompt(String),
}

/// Sort the files of a directory into category folders by extension.
#[derive(Parser, Debug, Clone)]
#[command(name = "dirsort", author, version, about)]
pub struct Args {
    /// Directory to organize. Prompted for when omitted.
    #[arg(value_name = "DIRECTORY", value_hint = ValueHint::DirPath)]
    pub directory: Option<PathBuf>,

    /// Log what would be moved without touching any file.
    #[arg(long)]
    pub simulate: bool,

    /// Configuration file (defaults to .dirsortrc.toml, then ~/.config/dirsort/config.toml).
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Append log records to this file.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Log to the console only.
    #[arg(long, conflicts_with = "log_file")]
    pub no_log_file: bool,

    /// Minimum severity to log: error, warn, info, debug or trace.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Emit log records as JSON.
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// Apply CLI overrides to a loaded config. Unset flags leave it alone.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(path) = &self.log_file {
            config.logging.file = path.to_string_lossy().into_owned();
        }
        if self.no_log_file {
            config.logging.file.clear();
        }
        if self.json {
            config.logging.format = LogFormat::Json;
        }
    }
}

/// Parses the process arguments.
pub fn parse() -> Args {
    Args::parse()
}

/// Turns typed or pasted input into a path.
///
/// Surrounding whitespace and one pair of matching quotes are removed, as
/// left behind by drag-and-drop into a terminal.
pub fn sanitize_path_input(input: &str) -> PathBuf {
    let trimmed = input.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|&q| {
            trimmed
                .strip_prefix(q)
                .and_then(|rest| rest.strip_suffix(q))
        })
        .unwrap_or(trimmed);
    PathBuf::from(unquoted.trim())
}

fn prompt_for_directory() -> Result<PathBuf, CliError> {
    let input: String = Input::new()
        .with_prompt("Directory to organize")
        .allow_empty(true)
        .interact_text()
        .map_err(|e| CliError::Prompt(e.to_string()))?;
    let path = sanitize_path_input(&input);
    if path.as_os_str().is_empty() {
        return Err(CliError::EmptyPath);
    }
    Ok(path)
}

/// Returns the directory given on the command line, or asks for one.
pub fn resolve_directory(arg: Option<&Path>) -> Result<PathBuf, CliError> {
    match arg {
        Some(path) if path.as_os_str().is_empty() => Err(CliError::EmptyPath),
        Some(path) => Ok(path.to_path_buf()),
        None => prompt_for_directory(),
    }
}

/// Checks that `path` is an existing directory.
pub fn validate_directory(path: &Path) -> Result<(), CliError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(CliError::InvalidDirectory(path.to_path_buf()))
    }
}

/// Runs the application and returns the process exit code.
///
/// Files that could not be moved are logged as warnings and do not change
/// the exit code; an invalid target or an unreadable directory exits with
/// failure, and bad configuration with [`EXIT_SETUP_FAILURE`].
pub fn run_cli(args: Args) -> ExitCode {
    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            OutputFormatter::error(&format!("Error loading configuration: {e}"));
            OutputFormatter::hint(
                "Fix the file or pass --config with a different path. Run with --help for options.",
            );
            return ExitCode::from(EXIT_SETUP_FAILURE);
        }
    };
    args.apply_overrides(&mut config);

    let log = match logging::init(&config.logging) {
        Ok(log) => log,
        Err(e) => {
            OutputFormatter::error(&format!("Error setting up logging: {e:#}"));
            return ExitCode::from(EXIT_SETUP_FAILURE);
        }
    };

    match organize_from_args(&args, &config, &log) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn organize_from_args(args: &Args, config: &Config, log: &LogHandle) -> Result<()> {
    let directory = resolve_directory(args.directory.as_deref())?;
    validate_directory(&directory)?;

    let mut filters = config.filters.compile()?;
    if let Some(log_file) = log.log_file() {
        filters.reserve_path(log_file);
    }

    if args.simulate {
        info!("Simulate mode: no files will be moved");
    }

    let categories = CategoryMap::standard();
    let summary = FileOrganizer::new(&categories)
        .with_filters(filters)
        .organize_with(&directory, args.simulate, |event| {
            report::log_event(&event)
        })?;
    report::log_summary(&summary);

    Ok(())
}
