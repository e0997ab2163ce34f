//! Configuration loading and file filtering.
//!
//! Configuration is read from a TOML file and controls two things: where and
//! how log output is written, and which files in the target directory are
//! eligible for sorting. The category table itself is fixed and is not part
//! of the configuration.
//!
//! # Configuration File Format
//!
//! ```toml
//! [logging]
//! level = "info"
//! file = "dirsort.log"
//! format = "compact"
//!
//! [filters]
//! skip_hidden_files = false
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! extensions = ["part", "crdownload"]
//! patterns = ["*.tmp"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```
//!
//! Glob and regex rules are matched against the file name, since only the
//! immediate children of the target directory are ever considered.

use glob::Pattern;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".dirsortrc.toml";

/// Default log file, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "dirsort.log";

/// Errors that can occur while loading or compiling configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read configuration {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("invalid glob pattern '{0}'")]
    InvalidGlob(String),

    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("unknown log level '{0}' (expected error, warn, info, debug or trace)")]
    InvalidLogLevel(String),
}

/// Severity threshold for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" | "quiet" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" | "normal" => Ok(LogLevel::Info),
            "debug" | "verbose" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };
        f.write_str(s)
    }
}

/// Line format for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub filters: FilterRules,
}

/// The `[logging]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    /// Log file path. An empty string disables file logging.
    #[serde(default = "default_log_file")]
    pub file: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_file() -> String {
    DEFAULT_LOG_FILE.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            file: default_log_file(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// The log file to append to, if file logging is enabled.
    pub fn log_file(&self) -> Option<PathBuf> {
        let trimmed = self.file.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(PathBuf::from(trimmed))
        }
    }
}

/// The `[filters]` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterRules {
    /// Leave files whose name starts with "." where they are.
    #[serde(default)]
    pub skip_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist; overrides every exclude rule.
    #[serde(default)]
    pub include: IncludeRules,
}

/// Rules for leaving files in place.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExcludeRules {
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Extensions without the leading dot; matched case-insensitively.
    #[serde(default)]
    pub extensions: Vec<String>,

    #[serde(default)]
    pub patterns: Vec<String>,

    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Config {
    /// Load configuration, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if given (it must exist)
    /// 2. `.dirsortrc.toml` in the current directory
    /// 3. `$HOME/.config/dirsort/config.toml`
    /// 4. built-in defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.is_file() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("dirsort")
                .join("config.toml");
            if home_config.is_file() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml(&content).map_err(|reason| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }
}

impl FilterRules {
    /// Compile the rules into matchers.
    pub fn compile(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self)
    }
}

/// Why a file was left in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Hidden,
    ExcludedName,
    ExcludedExtension,
    ExcludedPattern(String),
    ExcludedRegex(String),
    /// The file is in use by this program (e.g. the active log file).
    Reserved,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Hidden => f.write_str("hidden file"),
            SkipReason::ExcludedName => f.write_str("excluded by name"),
            SkipReason::ExcludedExtension => f.write_str("excluded by extension"),
            SkipReason::ExcludedPattern(p) => write!(f, "matches exclude pattern '{p}'"),
            SkipReason::ExcludedRegex(r) => write!(f, "matches exclude regex '{r}'"),
            SkipReason::Reserved => f.write_str("in use by dirsort"),
        }
    }
}

/// Pre-compiled filter rules.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilters {
    skip_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
    reserved_paths: Vec<PathBuf>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegex {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            skip_hidden_files: rules.skip_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
            reserved_paths: Vec::new(),
        })
    }

    /// Never organize `path`. Used for files this program itself holds open.
    ///
    /// The path is canonicalized when possible so that differently spelled
    /// paths to the same file still match.
    pub fn reserve_path(&mut self, path: &Path) {
        let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.reserved_paths.push(path);
    }

    /// Returns why `file_path` should be left in place, or `None` if it is
    /// eligible.
    ///
    /// Checks in order: reserved paths, include patterns (which override
    /// everything below), hidden files, exact names, extensions, glob
    /// patterns, regexes.
    pub fn skip_reason(&self, file_path: &Path) -> Option<SkipReason> {
        if self.is_reserved(file_path) {
            return Some(SkipReason::Reserved);
        }

        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self
            .include_patterns
            .iter()
            .any(|pattern| pattern.matches(&file_name))
        {
            return None;
        }

        if self.skip_hidden_files && file_name.starts_with('.') {
            return Some(SkipReason::Hidden);
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return Some(SkipReason::ExcludedName);
        }

        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return Some(SkipReason::ExcludedExtension);
            }
        }

        if let Some(pattern) = self
            .exclude_patterns
            .iter()
            .find(|pattern| pattern.matches(&file_name))
        {
            return Some(SkipReason::ExcludedPattern(pattern.as_str().to_string()));
        }

        if let Some(regex) = self
            .exclude_regexes
            .iter()
            .find(|regex| regex.is_match(&file_name))
        {
            return Some(SkipReason::ExcludedRegex(regex.as_str().to_string()));
        }

        None
    }

    #[cfg(test)]
    fn should_include(&self, file_path: &Path) -> bool {
        self.skip_reason(file_path).is_none()
    }

    fn is_reserved(&self, file_path: &Path) -> bool {
        if self.reserved_paths.is_empty() {
            return false;
        }
        let resolved = fs::canonicalize(file_path).unwrap_or_else(|_| file_path.to_path_buf());
        self.reserved_paths.iter().any(|p| *p == resolved)
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlob(pattern.clone())))
        .collect()
}
