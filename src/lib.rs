//! dirsort - sort the files of a directory into category folders
//!
//! This library classifies files by extension against a fixed, ordered
//! category table and moves them into per-category subdirectories, with a
//! simulate mode that only reports what would happen. Configuration covers
//! logging and which files are eligible; the category table is fixed.

pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod logging;
pub mod output;
pub mod report;

pub use config::{CompiledFilters, Config, ConfigError, FilterRules, SkipReason};
pub use file_category::{CategoryMap, CategoryRule, FALLBACK_CATEGORY};
pub use file_organizer::{
    FileOrganizer, FsRelocator, MoveFailure, MoveFailureKind, OrganizeError, OrganizeEvent,
    Outcome, Relocator, Summary,
};

pub use cli::{Args, run_cli};
