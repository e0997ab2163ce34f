//! Sorting the files of one directory into category subdirectories.
//!
//! [`FileOrganizer`] decides what happens to each entry and reports it as an
//! [`OrganizeEvent`]. It never writes log output itself; callers pass a
//! callback (see [`crate::report`]) or collect the events.
//!
//! Only the immediate children of the target directory are considered.
//! Per-file failures are reported as [`OrganizeEvent::Failed`] and never stop
//! the run; only failing to list the directory is an error.

use crate::config::{CompiledFilters, SkipReason};
use crate::file_category::CategoryMap;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, DirEntry};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Run-level failures.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("failed to read directory {}: {source}", path.display())]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for organizing a directory.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Why a single file could not be moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveFailureKind {
    /// Another process holds the file open or locked.
    InUse,
    PermissionDenied,
    /// A file with the same name is already in the category directory.
    DestinationExists,
    /// The category directory could not be created.
    CreateDirectory,
    Io,
}

impl fmt::Display for MoveFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MoveFailureKind::InUse => "file is in use by another program",
            MoveFailureKind::PermissionDenied => "permission denied",
            MoveFailureKind::DestinationExists => "destination already exists",
            MoveFailureKind::CreateDirectory => "could not create category directory",
            MoveFailureKind::Io => "I/O error",
        };
        f.write_str(s)
    }
}

impl MoveFailureKind {
    /// Maps an OS error from a rename to a failure kind.
    pub fn from_io(err: &io::Error) -> Self {
        if is_in_use(err) {
            return MoveFailureKind::InUse;
        }
        match err.kind() {
            io::ErrorKind::PermissionDenied => MoveFailureKind::PermissionDenied,
            io::ErrorKind::AlreadyExists => MoveFailureKind::DestinationExists,
            _ => MoveFailureKind::Io,
        }
    }
}

fn is_in_use(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::ResourceBusy || is_locked_by_os(err)
}

// ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
#[cfg(windows)]
fn is_locked_by_os(err: &io::Error) -> bool {
    matches!(err.raw_os_error(), Some(32) | Some(33))
}

// ETXTBSY
#[cfg(unix)]
fn is_locked_by_os(err: &io::Error) -> bool {
    matches!(err.raw_os_error(), Some(26))
}

#[cfg(not(any(unix, windows)))]
fn is_locked_by_os(_err: &io::Error) -> bool {
    false
}

/// A file that could not be moved into its category directory.
#[derive(Debug, Error)]
#[error("Could not move '{file_name}' to '{category}/': {kind} ({source})")]
pub struct MoveFailure {
    pub file_name: String,
    pub category: String,
    pub destination: PathBuf,
    pub kind: MoveFailureKind,
    #[source]
    pub source: io::Error,
}

/// What happened to one directory entry, or to the run as a whole.
#[derive(Debug)]
pub enum OrganizeEvent {
    ScanStarted { directory: PathBuf, simulate: bool },
    /// Simulate mode: the file would be moved.
    Planned { file_name: String, category: String },
    Moved { file_name: String, category: String },
    Failed(MoveFailure),
    /// A regular file left in place by the filters.
    Skipped { file_name: String, reason: SkipReason },
    /// A directory, symlink or special file.
    NotAFile { name: String },
    /// The entry's type could not be determined.
    Unreadable { name: String, source: io::Error },
}

impl OrganizeEvent {
    /// Returns true for events that describe a problem the user should see.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            OrganizeEvent::Failed(_) | OrganizeEvent::Unreadable { .. }
        )
    }
}

impl fmt::Display for OrganizeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrganizeEvent::ScanStarted {
                directory,
                simulate: true,
            } => write!(f, "[SIMULATE] Scanning directory: {}", directory.display()),
            OrganizeEvent::ScanStarted {
                directory,
                simulate: false,
            } => write!(f, "Scanning directory: {}", directory.display()),
            OrganizeEvent::Planned {
                file_name,
                category,
            } => write!(f, "[SIMULATE] Move '{file_name}' to '{category}/'"),
            OrganizeEvent::Moved {
                file_name,
                category,
            } => write!(f, "Moved '{file_name}' to '{category}/'"),
            OrganizeEvent::Failed(failure) => write!(f, "{failure}"),
            OrganizeEvent::Skipped { file_name, reason } => {
                write!(f, "Skipping '{file_name}': {reason}")
            }
            OrganizeEvent::NotAFile { name } => {
                write!(f, "Ignoring '{name}': not a regular file")
            }
            OrganizeEvent::Unreadable { name, source } => {
                write!(f, "Could not inspect '{name}': {source}")
            }
        }
    }
}

/// Per-run counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub simulated: bool,
    /// Eligible regular files seen.
    pub files_found: usize,
    /// Files moved (or that would be moved), by category.
    pub counts: BTreeMap<String, usize>,
    pub failed: usize,
    pub skipped: usize,
}

impl Summary {
    fn new(simulated: bool) -> Self {
        Self {
            simulated,
            ..Self::default()
        }
    }

    /// Number of files moved or simulated in `category`.
    pub fn count(&self, category: &str) -> usize {
        self.counts.get(category).copied().unwrap_or(0)
    }

    /// Total files moved or simulated.
    pub fn total_organized(&self) -> usize {
        self.counts.values().sum()
    }

    /// Human-readable summary, one entry per log line.
    ///
    /// Categories are listed alphabetically.
    pub fn lines(&self) -> Vec<String> {
        if self.files_found == 0 {
            return vec!["No files were found to organize.".to_string()];
        }

        let mut lines = Vec::new();
        if self.counts.is_empty() {
            lines.push(if self.simulated {
                "No files would be moved.".to_string()
            } else {
                "No files were moved.".to_string()
            });
        } else {
            lines.push(if self.simulated {
                "[SIMULATE] Summary of planned moves:".to_string()
            } else {
                "Summary of moved files:".to_string()
            });
            for (category, count) in &self.counts {
                lines.push(format!("  {category}: {count}"));
            }
        }
        if self.failed > 0 {
            let noun = if self.failed == 1 { "file" } else { "files" };
            lines.push(format!("{} {noun} could not be moved.", self.failed));
        }
        lines
    }
}

/// A completed run: its counters plus every event in order.
#[derive(Debug)]
pub struct Outcome {
    pub summary: Summary,
    pub events: Vec<OrganizeEvent>,
}

/// Filesystem primitives used to move files.
pub trait Relocator {
    /// Make sure `dir` exists; succeed if it already does.
    fn ensure_dir(&self, dir: &Path) -> io::Result<()>;

    /// Returns true if anything, including a dangling symlink, is at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Move `from` to `to`. Must fail with [`io::ErrorKind::AlreadyExists`]
    /// rather than replace an existing `to`.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// [`Relocator`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRelocator;

impl Relocator for FsRelocator {
    fn ensure_dir(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)
    }

    fn exists(&self, path: &Path) -> bool {
        path.symlink_metadata().is_ok()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        // Linking fails atomically on an existing name, unlike a plain
        // rename on Unix.
        match fs::hard_link(from, to) {
            Ok(()) => fs::remove_file(from).inspect_err(|_| {
                let _ = fs::remove_file(to);
            }),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(e),
            // No hard links on this filesystem.
            Err(_) => {
                if self.exists(to) {
                    return Err(already_exists(to));
                }
                fs::rename(from, to)
            }
        }
    }
}

fn already_exists(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("{} already exists", path.display()),
    )
}

/// Where one file is headed.
struct PendingMove<'p> {
    source: &'p Path,
    file_name: &'p str,
    category: &'p str,
    category_dir: PathBuf,
    destination: PathBuf,
}

impl<'p> PendingMove<'p> {
    fn new(directory: &Path, source: &'p Path, file_name: &'p str, category: &'p str) -> Self {
        let category_dir = directory.join(category);
        let destination = match source.file_name() {
            Some(name) => category_dir.join(name),
            None => category_dir.join(file_name),
        };
        Self {
            source,
            file_name,
            category,
            category_dir,
            destination,
        }
    }

    fn failure(&self, kind: MoveFailureKind, source: io::Error) -> MoveFailure {
        MoveFailure {
            file_name: self.file_name.to_string(),
            category: self.category.to_string(),
            destination: self.destination.clone(),
            kind,
            source,
        }
    }
}

/// Sorts the files of a directory into category subdirectories.
pub struct FileOrganizer<'a, R = FsRelocator> {
    categories: &'a CategoryMap,
    filters: CompiledFilters,
    relocator: R,
}

impl<'a> FileOrganizer<'a, FsRelocator> {
    /// Creates an organizer that moves every regular file, using the real
    /// filesystem.
    pub fn new(categories: &'a CategoryMap) -> Self {
        Self {
            categories,
            filters: CompiledFilters::default(),
            relocator: FsRelocator,
        }
    }
}

impl<'a, R: Relocator> FileOrganizer<'a, R> {
    /// Leave files matching `filters` in place.
    pub fn with_filters(mut self, filters: CompiledFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Replace the filesystem primitives used for moving.
    pub fn with_relocator<T: Relocator>(self, relocator: T) -> FileOrganizer<'a, T> {
        FileOrganizer {
            categories: self.categories,
            filters: self.filters,
            relocator,
        }
    }

    /// Organizes `directory` and collects every event.
    pub fn organize(&self, directory: &Path, simulate: bool) -> OrganizeResult<Outcome> {
        let mut events = Vec::new();
        let summary = self.organize_with(directory, simulate, |event| events.push(event))?;
        Ok(Outcome { summary, events })
    }

    /// Organizes `directory`, handing each event to `on_event` as it happens.
    ///
    /// `directory` is expected to be an existing directory. Entries are
    /// processed in file name order.
    pub fn organize_with<F>(
        &self,
        directory: &Path,
        simulate: bool,
        mut on_event: F,
    ) -> OrganizeResult<Summary>
    where
        F: FnMut(OrganizeEvent),
    {
        on_event(OrganizeEvent::ScanStarted {
            directory: directory.to_path_buf(),
            simulate,
        });

        let entries = list_entries(directory)?;
        let mut summary = Summary::new(simulate);

        for entry in entries {
            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(source) => {
                    on_event(OrganizeEvent::Unreadable { name, source });
                    continue;
                }
            };
            if !file_type.is_file() {
                on_event(OrganizeEvent::NotAFile { name });
                continue;
            }

            let path = entry.path();
            if let Some(reason) = self.filters.skip_reason(&path) {
                summary.skipped += 1;
                on_event(OrganizeEvent::Skipped {
                    file_name: name,
                    reason,
                });
                continue;
            }

            summary.files_found += 1;
            let category = self.categories.classify(&name).to_string();

            let pending = PendingMove::new(directory, &path, &name, &category);
            let result = if simulate {
                self.check_destination(&pending)
            } else {
                self.move_into_category(&pending)
            };

            match result {
                Ok(()) => {
                    *summary.counts.entry(category.clone()).or_insert(0) += 1;
                    on_event(if simulate {
                        OrganizeEvent::Planned {
                            file_name: name,
                            category,
                        }
                    } else {
                        OrganizeEvent::Moved {
                            file_name: name,
                            category,
                        }
                    });
                }
                Err(failure) => {
                    summary.failed += 1;
                    on_event(OrganizeEvent::Failed(failure));
                }
            }
        }

        Ok(summary)
    }

    /// Fails if something already occupies the destination name.
    fn check_destination(&self, pending: &PendingMove<'_>) -> Result<(), MoveFailure> {
        if self.relocator.exists(&pending.destination) {
            return Err(pending.failure(
                MoveFailureKind::DestinationExists,
                already_exists(&pending.destination),
            ));
        }
        Ok(())
    }

    /// Moves one file into its category directory, keeping its name.
    ///
    /// Never overwrites: an existing destination fails this file.
    fn move_into_category(&self, pending: &PendingMove<'_>) -> Result<(), MoveFailure> {
        self.relocator
            .ensure_dir(&pending.category_dir)
            .map_err(|e| pending.failure(MoveFailureKind::CreateDirectory, e))?;
        self.check_destination(pending)?;
        self.relocator
            .rename(pending.source, &pending.destination)
            .map_err(|e| pending.failure(MoveFailureKind::from_io(&e), e))
    }
}

fn list_entries(directory: &Path) -> OrganizeResult<Vec<DirEntry>> {
    let read_error = |source| OrganizeError::ReadDirectory {
        path: directory.to_path_buf(),
        source,
    };
    let mut entries = fs::read_dir(directory)
        .map_err(read_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_error)?;
    entries.sort_by_key(|entry| entry.file_name());
    Ok(entries)
}
