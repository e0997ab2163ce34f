//! Renders organizer events and summaries as log records.

use crate::file_organizer::{OrganizeEvent, Summary};
use tracing::{debug, info, warn};

/// Writes one event to the log at its severity.
///
/// Entries that are not regular files are only visible at debug level.
pub fn log_event(event: &OrganizeEvent) {
    match event {
        OrganizeEvent::NotAFile { .. } => debug!("{event}"),
        _ if event.is_warning() => warn!("{event}"),
        _ => info!("{event}"),
    }
}

/// Writes the end-of-run summary.
pub fn log_summary(summary: &Summary) {
    for line in summary.lines() {
        info!("{line}");
    }
}
