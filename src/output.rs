//! Colored messages for the terminal.
//!
//! Used for problems that happen before logging is set up, or that concern
//! the log sink itself. Everything else goes through `tracing`.

use colored::*;

pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Prints a dimmed hint line, e.g. how to fix the previous error.
    pub fn hint(message: &str) {
        eprintln!("  {}", message.dimmed());
    }
}
