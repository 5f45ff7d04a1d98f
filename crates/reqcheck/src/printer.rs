//! Output formatting for reqcheck commands.
//!
//! The [`Printer`] controls whether messages are emitted based on the user's
//! `--quiet` and `--verbose` flags. Errors are always printed. Command results
//! on stdout survive `-q` and are dropped at `-qq`.

use std::fmt::Display;

use anstream::{eprintln, println};
use owo_colors::OwoColorize;
use reqcheck_manifest::{Diagnostic, Severity};

/// Controls output formatting for reqcheck commands.
#[derive(Copy, Clone)]
pub struct Printer {
    /// Verbosity level: 0 = normal, 1+ = verbose.
    verbosity: u8,
    /// Quiet level: 1 silences stderr chatter, 2 also silences stdout.
    quiet: u8,
}

impl Printer {
    /// Create a new printer with the given verbosity and quiet settings.
    pub fn new(verbosity: u8, quiet: u8) -> Self {
        Self { verbosity, quiet }
    }

    /// Print a command result to stdout.
    pub fn stdout(&self, message: impl Display) {
        if self.quiet < 2 {
            println!("{message}");
        }
    }

    /// Print an informational message to stderr.
    pub fn info(&self, message: &str) {
        if self.quiet == 0 {
            eprintln!("{message}");
        }
    }

    /// Print a warning message to stderr.
    pub fn warn(&self, message: &str) {
        if self.quiet == 0 {
            eprintln!("{}: {}", "warning".yellow().bold(), message);
        }
    }

    /// Print an error message to stderr.
    ///
    /// Errors are always printed, even in quiet mode.
    pub fn error(&self, message: &str) {
        eprintln!("{}: {}", "error".red().bold(), message);
    }

    /// Print one link of an error chain, below the error it caused.
    pub fn cause(&self, message: &str) {
        eprintln!("  {}: {}", "Caused by".red().bold(), message.trim());
    }

    /// Print a debug message (only at verbosity >= 1).
    pub fn debug(&self, message: &str) {
        if self.verbosity >= 1 && self.quiet == 0 {
            eprintln!("{}: {}", "debug".dimmed(), message);
        }
    }

    /// Print a diagnostic as `file:line: severity: message`, followed by any
    /// further lines it concerns. Errors survive `--quiet`.
    pub fn diagnostic(&self, diagnostic: &Diagnostic) {
        if self.quiet > 0 && diagnostic.severity != Severity::Error {
            return;
        }
        let label = match diagnostic.severity {
            Severity::Error => "error".red().bold().to_string(),
            Severity::Warning => "warning".yellow().bold().to_string(),
            Severity::Info => "info".cyan().bold().to_string(),
        };
        let mut locations = diagnostic.locations.iter();
        match locations.next() {
            Some(location) => eprintln!(
                "{}: {label}: {}",
                location.to_string().bold(),
                diagnostic.message
            ),
            None => eprintln!("{label}: {}", diagnostic.message),
        }
        for location in locations {
            eprintln!("  {} also at {location}", "=".blue().bold());
        }
    }
}
