//! Command dispatch for reqcheck.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;

use crate::cli::Commands;
use crate::printer::Printer;

mod check;
mod list;
mod resolve;
mod satisfies;

/// Exit status for reqcheck commands.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    /// The command succeeded.
    Success,

    /// The manifest or the input has problems the command reports.
    Failure,

    /// The command failed with an unexpected error.
    Error,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => Self::from(0),
            ExitStatus::Failure => Self::from(1),
            ExitStatus::Error => Self::from(2),
        }
    }
}

/// Dispatch a parsed CLI command to the appropriate handler.
pub async fn dispatch(
    command: Commands,
    config: Option<PathBuf>,
    printer: Printer,
) -> Result<ExitStatus> {
    match command {
        Commands::Check(args) => check::execute(&args, config.as_deref(), printer),
        Commands::List(args) => list::execute(&args, printer),
        Commands::Satisfies(args) => satisfies::execute(&args, printer),
        Commands::Resolve(args) => resolve::execute(&args, config.as_deref(), printer).await,
    }
}

/// `1 error`, `2 errors`.
fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
