//! reqcheck: check, list and pin Python requirements manifests.
//!
//! This crate provides the main entry point and command dispatch for the
//! reqcheck binary. It parses CLI arguments, installs the tracing subscriber,
//! sets up a tokio runtime, and delegates to the command handlers.

#![deny(clippy::print_stdout, clippy::print_stderr)]

use std::ffi::OsString;
use std::process::ExitCode;

use clap::Parser;

use crate::cli::Cli;
use crate::commands::ExitStatus;
use crate::printer::Printer;

pub mod cli;
pub mod commands;
pub mod discovery;
pub mod logging;
pub mod printer;
pub mod settings;

/// Entry point for the reqcheck CLI.
pub fn main<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };

    let printer = Printer::new(cli.verbose, cli.quiet);

    if let Err(err) = logging::setup_logging(cli.verbose) {
        printer.debug(&format!("Logging was already initialized: {err}"));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime");

    let result = runtime.block_on(commands::dispatch(cli.command, cli.config, printer));
    runtime.shutdown_background();

    match result {
        Ok(code) => code.into(),
        Err(err) => {
            let mut causes = err.chain();
            if let Some(head) = causes.next() {
                printer.error(&head.to_string());
            }
            for cause in causes {
                printer.cause(&cause.to_string());
            }
            ExitStatus::Error.into()
        }
    }
}
