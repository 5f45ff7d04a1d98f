//! `reqcheck satisfies`: test versions against one requirement.

use std::str::FromStr;

use anyhow::{Result, bail};
use owo_colors::OwoColorize;
use reqcheck_manifest::{Requirement, mentions_prerelease};
use uv_pep440::Version;

use crate::cli::SatisfiesArgs;
use crate::commands::ExitStatus;
use crate::printer::Printer;

/// Execute `reqcheck satisfies`.
pub(super) fn execute(args: &SatisfiesArgs, printer: Printer) -> Result<ExitStatus> {
    let requirement = Requirement::from_str(&args.requirement)?;
    if let Some(url) = requirement.url() {
        bail!("`{requirement}` points at `{url}` and has no version specifiers to test");
    }
    let specifiers = requirement.specifiers();
    let allows_prerelease = args.pre || mentions_prerelease(&specifiers);

    let mut all_satisfy = true;
    for raw in &args.versions {
        let version = match Version::from_str(raw) {
            Ok(version) => version,
            Err(err) => {
                printer.error(&err.to_string());
                all_satisfy = false;
                continue;
            }
        };

        if !specifiers.contains(&version) {
            printer.stdout(format_args!(
                "{} {version} does not satisfy `{requirement}`",
                "✗".red()
            ));
            all_satisfy = false;
        } else if version.any_prerelease() && !allows_prerelease {
            printer.stdout(format_args!(
                "{} {version} is a pre-release, which `{requirement}` does not accept (use `--pre`)",
                "✗".red()
            ));
            all_satisfy = false;
        } else {
            printer.stdout(format_args!(
                "{} {version} satisfies `{requirement}`",
                "✓".green()
            ));
        }
    }

    if all_satisfy {
        Ok(ExitStatus::Success)
    } else {
        Ok(ExitStatus::Failure)
    }
}
