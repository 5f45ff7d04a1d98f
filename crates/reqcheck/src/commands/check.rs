//! `reqcheck check`: report unparsable lines and conflicting requirements.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqcheck_manifest::{Diagnostic, Manifest, Severity, analyze};

use crate::cli::CheckArgs;
use crate::commands::{ExitStatus, plural};
use crate::discovery;
use crate::printer::Printer;
use crate::settings::FileSettings;

/// Execute `reqcheck check`.
pub(super) fn execute(
    args: &CheckArgs,
    config: Option<&Path>,
    printer: Printer,
) -> Result<ExitStatus> {
    let files: Vec<PathBuf> = if args.files.is_empty() {
        vec![discovery::manifest_or_discover(None)?]
    } else {
        args.files.clone()
    };
    let settings = FileSettings::discover(config, &files[0])?;
    let strict = args.strict || settings.strict.unwrap_or(false);

    let mut errors = 0;
    let mut warnings = 0;
    for path in &files {
        let (manifest, line_errors) = Manifest::from_path_lenient(path)
            .with_context(|| format!("failed to load `{}`", path.display()))?;
        let analysis = analyze(&manifest);

        let mut diagnostics: Vec<Diagnostic> = line_errors.iter().map(Diagnostic::from).collect();
        diagnostics.extend(analysis.diagnostics().iter().cloned());
        diagnostics.sort_by_key(|diagnostic| diagnostic.locations.first().cloned());
        for diagnostic in &diagnostics {
            printer.diagnostic(diagnostic);
        }

        let file_errors = count(&diagnostics, Severity::Error);
        let file_warnings = count(&diagnostics, Severity::Warning);
        printer.info(&format!(
            "Checked `{}`: {}, {}, {}",
            path.display(),
            plural(analysis.packages().len(), "package"),
            plural(file_errors, "error"),
            plural(file_warnings, "warning"),
        ));
        errors += file_errors;
        warnings += file_warnings;
    }

    if errors > 0 || (strict && warnings > 0) {
        Ok(ExitStatus::Failure)
    } else {
        Ok(ExitStatus::Success)
    }
}

fn count(diagnostics: &[Diagnostic], severity: Severity) -> usize {
    diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.severity == severity)
        .count()
}
