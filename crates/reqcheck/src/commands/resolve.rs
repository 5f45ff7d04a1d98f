//! `reqcheck resolve`: pin every requirement against a package index.

use std::error::Error as _;
use std::path::Path;

use anyhow::{Context, Result};
use reqcheck_index::{FlatIndex, PackageIndex, Resolver, SimpleIndex};
use reqcheck_manifest::{IndexOption, Manifest, Severity, analyze};

use crate::cli::ResolveArgs;
use crate::commands::{ExitStatus, plural};
use crate::discovery;
use crate::printer::Printer;
use crate::settings::{FileSettings, IndexSource, ResolveSettings};

/// Execute `reqcheck resolve`.
pub(super) async fn execute(
    args: &ResolveArgs,
    config: Option<&Path>,
    printer: Printer,
) -> Result<ExitStatus> {
    let path = discovery::manifest_or_discover(args.file.as_deref())?;
    let manifest = Manifest::from_path(&path)
        .with_context(|| format!("failed to load `{}`", path.display()))?;

    let analysis = analyze(&manifest);
    for diagnostic in analysis.diagnostics() {
        printer.diagnostic(diagnostic);
    }
    if analysis.has_errors() {
        printer.error(&format!(
            "cannot resolve `{}`: found {}",
            path.display(),
            plural(analysis.count(Severity::Error), "error"),
        ));
        return Ok(ExitStatus::Failure);
    }

    let settings = ResolveSettings::resolve(args, FileSettings::discover(config, &path)?, &manifest)?;
    for option in manifest.options() {
        match option {
            IndexOption::ExtraIndexUrl(url) => {
                printer.warn(&format!("Ignoring `--extra-index-url {url}`: only one index is queried"));
            }
            IndexOption::FindLinks(location) => {
                printer.warn(&format!("Ignoring `--find-links {location}`: only one index is queried"));
            }
            _ => {}
        }
    }
    let index: Box<dyn PackageIndex> = match &settings.index {
        IndexSource::File(index_file) => {
            printer.debug(&format!("Using the flat index `{}`", index_file.display()));
            Box::new(
                FlatIndex::from_path(index_file)
                    .with_context(|| format!("failed to read `{}`", index_file.display()))?,
            )
        }
        IndexSource::Url(url) => {
            printer.debug(&format!("Using the index `{url}`"));
            Box::new(SimpleIndex::new(url.clone())?)
        }
    };

    let resolver = Resolver::new(&*index)
        .with_prerelease(settings.prerelease)
        .with_concurrency(settings.concurrency);
    let resolution = match resolver.resolve(&analysis).await {
        Ok(resolution) => resolution,
        Err(err) => {
            for failure in err.failures() {
                printer.error(&failure.to_string());
                let mut source = failure.source();
                while let Some(cause) = source {
                    printer.cause(&cause.to_string());
                    source = cause.source();
                }
            }
            printer.error(&err.to_string());
            return Ok(ExitStatus::Failure);
        }
    };

    let source_name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
    let content = format!(
        "# Pinned by reqcheck from {source_name}.\n\n{}",
        resolution.to_requirements_txt()
    );

    if let Some(output) = &args.output {
        fs_err::write(output, &content)?;
        printer.info(&format!(
            "Pinned {} to `{}`",
            plural(resolution.packages().len(), "package"),
            output.display()
        ));
    } else {
        printer.stdout(content.trim_end());
    }
    Ok(ExitStatus::Success)
}
