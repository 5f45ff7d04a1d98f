//! `reqcheck list`: the requirements of a manifest, grouped by category.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use reqcheck_manifest::{Category, Entry, Manifest, Requirement, join_specifiers};
use serde::Serialize;

use crate::cli::ListArgs;
use crate::commands::ExitStatus;
use crate::discovery;
use crate::printer::Printer;

/// One requirement line, as printed by `--json`.
#[derive(Debug, Serialize)]
struct ListedRequirement<'a> {
    name: &'a str,
    requirement: String,
    specifiers: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    marker: Option<&'a str>,
    category: &'a Category,
    location: String,
}

impl<'a> ListedRequirement<'a> {
    fn new(entry: &'a Entry, requirement: &'a Requirement) -> Self {
        Self {
            name: requirement.name.as_str(),
            requirement: requirement.to_string(),
            specifiers: join_specifiers(&requirement.specifiers()),
            url: requirement.url().map(url::Url::as_str),
            marker: requirement.marker_text.as_deref(),
            category: &entry.category,
            location: format!("{}:{}", entry.source.display(), entry.line),
        }
    }
}

/// Execute `reqcheck list`.
pub(super) fn execute(args: &ListArgs, printer: Printer) -> Result<ExitStatus> {
    let path = discovery::manifest_or_discover(args.file.as_deref())?;
    let manifest = Manifest::from_path(&path)
        .with_context(|| format!("failed to load `{}`", path.display()))?;

    let selected = |category: &Category| args.category.is_none_or(|kind| category.kind == kind);

    if args.json {
        let listed: Vec<ListedRequirement> = manifest
            .requirements()
            .filter(|(entry, _)| selected(&entry.category))
            .map(|(entry, requirement)| ListedRequirement::new(entry, requirement))
            .collect();
        printer.stdout(serde_json::to_string_pretty(&listed)?);
        return Ok(ExitStatus::Success);
    }

    let mut output = String::new();
    for category in manifest.categories().into_iter().filter(|category| selected(*category)) {
        if !output.is_empty() {
            output.push('\n');
        }
        match &category.label {
            Some(label) => writeln!(output, "{label} ({}):", category.kind)?,
            None => writeln!(output, "{}:", category.kind)?,
        }
        for (_, requirement) in manifest
            .requirements()
            .filter(|(entry, _)| &entry.category == category)
        {
            writeln!(output, "  {requirement}")?;
        }
    }

    if output.is_empty() {
        printer.info(&format!("No requirements in `{}`", path.display()));
    } else {
        printer.stdout(output.trim_end());
    }
    Ok(ExitStatus::Success)
}
