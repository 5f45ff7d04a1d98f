//! CLI argument definitions for reqcheck.
//!
//! All clap derive structs live here. The [`Cli`] struct is the top-level
//! parser; [`Commands`] enumerates every subcommand.

use std::path::PathBuf;
use std::str::FromStr;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};
use reqcheck_index::PrereleaseMode;
use reqcheck_manifest::CategoryKind;
use url::Url;

/// Clap v3-style help menu colors.
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Check, list and pin Python requirements manifests.
#[derive(Parser, Debug)]
#[command(
    name = "reqcheck",
    author,
    version,
    about = "Check, list and pin Python requirements manifests.",
    styles = STYLES,
    after_help = "Use `reqcheck help <command>` for more information on a specific command."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase logging verbosity.
    #[arg(global = true, short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Use quiet output. Repeat to also silence command results.
    #[arg(global = true, short, long, action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Read settings from this file instead of `reqcheck.toml`.
    #[arg(global = true, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that every line parses and that no two requirements conflict.
    Check(CheckArgs),

    /// List the requirements of a manifest, grouped by category.
    List(ListArgs),

    /// Report whether versions satisfy a requirement.
    Satisfies(SatisfiesArgs),

    /// Pin every requirement to the highest version the index offers.
    Resolve(ResolveArgs),
}

/// Arguments for `reqcheck check`.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Manifests to check. Defaults to the nearest `requirements-dev.txt` or
    /// `requirements.txt`.
    pub files: Vec<PathBuf>,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for `reqcheck list`.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// The manifest to list. Defaults to the nearest `requirements-dev.txt` or
    /// `requirements.txt`.
    pub file: Option<PathBuf>,

    /// Only list requirements of this category.
    #[arg(long, value_name = "KIND", value_parser = CategoryKind::from_str)]
    pub category: Option<CategoryKind>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `reqcheck satisfies`.
#[derive(Parser, Debug)]
pub struct SatisfiesArgs {
    /// A requirement such as `numpy>=1.14,<1.20.0`.
    pub requirement: String,

    /// Versions to test.
    #[arg(required = true)]
    pub versions: Vec<String>,

    /// Let pre-releases satisfy the requirement even if it names none.
    #[arg(long)]
    pub pre: bool,
}

/// Arguments for `reqcheck resolve`.
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// The manifest to resolve. Defaults to the nearest
    /// `requirements-dev.txt` or `requirements.txt`.
    pub file: Option<PathBuf>,

    /// The simple repository API to query.
    #[arg(long, value_name = "URL", conflicts_with = "index_file")]
    pub index_url: Option<Url>,

    /// A JSON file of package names to version lists, used instead of a
    /// remote index.
    #[arg(long, value_name = "PATH")]
    pub index_file: Option<PathBuf>,

    /// When pre-release versions may be selected.
    #[arg(long, value_name = "MODE", value_parser = PrereleaseMode::from_str)]
    pub prerelease: Option<PrereleaseMode>,

    /// Write the pinned manifest to this file instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}
