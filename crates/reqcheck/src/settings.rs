//! Settings from `reqcheck.toml`, merged with CLI flags and the environment.
//!
//! Precedence, highest first: command-line flag, environment variable,
//! settings file, the manifest's own `--index-url`, built-in default.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use reqcheck_index::{PrereleaseMode, Resolver, SimpleIndex};
use reqcheck_manifest::{IndexOption, Manifest};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::cli::ResolveArgs;

/// The settings file looked up next to the manifest.
pub const SETTINGS_FILE: &str = "reqcheck.toml";

/// Overrides the index URL of the settings file and the manifest.
pub const INDEX_URL_ENV: &str = "REQCHECK_INDEX_URL";

/// The contents of a `reqcheck.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSettings {
    pub index_url: Option<Url>,
    /// Relative paths are taken from the settings file's directory.
    pub index_file: Option<PathBuf>,
    pub prerelease: Option<PrereleaseMode>,
    pub concurrency: Option<usize>,
    pub strict: Option<bool>,
}

impl FileSettings {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path)?;
        let mut settings: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse `{}`", path.display()))?;
        if settings.index_url.is_some() && settings.index_file.is_some() {
            bail!(
                "`{}` sets both `index-url` and `index-file`",
                path.display()
            );
        }
        if let (Some(index_file), Some(root)) = (&settings.index_file, path.parent())
            && index_file.is_relative()
        {
            settings.index_file = Some(root.join(index_file));
        }
        Ok(settings)
    }

    /// Read `config` when given. Otherwise read the `reqcheck.toml` beside
    /// `manifest`, or fall back to defaults when there is none.
    pub fn discover(config: Option<&Path>, manifest: &Path) -> Result<Self> {
        if let Some(config) = config {
            debug!("Reading settings from `{}`", config.display());
            return Self::from_path(config);
        }
        let candidate = manifest
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(SETTINGS_FILE);
        if candidate.is_file() {
            debug!("Reading settings from `{}`", candidate.display());
            Self::from_path(&candidate)
        } else {
            Ok(Self::default())
        }
    }
}

/// Where `resolve` looks up versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSource {
    File(PathBuf),
    Url(Url),
}

/// Fully merged settings for `reqcheck resolve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveSettings {
    pub index: IndexSource,
    pub prerelease: PrereleaseMode,
    pub concurrency: usize,
}

impl ResolveSettings {
    pub fn resolve(args: &ResolveArgs, file: FileSettings, manifest: &Manifest) -> Result<Self> {
        let env_url = match env::var(INDEX_URL_ENV) {
            Ok(value) if !value.is_empty() => Some(
                Url::parse(&value)
                    .with_context(|| format!("`{INDEX_URL_ENV}` is not a valid URL: `{value}`"))?,
            ),
            _ => None,
        };
        Self::merge(args, env_url, file, manifest)
    }

    fn merge(
        args: &ResolveArgs,
        env_url: Option<Url>,
        file: FileSettings,
        manifest: &Manifest,
    ) -> Result<Self> {
        let manifest_url = manifest.options().find_map(|option| match option {
            IndexOption::IndexUrl(url) => Some(url.clone()),
            _ => None,
        });

        let index = if let Some(path) = &args.index_file {
            IndexSource::File(path.clone())
        } else if let Some(url) = args.index_url.clone().or(env_url) {
            IndexSource::Url(url)
        } else if let Some(path) = file.index_file {
            IndexSource::File(path)
        } else if let Some(url) = file.index_url.or(manifest_url) {
            IndexSource::Url(url)
        } else {
            IndexSource::Url(Url::parse(SimpleIndex::PYPI)?)
        };

        Ok(Self {
            index,
            prerelease: args
                .prerelease
                .or(file.prerelease)
                .unwrap_or_default(),
            concurrency: file
                .concurrency
                .unwrap_or(Resolver::DEFAULT_CONCURRENCY),
        })
    }
}
