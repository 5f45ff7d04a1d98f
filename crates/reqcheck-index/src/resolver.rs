//! Version selection: pick the highest published version that satisfies each
//! package's combined specifiers.
//!
//! A package whose declarations carry different environment markers is pinned
//! once per marker, so that `numpy<1.20; python_version < "3.7"` and
//! `numpy>=1.20; python_version >= "3.7"` each keep their own pin.

use std::fmt;
use std::str::FromStr;

use futures::{StreamExt, stream};
use reqcheck_manifest::{
    Analysis, Category, CategoryKind, PackageSummary, Scenario, join_specifiers,
};
use serde::Deserialize;
use tracing::{debug, trace};
use url::Url;
use uv_normalize::{ExtraName, PackageName};
use uv_pep440::{Version, VersionSpecifiers};

use crate::index::{IndexError, PackageIndex};

/// Whether pre-release versions may be selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrereleaseMode {
    /// Never select a pre-release.
    Disallow,
    /// Pre-releases compete with final releases.
    Allow,
    /// Select a pre-release when the package's specifiers name one, when the
    /// manifest passes `--pre`, or when no final release satisfies them.
    #[default]
    IfNecessaryOrExplicit,
}

impl PrereleaseMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disallow => "disallow",
            Self::Allow => "allow",
            Self::IfNecessaryOrExplicit => "if-necessary-or-explicit",
        }
    }
}

impl fmt::Display for PrereleaseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrereleaseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disallow" => Ok(Self::Disallow),
            "allow" => Ok(Self::Allow),
            "if-necessary-or-explicit" => Ok(Self::IfNecessaryOrExplicit),
            _ => Err(format!(
                "unknown pre-release mode `{s}` (expected `disallow`, `allow` or `if-necessary-or-explicit`)"
            )),
        }
    }
}

/// What a package resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pin {
    Version(Version),
    Url(Url),
}

#[derive(Debug, Clone)]
pub struct ResolvedPackage {
    pub name: PackageName,
    pub category: Category,
    pub pin: Pin,
    /// Extras requested by any declaration.
    pub extras: Vec<ExtraName>,
    /// The environment marker this pin applies under.
    pub marker: Option<String>,
}

impl fmt::Display for ResolvedPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            let extras: Vec<&str> = self.extras.iter().map(ExtraName::as_str).collect();
            write!(f, "[{}]", extras.join(","))?;
        }
        match &self.pin {
            Pin::Version(version) => write!(f, "=={version}")?,
            Pin::Url(url) => write!(f, " @ {url}")?,
        }
        if let Some(marker) = &self.marker {
            if matches!(self.pin, Pin::Url(_)) {
                write!(f, " ; {marker}")?;
            } else {
                write!(f, "; {marker}")?;
            }
        }
        Ok(())
    }
}

/// Every package of a manifest, pinned.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    packages: Vec<ResolvedPackage>,
}

impl Resolution {
    pub fn packages(&self) -> &[ResolvedPackage] {
        &self.packages
    }

    /// The pins of `name`, one per environment marker.
    pub fn get<'a>(&'a self, name: &'a PackageName) -> impl Iterator<Item = &'a ResolvedPackage> {
        self.packages.iter().filter(move |package| &package.name == name)
    }

    /// Render `name==version` pins, grouped under the manifest's category
    /// headers in the order the categories first appear. Uncategorized
    /// packages come first, without a header.
    pub fn to_requirements_txt(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut categories: Vec<&Category> = Vec::new();
        for package in &self.packages {
            if !categories.contains(&&package.category) {
                categories.push(&package.category);
            }
        }
        categories.sort_by_key(|category| category.kind != CategoryKind::Uncategorized);

        for (index, category) in categories.into_iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            if let Some(label) = &category.label {
                writeln!(f, "# {label}")?;
            }
            for package in self
                .packages
                .iter()
                .filter(|package| &package.category == category)
            {
                writeln!(f, "{package}")?;
            }
        }
        Ok(())
    }
}

/// Why a package could not be pinned.
#[derive(Debug, thiserror::Error)]
pub enum FailureKind {
    #[error("`{0}` was not found in the index")]
    NotFound(PackageName),
    #[error(
        "no version of `{name}` satisfies `{}`{}{}",
        join_specifiers(.specifiers),
        when(.marker.as_deref()),
        hint(*.prerelease_available)
    )]
    NoMatchingVersion {
        name: PackageName,
        specifiers: VersionSpecifiers,
        marker: Option<String>,
        /// A pre-release would have matched.
        prerelease_available: bool,
    },
    #[error("failed to query the index for `{0}`")]
    Index(PackageName, #[source] IndexError),
}

fn when(marker: Option<&str>) -> String {
    marker
        .map(|marker| format!(" when `{marker}`"))
        .unwrap_or_default()
}

fn hint(prerelease_available: bool) -> &'static str {
    if prerelease_available {
        " (only pre-releases match; use `--prerelease allow`)"
    } else {
        ""
    }
}

/// Every package that failed to resolve.
#[derive(Debug, thiserror::Error)]
#[error("failed to resolve {failed} of {total} packages")]
pub struct ResolveError {
    total: usize,
    failed: usize,
    failures: Vec<FailureKind>,
}

impl ResolveError {
    pub fn failures(&self) -> &[FailureKind] {
        &self.failures
    }
}

/// Resolves the packages of an [`Analysis`] against a [`PackageIndex`].
pub struct Resolver<'a> {
    index: &'a dyn PackageIndex,
    prerelease: PrereleaseMode,
    concurrency: usize,
}

impl<'a> Resolver<'a> {
    pub const DEFAULT_CONCURRENCY: usize = 8;

    pub fn new(index: &'a dyn PackageIndex) -> Self {
        Self {
            index,
            prerelease: PrereleaseMode::default(),
            concurrency: Self::DEFAULT_CONCURRENCY,
        }
    }

    #[must_use]
    pub fn with_prerelease(mut self, prerelease: PrereleaseMode) -> Self {
        self.prerelease = prerelease;
        self
    }

    /// The number of index queries in flight at once.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Pin every package, querying the index for all of them before
    /// reporting failures.
    pub async fn resolve(&self, analysis: &Analysis) -> Result<Resolution, ResolveError> {
        let results: Vec<Result<Vec<ResolvedPackage>, Vec<FailureKind>>> =
            stream::iter(analysis.packages())
                .map(|package| self.resolve_package(package))
                .buffered(self.concurrency)
                .collect()
                .await;

        let total = results.len();
        let mut packages = Vec::with_capacity(total);
        let mut failed = 0;
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(pins) => packages.extend(pins),
                Err(errors) => {
                    failed += 1;
                    failures.extend(errors);
                }
            }
        }
        if failures.is_empty() {
            Ok(Resolution { packages })
        } else {
            Err(ResolveError {
                total,
                failed,
                failures,
            })
        }
    }

    /// One pin per scenario of `package`.
    async fn resolve_package(
        &self,
        package: &PackageSummary,
    ) -> Result<Vec<ResolvedPackage>, Vec<FailureKind>> {
        let mut extras: Vec<ExtraName> = Vec::new();
        for extra in package.requirements.iter().flat_map(|requirement| &requirement.extras) {
            if !extras.contains(extra) {
                extras.push(extra.clone());
            }
        }
        let resolved = |scenario: &Scenario, pin: Pin| {
            debug!(
                "Selected `{}` for `{}`{}",
                pin_display(&pin),
                package.name,
                when(scenario.marker_text.as_deref())
            );
            ResolvedPackage {
                name: package.name.clone(),
                category: package.category.clone(),
                pin,
                extras: extras.clone(),
                marker: scenario.marker_text.clone(),
            }
        };

        if let Some(url) = &package.url {
            return Ok(package
                .scenarios
                .iter()
                .map(|scenario| resolved(scenario, Pin::Url(url.clone())))
                .collect());
        }

        let versions = self
            .index
            .versions(&package.name)
            .await
            .map_err(|err| match err {
                IndexError::NotFound(name) => vec![FailureKind::NotFound(name)],
                err => vec![FailureKind::Index(package.name.clone(), err)],
            })?;
        trace!("{} versions of `{}` available", versions.len(), package.name);

        let mut pins = Vec::with_capacity(package.scenarios.len());
        let mut failures = Vec::new();
        for scenario in &package.scenarios {
            match self.select(&package.name, scenario, &versions) {
                Ok(version) => pins.push(resolved(scenario, Pin::Version(version))),
                Err(failure) => failures.push(failure),
            }
        }
        if failures.is_empty() {
            Ok(pins)
        } else {
            Err(failures)
        }
    }

    /// The highest acceptable version.
    fn select(
        &self,
        name: &PackageName,
        scenario: &Scenario,
        versions: &[Version],
    ) -> Result<Version, FailureKind> {
        let (prereleases, finals): (Vec<&Version>, Vec<&Version>) = versions
            .iter()
            .filter(|version| scenario.specifiers.contains(version))
            .partition(|version| version.any_prerelease());

        let best_final = finals.into_iter().max();
        let best_any = || prereleases.iter().copied().chain(best_final).max();
        let selected = match self.prerelease {
            PrereleaseMode::Disallow => best_final,
            PrereleaseMode::Allow => best_any(),
            PrereleaseMode::IfNecessaryOrExplicit if scenario.allows_prerelease => best_any(),
            PrereleaseMode::IfNecessaryOrExplicit => best_final.or_else(best_any),
        };

        selected.cloned().ok_or_else(|| FailureKind::NoMatchingVersion {
            name: name.clone(),
            specifiers: scenario.specifiers.clone(),
            marker: scenario.marker_text.clone(),
            prerelease_available: !prereleases.is_empty(),
        })
    }
}

fn pin_display(pin: &Pin) -> String {
    match pin {
        Pin::Version(version) => version.to_string(),
        Pin::Url(url) => url.to_string(),
    }
}
