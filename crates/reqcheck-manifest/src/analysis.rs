//! Cross-line checks over a parsed [`Manifest`].
//!
//! Requirements are grouped by normalized package name. The specifiers of each
//! group, plus any `-c` constraints for the package, must be satisfiable by at
//! least one version: an empty intersection, or one that only pre-releases
//! and post-releases of the bounds would fall into, is an error.
//!
//! Environment markers are not evaluated. Requirements that carry distinct
//! markers are assumed to target different environments, so each marker is
//! checked together with the package's unmarked requirements but never
//! against another marker. Unmarked requirements also get a scenario of their
//! own, for the environments no marker matches.

use std::fmt;
use std::path::PathBuf;

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::debug;
use url::Url;
use uv_normalize::PackageName;
use uv_pep440::{Version, VersionSpecifiers};
use uv_pep508::MarkerTree;

use crate::category::Category;
use crate::manifest::{Entry, LineError, Manifest};
use crate::requirement::{Requirement, join_specifiers};
use crate::witness::{mentions_prerelease, satisfying_version};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("info"),
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// A `file:line` position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Location {
    pub path: PathBuf,
    pub line: usize,
}

impl Location {
    fn of(entry: &Entry) -> Self {
        Self {
            path: entry.source.clone(),
            line: entry.line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub package: Option<PackageName>,
    pub message: String,
    /// Every line that contributed, in file order.
    pub locations: Vec<Location>,
}

impl From<&LineError> for Diagnostic {
    fn from(error: &LineError) -> Self {
        Self {
            severity: Severity::Error,
            package: None,
            message: error.kind.to_string(),
            locations: vec![Location {
                path: error.path.clone(),
                line: error.line,
            }],
        }
    }
}

/// Everything the manifest says about one package.
#[derive(Debug, Clone)]
pub struct PackageSummary {
    pub name: PackageName,
    /// The category of the first declaration.
    pub category: Category,
    /// One entry per environment marker, in the order the markers are first
    /// declared. A package without markers has a single unconditional
    /// scenario.
    pub scenarios: Vec<Scenario>,
    /// A direct URL, when the package is declared with `@`.
    pub url: Option<Url>,
    /// Every declaration, as written, in file order.
    pub requirements: Vec<Requirement>,
    pub locations: Vec<Location>,
}

/// The requirements of a package that apply together in one set of
/// environments.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub marker: MarkerTree,
    /// The marker as first written, or its canonical form for the
    /// environments no written marker covers. `None` when unconditional.
    pub marker_text: Option<String>,
    /// The unmarked specifiers and constraints, plus those of this marker.
    pub specifiers: VersionSpecifiers,
    /// Whether pre-release versions are acceptable: the manifest passes
    /// `--pre` or a specifier names a pre-release.
    pub allows_prerelease: bool,
    /// A version satisfying `specifiers`, when one exists.
    pub witness: Option<Version>,
}

/// The result of [`analyze`].
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    packages: Vec<PackageSummary>,
    diagnostics: Vec<Diagnostic>,
    prerelease: bool,
}

impl Analysis {
    /// Packages in the order they are first declared.
    pub fn packages(&self) -> &[PackageSummary] {
        &self.packages
    }

    pub fn package(&self, name: &PackageName) -> Option<&PackageSummary> {
        self.packages.iter().find(|package| &package.name == name)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Whether the manifest passes `--pre`.
    pub fn prerelease(&self) -> bool {
        self.prerelease
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity == severity)
            .count()
    }
}

#[derive(Default)]
struct Group<'a> {
    requirements: Vec<(&'a Entry, &'a Requirement)>,
    constraints: Vec<(&'a Entry, &'a Requirement)>,
}

/// Check a manifest for conflicting, duplicate and pre-release-only
/// requirements.
pub fn analyze(manifest: &Manifest) -> Analysis {
    let prerelease = manifest.allows_prerelease();

    let mut order: Vec<&PackageName> = Vec::new();
    let mut groups: FxHashMap<&PackageName, Group<'_>> = FxHashMap::default();
    for (entry, requirement) in manifest.requirements() {
        let group = groups.entry(&requirement.name).or_insert_with(|| {
            order.push(&requirement.name);
            Group::default()
        });
        group.requirements.push((entry, requirement));
    }

    let mut diagnostics = Vec::new();
    for (entry, requirement) in manifest.constraints() {
        match groups.get_mut(&requirement.name) {
            Some(group) => group.constraints.push((entry, requirement)),
            None => diagnostics.push(Diagnostic {
                severity: Severity::Warning,
                package: Some(requirement.name.clone()),
                message: format!(
                    "constraint `{requirement}` applies to `{}`, which is not required",
                    requirement.name
                ),
                locations: vec![Location::of(entry)],
            }),
        }
    }

    let mut packages = Vec::with_capacity(order.len());
    for name in order {
        let group = &groups[name];
        let summary = summarize(name, group, prerelease, &mut diagnostics);
        for scenario in &summary.scenarios {
            debug!(
                "{}{}: `{}` (witness: {})",
                summary.name,
                scenario
                    .marker_text
                    .as_ref()
                    .map(|marker| format!("; {marker}"))
                    .unwrap_or_default(),
                join_specifiers(&scenario.specifiers),
                scenario
                    .witness
                    .as_ref()
                    .map_or_else(|| "none".to_owned(), ToString::to_string)
            );
        }
        packages.push(summary);
    }

    // Constraint warnings are gathered first; report in file order instead.
    diagnostics.sort_by(|a, b| {
        a.locations
            .first()
            .cmp(&b.locations.first())
            .then(b.severity.cmp(&a.severity))
    });

    Analysis {
        packages,
        diagnostics,
        prerelease,
    }
}

fn summarize(
    name: &PackageName,
    group: &Group<'_>,
    prerelease: bool,
    diagnostics: &mut Vec<Diagnostic>,
) -> PackageSummary {
    let (first_entry, _) = group.requirements[0];
    let locations: Vec<Location> = group
        .requirements
        .iter()
        .map(|(entry, _)| Location::of(entry))
        .collect();

    // Requirements with the same marker (or none) are meant to apply together.
    let mut markers: Vec<(MarkerTree, Option<&str>)> = Vec::new();
    let mut duplicated = false;
    for (_, requirement) in &group.requirements {
        if markers.iter().any(|(marker, _)| *marker == requirement.marker) {
            duplicated = true;
        } else {
            markers.push((requirement.marker, requirement.marker_text.as_deref()));
        }
    }
    if duplicated {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            package: Some(name.clone()),
            message: format!("`{name}` is declared {} times", group.requirements.len()),
            locations: locations.clone(),
        });
    }

    let urls: Vec<&Url> = group
        .requirements
        .iter()
        .filter_map(|(_, requirement)| requirement.url())
        .collect();
    if urls.windows(2).any(|pair| pair[0] != pair[1]) {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            package: Some(name.clone()),
            message: format!("`{name}` is declared with different direct URLs"),
            locations: locations.clone(),
        });
    }

    let scenarios = scenarios(group, &markers)
        .into_iter()
        .map(|draft| {
            let specifiers: VersionSpecifiers = draft
                .entries
                .iter()
                .flat_map(|(_, requirement)| requirement.specifiers())
                .collect();
            let allows_prerelease = prerelease || mentions_prerelease(&specifiers);
            if draft.reported {
                check_scenario(
                    name,
                    &draft.entries,
                    &specifiers,
                    allows_prerelease,
                    urls.is_empty(),
                    diagnostics,
                );
            }
            let witness = if urls.is_empty() {
                satisfying_version(&specifiers, allows_prerelease)
            } else {
                None
            };
            Scenario {
                marker: draft.marker,
                marker_text: draft.marker_text,
                specifiers,
                allows_prerelease,
                witness,
            }
        })
        .collect();

    for (entry, requirement) in &group.requirements {
        if !prerelease && mentions_prerelease(&requirement.specifiers()) {
            diagnostics.push(Diagnostic {
                severity: Severity::Info,
                package: Some(name.clone()),
                message: format!(
                    "`{requirement}` names a pre-release, so pre-releases of `{name}` are accepted"
                ),
                locations: vec![Location::of(entry)],
            });
        }
    }

    PackageSummary {
        name: name.clone(),
        category: first_entry.category.clone(),
        scenarios,
        url: urls.first().map(|url| (*url).clone()),
        requirements: group
            .requirements
            .iter()
            .map(|(_, requirement)| (*requirement).clone())
            .collect(),
        locations,
    }
}

/// The declarations that make up one [`Scenario`].
struct Draft<'a> {
    marker: MarkerTree,
    marker_text: Option<String>,
    entries: Vec<(&'a Entry, &'a Requirement)>,
    /// Whether conflicts are reported for this scenario.
    reported: bool,
}

/// Split a package's declarations by marker. Each scenario holds the
/// unmarked requirements and constraints plus those of its marker.
fn scenarios<'a>(group: &Group<'a>, markers: &[(MarkerTree, Option<&str>)]) -> Vec<Draft<'a>> {
    let base: Vec<(&'a Entry, &'a Requirement)> = group
        .requirements
        .iter()
        .filter(|(_, requirement)| requirement.marker.is_true())
        .chain(group.constraints.iter())
        .copied()
        .collect();

    let conditional: Vec<_> = markers
        .iter()
        .filter(|(marker, _)| !marker.is_true())
        .collect();
    if conditional.is_empty() {
        return vec![Draft {
            marker: MarkerTree::TRUE,
            marker_text: None,
            entries: base,
            reported: true,
        }];
    }

    let mut scenarios: Vec<_> = conditional
        .iter()
        .map(|(marker, text)| {
            let mut entries = base.clone();
            entries.extend(
                group
                    .requirements
                    .iter()
                    .filter(|(_, requirement)| requirement.marker == *marker)
                    .copied(),
            );
            Draft {
                marker: *marker,
                marker_text: text.map(str::to_owned),
                entries,
                reported: true,
            }
        })
        .collect();

    // Unmarked requirements still apply where none of the markers do. Their
    // conflicts already surface in every marked scenario.
    let unconditional = group
        .requirements
        .iter()
        .any(|(_, requirement)| requirement.marker.is_true());
    if unconditional {
        let mut covered = MarkerTree::FALSE;
        for (marker, _) in &conditional {
            covered.or(*marker);
        }
        let remainder = covered.negate();
        if !remainder.is_false() {
            scenarios.push(Draft {
                marker: remainder,
                marker_text: remainder.try_to_string(),
                entries: base,
                reported: false,
            });
        }
    }
    scenarios
}

fn check_scenario(
    name: &PackageName,
    entries: &[(&Entry, &Requirement)],
    specifiers: &VersionSpecifiers,
    allows_prerelease: bool,
    versioned: bool,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if satisfying_version(specifiers, true).is_none() {
        let mut contributing: Vec<Location> =
            entries.iter().map(|(entry, _)| Location::of(entry)).collect();
        contributing.sort();
        contributing.dedup();
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            package: Some(name.clone()),
            message: format!(
                "no version of `{name}` satisfies `{}`: {}",
                written(entries),
                describe(entries)
            ),
            locations: contributing,
        });
    } else if !allows_prerelease && versioned && satisfying_version(specifiers, false).is_none() {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            package: Some(name.clone()),
            message: format!(
                "only pre-releases of `{name}` satisfy `{}`; pin a pre-release or pass `--pre`",
                written(entries)
            ),
            locations: entries.iter().map(|(entry, _)| Location::of(entry)).collect(),
        });
    }
}

/// The specifiers of `entries` in declaration order: `>=2,<1`.
fn written(entries: &[(&Entry, &Requirement)]) -> String {
    entries
        .iter()
        .map(|(_, requirement)| join_specifiers(&requirement.specifiers()))
        .filter(|specifiers| !specifiers.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// `numpy>=1.14 (requirements.txt:3) and numpy<1.0 (constraints.txt:1)`
fn describe(scenario: &[(&Entry, &Requirement)]) -> String {
    scenario
        .iter()
        .map(|(entry, requirement)| format!("`{requirement}` ({})", Location::of(entry)))
        .collect::<Vec<_>>()
        .join(" and ")
}
