//! Finding a concrete version inside a set of version specifiers.
//!
//! The specifiers are converted into [`Ranges`], and a handful of versions
//! around each range bound are tried against the specifiers themselves. The
//! range alone is not enough: PEP 440 comparisons exclude pre-releases and
//! post-releases of the bound's own release, so a non-empty range can still
//! contain no matching version.

use std::collections::Bound;

use uv_pep440::{LocalVersionSlice, Operator, Prerelease, Version, VersionSpecifiers};
use version_ranges::Ranges;

/// Whether a specifier explicitly asks for a pre-release, which makes
/// pre-releases acceptable. Excluding one with `!=` does not.
pub fn mentions_prerelease(specifiers: &VersionSpecifiers) -> bool {
    specifiers.iter().any(|specifier| {
        specifier.any_prerelease()
            && !matches!(
                specifier.operator(),
                Operator::NotEqual | Operator::NotEqualStar
            )
    })
}

/// A version that satisfies every specifier, when one exists.
///
/// Final releases are preferred over post-releases, shorter release numbers
/// over longer ones, then the lowest version. Pre-releases and development
/// releases are only returned when `allow_prerelease` is set, and even then
/// only when no final release fits.
pub fn satisfying_version(
    specifiers: &VersionSpecifiers,
    allow_prerelease: bool,
) -> Option<Version> {
    let ranges = Ranges::from(specifiers.clone());
    ranges
        .iter()
        .flat_map(|(lower, upper)| [lower, upper])
        .filter_map(|bound| match bound {
            Bound::Included(version) | Bound::Excluded(version) => Some(version),
            Bound::Unbounded => None,
        })
        .flat_map(neighbours)
        .chain(std::iter::once(Version::new([0])))
        .filter(|version| allow_prerelease || !version.any_prerelease())
        .filter(|version| specifiers.contains(version))
        .min_by(|a, b| {
            (a.any_prerelease(), a.is_post(), a.release().len())
                .cmp(&(b.any_prerelease(), b.is_post(), b.release().len()))
                .then_with(|| a.cmp(b))
        })
}

/// Versions on and right above `bound`, which is where the first version
/// admitted by a range lies.
fn neighbours(bound: &Version) -> Vec<Version> {
    let version = without_sentinel(bound);
    let release = version.release().to_vec();
    let base = Version::new(release.iter().copied()).with_epoch(version.epoch());

    let mut bumped = release.clone();
    if let Some(last) = bumped.last_mut() {
        *last += 1;
    }
    let mut candidates = vec![
        base.clone().with_release(bumped),
        base.clone().with_release(release.iter().copied().chain([1])),
        base.clone().with_release(release.iter().copied().chain([0, 1])),
        base.clone()
            .with_post(Some(version.post().map_or(0, |post| post + 1))),
    ];
    if let Some(pre) = version.pre() {
        candidates.push(base.clone().with_pre(Some(Prerelease {
            kind: pre.kind,
            number: pre.number + 1,
        })));
    }
    if let Some(dev) = version.dev() {
        candidates.push(version.clone().with_dev(Some(dev + 1)));
    }
    candidates.push(base);
    candidates.push(version);
    candidates
}

/// Drop the internal `min`/`max` markers that range bounds carry, keeping
/// everything a published version can have.
fn without_sentinel(version: &Version) -> Version {
    let mut clean = Version::new(version.release().iter().copied())
        .with_epoch(version.epoch())
        .with_pre(version.pre())
        .with_post(version.post())
        .with_dev(version.dev());
    if let LocalVersionSlice::Segments(segments) = version.local() {
        if !segments.is_empty() {
            clean = clean.with_local_segments(segments.to_vec());
        }
    }
    clean
}
