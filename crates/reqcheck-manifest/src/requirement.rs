//! A single requirement specifier line.
//!
//! The requirement itself is PEP 508 and is parsed by [`uv_pep508`]. What
//! requirements files add on top is handled here: trailing per-requirement
//! options, of which only `--hash` is accepted.
//!
//! ```text
//! name [ "[" extra, ... "]" ] [ "(" ] specifiers [ ")" ] [ ";" marker ] [ --hash=... ]
//! name [ "[" extra, ... "]" ] "@" url [ " ;" marker ] [ --hash=... ]
//! ```

use std::fmt;
use std::str::FromStr;

use url::Url;
use uv_normalize::{ExtraName, PackageName};
use uv_pep440::VersionSpecifiers;
use uv_pep508::{MarkerTree, VerbatimUrl};

/// A parsed requirement such as `numpy>=1.14,<1.20.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: PackageName,
    pub extras: Vec<ExtraName>,
    pub version_or_url: Option<VersionOrUrl>,
    /// The environment marker, [`MarkerTree::TRUE`] when there is none.
    pub marker: MarkerTree,
    /// The environment marker after `;`, as written.
    pub marker_text: Option<String>,
    /// Values of `--hash` options, such as `sha256:...`.
    pub hashes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionOrUrl {
    VersionSpecifier(VersionSpecifiers),
    Url(Url),
}

impl Requirement {
    /// The version specifiers, or an empty set when the requirement is a bare
    /// name or a direct URL.
    pub fn specifiers(&self) -> VersionSpecifiers {
        match &self.version_or_url {
            Some(VersionOrUrl::VersionSpecifier(specifiers)) => specifiers.clone(),
            Some(VersionOrUrl::Url(_)) | None => VersionSpecifiers::empty(),
        }
    }

    pub fn url(&self) -> Option<&Url> {
        match &self.version_or_url {
            Some(VersionOrUrl::Url(url)) => Some(url),
            _ => None,
        }
    }
}

impl FromStr for Requirement {
    type Err = RequirementError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parse(input).map_err(|kind| RequirementError {
            input: input.trim().to_owned(),
            kind: Box::new(kind),
        })
    }
}

fn parse(input: &str) -> Result<Requirement, RequirementErrorKind> {
    let (requirement, options) = split_options(input.trim());
    let hashes = parse_options(options)?;

    let parsed = uv_pep508::Requirement::<VerbatimUrl>::from_str(requirement)
        .map_err(|err| RequirementErrorKind::Pep508(err.message.to_string()))?;

    let version_or_url = match parsed.version_or_url {
        Some(uv_pep508::VersionOrUrl::VersionSpecifier(specifiers)) if specifiers.is_empty() => {
            None
        }
        Some(uv_pep508::VersionOrUrl::VersionSpecifier(specifiers)) => {
            Some(VersionOrUrl::VersionSpecifier(specifiers))
        }
        Some(uv_pep508::VersionOrUrl::Url(url)) => Some(VersionOrUrl::Url(Url::clone(&url))),
        None => None,
    };
    let marker_text = if matches!(version_or_url, Some(VersionOrUrl::Url(_))) {
        split_url_marker(requirement)
    } else {
        requirement.split_once(';').map(|(_, marker)| marker)
    }
    .map(str::trim)
    .filter(|marker| !marker.is_empty())
    .map(str::to_owned);

    Ok(Requirement {
        name: parsed.name,
        extras: parsed.extras.into_vec(),
        version_or_url,
        marker: parsed.marker,
        marker_text,
        hashes,
    })
}

/// Split trailing per-requirement options (` --hash=...`) from the requirement.
fn split_options(input: &str) -> (&str, &str) {
    let bytes = input.as_bytes();
    for (index, window) in bytes.windows(3).enumerate() {
        if window[0].is_ascii_whitespace() && window[1] == b'-' && window[2] == b'-' {
            return (&input[..index], input[index..].trim());
        }
    }
    (input, "")
}

fn parse_options(options: &str) -> Result<Vec<String>, RequirementErrorKind> {
    let mut hashes = Vec::new();
    let mut tokens = options.split_whitespace();
    while let Some(token) = tokens.next() {
        let (option, value) = match token.split_once('=') {
            Some((option, value)) => (option, Some(value.to_owned())),
            None => (token, None),
        };
        if option != "--hash" {
            return Err(RequirementErrorKind::UnsupportedOption(option.to_owned()));
        }
        let value = match value {
            Some(value) => value,
            None => tokens
                .next()
                .map(str::to_owned)
                .ok_or(RequirementErrorKind::MissingHash)?,
        };
        if !value.contains(':') {
            return Err(RequirementErrorKind::InvalidHash(value));
        }
        hashes.push(value);
    }
    Ok(hashes)
}

/// The marker of a URL requirement. Its `;` must follow whitespace, since
/// URLs may contain `;` themselves.
fn split_url_marker(requirement: &str) -> Option<&str> {
    let mut previous = 'x';
    for (index, c) in requirement.char_indices() {
        if c == ';' && previous.is_whitespace() {
            return Some(&requirement[index + 1..]);
        }
        previous = c;
    }
    None
}

/// Specifiers joined the way they are written in requirements files:
/// `>=1.14,<1.20.0`.
pub fn join_specifiers(specifiers: &VersionSpecifiers) -> String {
    specifiers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            let extras: Vec<&str> = self.extras.iter().map(ExtraName::as_str).collect();
            write!(f, "[{}]", extras.join(","))?;
        }
        match &self.version_or_url {
            Some(VersionOrUrl::VersionSpecifier(specifiers)) => {
                f.write_str(&join_specifiers(specifiers))?;
            }
            Some(VersionOrUrl::Url(url)) => write!(f, " @ {url}")?,
            None => {}
        }
        if let Some(marker) = &self.marker_text {
            if self.url().is_some() {
                write!(f, " ; {marker}")?;
            } else {
                write!(f, "; {marker}")?;
            }
        }
        for hash in &self.hashes {
            write!(f, " --hash={hash}")?;
        }
        Ok(())
    }
}

/// An error raised while parsing a [`Requirement`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid requirement `{input}`: {kind}")]
pub struct RequirementError {
    input: String,
    kind: Box<RequirementErrorKind>,
}

impl RequirementError {
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn kind(&self) -> &RequirementErrorKind {
        &self.kind
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequirementErrorKind {
    /// The PEP 508 part of the line is malformed.
    #[error("{0}")]
    Pep508(String),
    #[error("`--hash` requires a value")]
    MissingHash,
    #[error("hash `{0}` must have the form `algorithm:digest`")]
    InvalidHash(String),
    #[error("option `{0}` is not supported on a requirement line")]
    UnsupportedOption(String),
}
