use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// The purpose of a group of requirements, inferred from the comment block
/// that heads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryKind {
    Runtime,
    Optional,
    Documentation,
    Linter,
    Formatter,
    Test,
    PipOnly,
    Other,
    Uncategorized,
}

impl CategoryKind {
    /// Classify a header comment by its words.
    ///
    /// The first sentence decides when it is conclusive, so a runtime header
    /// that goes on to mention "docs" stays runtime. `# Optional dependencies`
    /// is optional even though it says "dependencies", and anything
    /// mentioning pip or conda is pip-only.
    pub fn classify(text: &str) -> Self {
        let first_sentence = text.split(". ").next().unwrap_or(text);
        match Self::classify_words(first_sentence) {
            Self::Other => Self::classify_words(text),
            kind => kind,
        }
    }

    fn classify_words(text: &str) -> Self {
        let lowercase = text.to_ascii_lowercase();
        let words: Vec<&str> = lowercase
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|word| !word.is_empty())
            .collect();
        let any = |predicate: fn(&str) -> bool| words.iter().any(|word| predicate(word));

        if any(|word| matches!(word, "pip" | "conda")) {
            Self::PipOnly
        } else if any(|word| word == "optional" || word == "extras") {
            Self::Optional
        } else if any(|word| word.starts_with("doc")) {
            Self::Documentation
        } else if any(|word| word.starts_with("lint")) {
            Self::Linter
        } else if any(|word| word.starts_with("format")) {
            Self::Formatter
        } else if any(|word| word.starts_with("test")) {
            Self::Test
        } else if any(|word| {
            matches!(
                word,
                "runtime" | "dependencies" | "dependency" | "requirements" | "install" | "core"
            )
        }) {
            Self::Runtime
        } else {
            Self::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Runtime => "runtime",
            Self::Optional => "optional",
            Self::Documentation => "documentation",
            Self::Linter => "linter",
            Self::Formatter => "formatter",
            Self::Test => "test",
            Self::PipOnly => "pip-only",
            Self::Other => "other",
            Self::Uncategorized => "uncategorized",
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "unknown category `{0}` (expected one of runtime, optional, documentation, linter, formatter, test, pip-only, other, uncategorized)"
)]
pub struct CategoryKindError(String);

impl FromStr for CategoryKind {
    type Err = CategoryKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "runtime" => Ok(Self::Runtime),
            "optional" => Ok(Self::Optional),
            "documentation" | "docs" | "doc" => Ok(Self::Documentation),
            "linter" | "lint" => Ok(Self::Linter),
            "formatter" | "format" => Ok(Self::Formatter),
            "test" | "tests" => Ok(Self::Test),
            "pip-only" | "pip" => Ok(Self::PipOnly),
            "other" => Ok(Self::Other),
            "uncategorized" => Ok(Self::Uncategorized),
            _ => Err(CategoryKindError(s.to_owned())),
        }
    }
}

/// A comment-delimited group of requirements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Category {
    /// The first line of the header comment, without the `#`.
    pub label: Option<String>,
    pub kind: CategoryKind,
}

impl Category {
    pub fn uncategorized() -> Self {
        Self {
            label: None,
            kind: CategoryKind::Uncategorized,
        }
    }

    /// Build a category from the lines of a header comment, `#` included.
    ///
    /// Returns `None` when the block has no text.
    pub fn from_header<'a>(lines: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let texts: Vec<&str> = lines
            .into_iter()
            .map(|line| line.trim_start().trim_start_matches('#').trim())
            .filter(|text| !text.is_empty())
            .collect();
        let label = texts.first()?;
        Some(Self {
            label: Some((*label).to_owned()),
            kind: CategoryKind::classify(&texts.join(" ")),
        })
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::uncategorized()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => f.write_str(label),
            None => f.write_str(self.kind.as_str()),
        }
    }
}
