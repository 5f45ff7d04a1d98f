//! Requirements files: logical lines, comment-delimited categories and
//! `-r`/`-c` includes.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use rustc_hash::FxHashSet;
use tracing::{debug, trace};
use url::Url;

use crate::category::{Category, CategoryKind};
use crate::requirement::{Requirement, RequirementError};

/// One logical line of a requirements file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The file the line was read from.
    pub source: PathBuf,
    /// 1-based number of the line's first physical line.
    pub line: usize,
    pub category: Category,
    pub kind: EntryKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Requirement(Requirement),
    /// `-e <path or url>`, kept verbatim.
    Editable(String),
    /// `-r <file>`, relative to the including file.
    Include(PathBuf),
    /// `-c <file>`, relative to the including file.
    Constraint(PathBuf),
    Option(IndexOption),
}

/// Global options that configure where and how packages are found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOption {
    IndexUrl(Url),
    ExtraIndexUrl(Url),
    FindLinks(String),
    NoIndex,
    Pre,
    TrustedHost(String),
    PreferBinary,
    OnlyBinary(String),
    NoBinary(String),
}

/// A parsed requirements file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    path: PathBuf,
    entries: Vec<Entry>,
    constraints: Vec<Entry>,
}

impl Manifest {
    /// Parse `content` without following `-r` or `-c`.
    pub fn parse(content: &str, path: impl Into<PathBuf>) -> Result<Self, ManifestError> {
        let (manifest, mut errors) = Self::parse_lenient(content, path);
        if errors.is_empty() {
            Ok(manifest)
        } else {
            Err(ManifestError::Parse(errors.swap_remove(0)))
        }
    }

    /// Parse `content`, collecting every line-level error instead of stopping
    /// at the first. Lines that fail to parse are left out of the manifest.
    pub fn parse_lenient(content: &str, path: impl Into<PathBuf>) -> (Self, Vec<LineError>) {
        let path = path.into();
        let (entries, errors) = parse_entries(content, &path);
        (
            Self {
                path,
                entries,
                constraints: Vec::new(),
            },
            errors,
        )
    }

    /// Read a requirements file, expanding `-r` includes and loading `-c`
    /// constraint files.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let mut loader = Loader::default();
        let manifest = loader.load_root(path.as_ref())?;
        match loader.errors.into_iter().next() {
            Some(error) => Err(ManifestError::Parse(error)),
            None => Ok(manifest),
        }
    }

    /// Like [`Manifest::from_path`], but line-level errors in any file are
    /// collected rather than fatal.
    pub fn from_path_lenient(
        path: impl AsRef<Path>,
    ) -> Result<(Self, Vec<LineError>), ManifestError> {
        let mut loader = Loader::default();
        let manifest = loader.load_root(path.as_ref())?;
        Ok((manifest, loader.errors))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every entry in file order, with included files spliced in after their
    /// `-r` line.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Requirements loaded through `-c`.
    pub fn constraints(&self) -> impl Iterator<Item = (&Entry, &Requirement)> {
        requirements(&self.constraints)
    }

    /// Every requirement with the entry that holds it.
    pub fn requirements(&self) -> impl Iterator<Item = (&Entry, &Requirement)> {
        requirements(&self.entries)
    }

    /// Categories in the order they first appear.
    pub fn categories(&self) -> Vec<&Category> {
        let mut categories: Vec<&Category> = Vec::new();
        for (entry, _) in self.requirements() {
            if !categories.contains(&&entry.category) {
                categories.push(&entry.category);
            }
        }
        categories
    }

    /// The global index options, in file order.
    pub fn options(&self) -> impl Iterator<Item = &IndexOption> {
        self.entries.iter().filter_map(|entry| match &entry.kind {
            EntryKind::Option(option) => Some(option),
            _ => None,
        })
    }

    /// Whether `--pre` appears anywhere.
    pub fn allows_prerelease(&self) -> bool {
        self.options().any(|option| matches!(option, IndexOption::Pre))
    }
}

fn requirements(entries: &[Entry]) -> impl Iterator<Item = (&Entry, &Requirement)> {
    entries.iter().filter_map(|entry| match &entry.kind {
        EntryKind::Requirement(requirement) => Some((entry, requirement)),
        _ => None,
    })
}

/// A physical or continued line, after comment handling.
#[derive(Debug)]
enum Line<'a> {
    Blank,
    Comment(&'a str),
    Content { line: usize, text: String },
}

/// Split `content` into logical lines. A trailing `\` joins the next line and
/// ` #` starts an inline comment.
fn logical_lines(content: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (index, raw) in content.lines().enumerate() {
        let number = index + 1;
        if pending.is_none() {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                lines.push(Line::Blank);
                continue;
            }
            if trimmed.starts_with('#') {
                lines.push(Line::Comment(trimmed));
                continue;
            }
        }

        let (start, mut text) = pending.take().unwrap_or((number, String::new()));
        if let Some(continued) = raw.strip_suffix('\\') {
            text.push_str(continued);
            pending = Some((start, text));
        } else {
            text.push_str(raw);
            lines.push(Line::Content {
                line: start,
                text: strip_comment(&text).trim().to_owned(),
            });
        }
    }
    if let Some((line, text)) = pending {
        lines.push(Line::Content {
            line,
            text: strip_comment(&text).trim().to_owned(),
        });
    }
    lines
}

fn strip_comment(text: &str) -> &str {
    let mut previous = ' ';
    for (index, c) in text.char_indices() {
        if c == '#' && previous.is_whitespace() {
            return &text[..index];
        }
        previous = c;
    }
    text
}

fn parse_entries(content: &str, path: &Path) -> (Vec<Entry>, Vec<LineError>) {
    let mut entries = Vec::new();
    let mut errors = Vec::new();
    let mut category = Category::uncategorized();
    let mut header: Vec<&str> = Vec::new();

    for line in logical_lines(content) {
        match line {
            Line::Blank => header.clear(),
            Line::Comment(comment) => header.push(comment),
            Line::Content { line, text } => {
                if let Some(next) = Category::from_header(header.drain(..)) {
                    trace!("{}:{line}: category `{next}` ({})", path.display(), next.kind);
                    category = next;
                }
                if text.is_empty() {
                    continue;
                }
                match parse_entry(&text) {
                    Ok(kind) => entries.push(Entry {
                        source: path.to_path_buf(),
                        line,
                        category: category.clone(),
                        kind,
                    }),
                    Err(kind) => errors.push(LineError {
                        path: path.to_path_buf(),
                        line,
                        content: text,
                        kind,
                    }),
                }
            }
        }
    }
    (entries, errors)
}

fn parse_entry(text: &str) -> Result<EntryKind, LineErrorKind> {
    if !text.starts_with('-') {
        return Ok(EntryKind::Requirement(Requirement::from_str(text)?));
    }

    let (option, value) = split_option(text);
    let required = || {
        value
            .map(str::to_owned)
            .ok_or_else(|| LineErrorKind::MissingValue(option.to_owned()))
    };
    let flag = |kind: IndexOption| match value {
        Some(_) => Err(LineErrorKind::UnexpectedValue(option.to_owned())),
        None => Ok(EntryKind::Option(kind)),
    };
    let url = |value: String| {
        Url::parse(&value).map_err(|err| LineErrorKind::IndexUrl(value.clone(), err))
    };

    match option {
        "-r" | "--requirement" => Ok(EntryKind::Include(PathBuf::from(required()?))),
        "-c" | "--constraint" => Ok(EntryKind::Constraint(PathBuf::from(required()?))),
        "-e" | "--editable" => Ok(EntryKind::Editable(required()?)),
        "-i" | "--index-url" => Ok(EntryKind::Option(IndexOption::IndexUrl(url(required()?)?))),
        "--extra-index-url" => Ok(EntryKind::Option(IndexOption::ExtraIndexUrl(url(
            required()?,
        )?))),
        "-f" | "--find-links" => Ok(EntryKind::Option(IndexOption::FindLinks(required()?))),
        "--trusted-host" => Ok(EntryKind::Option(IndexOption::TrustedHost(required()?))),
        "--only-binary" => Ok(EntryKind::Option(IndexOption::OnlyBinary(required()?))),
        "--no-binary" => Ok(EntryKind::Option(IndexOption::NoBinary(required()?))),
        "--no-index" => flag(IndexOption::NoIndex),
        "--pre" => flag(IndexOption::Pre),
        "--prefer-binary" => flag(IndexOption::PreferBinary),
        _ => Err(LineErrorKind::UnsupportedOption(option.to_owned())),
    }
}

/// Split `--opt=value`, `--opt value`, `-o value` and `-ovalue`.
fn split_option(text: &str) -> (&str, Option<&str>) {
    fn non_empty(value: &str) -> Option<&str> {
        let value = value.trim();
        (!value.is_empty()).then_some(value)
    }

    if text.starts_with("--") {
        if let Some((option, value)) = text.split_once('=') {
            if !option.contains(char::is_whitespace) {
                return (option, non_empty(value));
            }
        }
        return match text.split_once(char::is_whitespace) {
            Some((option, value)) => (option, non_empty(value)),
            None => (text, None),
        };
    }
    // Short options take the rest of the line, with or without a space.
    match text.char_indices().nth(2) {
        Some((index, _)) => (&text[..index], non_empty(&text[index..])),
        None => (text, None),
    }
}

/// Expands includes and constraints while loading a manifest from disk.
#[derive(Debug, Default)]
struct Loader {
    /// Canonical paths of the files currently being loaded, outermost first.
    stack: Vec<PathBuf>,
    /// Canonical paths of every file already loaded.
    seen: FxHashSet<PathBuf>,
    errors: Vec<LineError>,
}

impl Loader {
    fn load_root(&mut self, path: &Path) -> Result<Manifest, ManifestError> {
        let mut constraints = Vec::new();
        let entries = self.load(path, &mut constraints)?;
        Ok(Manifest {
            path: path.to_path_buf(),
            entries,
            constraints,
        })
    }

    fn load(
        &mut self,
        path: &Path,
        constraints: &mut Vec<Entry>,
    ) -> Result<Vec<Entry>, ManifestError> {
        let content = fs_err::read_to_string(path)?;
        let canonical = fs_err::canonicalize(path)?;
        if self.stack.contains(&canonical) {
            let mut chain = self.stack.clone();
            chain.push(canonical);
            return Err(ManifestError::IncludeCycle { chain });
        }
        if !self.seen.insert(canonical.clone()) {
            debug!("Skipping `{}`, already loaded", path.display());
            return Ok(Vec::new());
        }
        debug!("Reading requirements from `{}`", path.display());

        let (parsed, errors) = parse_entries(&content, path);
        self.errors.extend(errors);
        self.stack.push(canonical);

        let directory = path.parent().unwrap_or_else(|| Path::new(""));
        let mut entries = Vec::with_capacity(parsed.len());
        for entry in parsed {
            match &entry.kind {
                EntryKind::Include(target) => {
                    let target = resolve_include(directory, target, &entry)?;
                    let category = entry.category.clone();
                    entries.push(entry);
                    for mut included in self.load(&target, constraints)? {
                        if included.category.kind == CategoryKind::Uncategorized {
                            included.category = category.clone();
                        }
                        entries.push(included);
                    }
                }
                EntryKind::Constraint(target) => {
                    let target = resolve_include(directory, target, &entry)?;
                    entries.push(entry);
                    let loaded = self.load(&target, constraints)?;
                    constraints.extend(
                        loaded
                            .into_iter()
                            .filter(|entry| matches!(entry.kind, EntryKind::Requirement(_))),
                    );
                }
                _ => entries.push(entry),
            }
        }

        self.stack.pop();
        Ok(entries)
    }
}

fn resolve_include(directory: &Path, target: &Path, entry: &Entry) -> Result<PathBuf, ManifestError> {
    let text = target.to_string_lossy();
    if text.contains("://") {
        return Err(ManifestError::RemoteInclude {
            path: entry.source.clone(),
            line: entry.line,
            target: text.into_owned(),
        });
    }
    Ok(directory.join(target))
}

/// A line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}:{line}: {kind}", path.display())]
pub struct LineError {
    pub path: PathBuf,
    pub line: usize,
    /// The logical line, comments removed.
    pub content: String,
    pub kind: LineErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineErrorKind {
    #[error(transparent)]
    Requirement(#[from] RequirementError),
    #[error("unsupported option `{0}`")]
    UnsupportedOption(String),
    #[error("option `{0}` requires a value")]
    MissingValue(String),
    #[error("option `{0}` does not take a value")]
    UnexpectedValue(String),
    #[error("invalid index URL `{0}`: {1}")]
    IndexUrl(String, url::ParseError),
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] LineError),
    #[error("requirements files include each other: {}", format_chain(chain))]
    IncludeCycle { chain: Vec<PathBuf> },
    #[error("{}:{line}: remote include `{target}` is not supported", path.display())]
    RemoteInclude {
        path: PathBuf,
        line: usize,
        target: String,
    },
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|path| format!("`{}`", path.display()))
        .collect::<Vec<_>>()
        .join(" -> ")
}
