//! Requirements manifests: the `requirements.txt` format.
//!
//! A manifest is a list of requirement lines (`numpy>=1.14,<1.20.0`),
//! grouped by the comment blocks that head them (`# Test`), interleaved with
//! pip options (`-r`, `-c`, `--index-url`, ...). [`Manifest`] parses the file
//! and [`analyze`] checks the requirements against each other.

pub use crate::analysis::{
    Analysis, Diagnostic, Location, PackageSummary, Scenario, Severity, analyze,
};
pub use crate::category::{Category, CategoryKind, CategoryKindError};
pub use crate::manifest::{
    Entry, EntryKind, IndexOption, LineError, LineErrorKind, Manifest, ManifestError,
};
pub use crate::requirement::{
    Requirement, RequirementError, RequirementErrorKind, VersionOrUrl, join_specifiers,
};
pub use crate::witness::{mentions_prerelease, satisfying_version};

mod analysis;
mod category;
mod manifest;
mod requirement;
mod witness;
