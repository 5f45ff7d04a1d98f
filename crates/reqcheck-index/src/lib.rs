//! Resolving requirements manifests against a package index.
//!
//! A [`PackageIndex`] lists the published versions of a package, either from
//! a PEP 691 simple repository ([`SimpleIndex`]) or from a local JSON file
//! ([`FlatIndex`]). The [`Resolver`] pins every package of an analyzed
//! manifest to the highest version its specifiers accept.

pub use crate::index::{FlatIndex, IndexError, PackageIndex, SimpleIndex};
pub use crate::resolver::{
    FailureKind, Pin, PrereleaseMode, Resolution, ResolveError, ResolvedPackage, Resolver,
};

mod index;
mod resolver;
