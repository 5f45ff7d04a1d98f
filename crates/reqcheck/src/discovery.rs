//! Locating the requirements file when the command line names none.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// Parent directories searched unless `REQCHECK_MAX_DEPTH` says otherwise.
const DEFAULT_MAX_DEPTH: usize = 3;

/// Manifest file names, preferred first.
const MANIFEST_NAMES: [&str; 2] = ["requirements-dev.txt", "requirements.txt"];

/// Use `explicit` if given, otherwise discover a manifest from the current
/// directory.
pub fn manifest_or_discover(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    find_manifest(&env::current_dir()?)
}

/// The requirements file `reqcheck` works on when none is named.
///
/// `REQCHECK_MANIFEST` wins when set and must name an existing file.
/// Otherwise `start_dir` and then its ancestors are searched, at most
/// `REQCHECK_MAX_DEPTH` levels up (3 by default). Within one directory a
/// `requirements-dev.txt` is taken over a `requirements.txt`, since the
/// former usually includes the latter.
pub fn find_manifest(start_dir: &Path) -> Result<PathBuf> {
    if let Ok(explicit) = env::var("REQCHECK_MANIFEST") {
        let path = PathBuf::from(&explicit);
        if !path.is_file() {
            bail!("`REQCHECK_MANIFEST` points at `{explicit}`, which is not a file");
        }
        return Ok(path);
    }

    let levels = env::var("REQCHECK_MAX_DEPTH")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(DEFAULT_MAX_DEPTH);

    let found = start_dir
        .ancestors()
        .take(levels + 1)
        .flat_map(|dir| MANIFEST_NAMES.map(|name| dir.join(name)))
        .find(|candidate| candidate.is_file());
    match found {
        Some(manifest) => Ok(relative_to_cwd(&manifest)),
        None => bail!(
            "no `{}` or `{}` in `{}` or the {levels} directories above it; pass a file or set `REQCHECK_MANIFEST`",
            MANIFEST_NAMES[0],
            MANIFEST_NAMES[1],
            start_dir.display()
        ),
    }
}

/// Shorten `path` to be relative to the working directory when it lies
/// beneath it, so diagnostics read `requirements.txt:3` rather than an
/// absolute path.
pub fn relative_to_cwd(path: &Path) -> PathBuf {
    env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
}
