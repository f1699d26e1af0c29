//! Source discovery.
//!
//! The search root is resolved strictly: a missing root is an error, never an
//! empty source list. Files under the managed environment are skipped so that
//! protos vendored into installed packages are not regenerated.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{GenerateError, Result};

/// File extension of generator sources.
pub const PROTO_EXTENSION: &str = "proto";

/// Resolves `root` against `base` into an existing absolute directory.
///
/// # Errors
///
/// Returns [`GenerateError::Discovery`] if the path does not exist and
/// [`GenerateError::NotADirectory`] if it is not a directory.
pub fn resolve(root: &Path, base: &Path) -> Result<PathBuf> {
    let joined = base.join(root);
    let resolved = joined
        .canonicalize()
        .map_err(|e| GenerateError::Discovery {
            path: joined.clone(),
            source: e,
        })?;

    if !resolved.is_dir() {
        return Err(GenerateError::NotADirectory { path: resolved });
    }

    Ok(resolved)
}

/// Recursively finds `.proto` files under `dir`, skipping anything inside
/// `managed_env_root`.
///
/// Symlinked files are included. Symlinked directories are not descended
/// into. The result is sorted. An empty result is not an error.
///
/// # Errors
///
/// Returns [`GenerateError::Walk`] if a directory cannot be read.
pub fn discover(dir: &Path, managed_env_root: &Path) -> Result<Vec<PathBuf>> {
    info!(root = %dir.display(), "Locating protobuf files");

    let excluded = managed_env_root
        .canonicalize()
        .unwrap_or_else(|_| managed_env_root.to_path_buf());

    let mut sources = Vec::new();
    let walker = WalkDir::new(dir).into_iter().filter_entry(|entry| {
        let skip = entry.path().starts_with(&excluded);
        if skip && entry.file_type().is_dir() {
            debug!(dir = %entry.path().display(), "Skipping managed environment");
        }
        !skip
    });

    for entry in walker {
        let entry = entry.map_err(|e| GenerateError::Walk {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if is_file
            && entry.path().extension().and_then(OsStr::to_str) == Some(PROTO_EXTENSION)
        {
            sources.push(entry.into_path());
        }
    }

    sources.sort();
    info!(count = sources.len(), "Discovery complete");

    Ok(sources)
}
