//! Local artifact cache.
//!
//! Metadata documents and binaries share one layout:
//!
//! ```text
//! <root>/<group as directories>/<artifact>/<version>/<artifact>-<version>[-<classifier>].<ext>
//! ```
//!
//! A file existing at its path is the only freshness check. Snapshots are
//! the exception and are always fetched again.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::coordinate::Coordinate;

/// Extension of cached metadata documents.
pub const METADATA_EXTENSION: &str = "pom";

/// Maps coordinates to paths under a cache root.
#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every file of one coordinate's version.
    pub fn version_dir(&self, coordinate: &Coordinate) -> PathBuf {
        let mut dir = self.root.clone();
        dir.extend(coordinate.group().split('.').filter(|s| !s.is_empty()));
        dir.push(coordinate.artifact());
        dir.push(coordinate.decided_version().unwrap_or_default());
        dir
    }

    /// Path of the binary artifact, using the packaging type as extension.
    pub fn artifact_path(&self, coordinate: &Coordinate) -> PathBuf {
        self.version_dir(coordinate)
            .join(coordinate.file_name(coordinate.packaging()))
    }

    /// Path of the metadata document. Classifiers do not apply.
    pub fn metadata_path(&self, coordinate: &Coordinate) -> PathBuf {
        let version = coordinate.decided_version().unwrap_or_default();
        self.version_dir(coordinate).join(format!(
            "{}-{}.{}",
            coordinate.artifact(),
            version,
            METADATA_EXTENSION
        ))
    }
}

/// Outcome of clearing the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearResult {
    pub files_deleted: u64,
    pub bytes_freed: u64,
}

/// Delete the whole cache tree.
///
/// A missing cache directory is not an error.
pub fn clear_cache(root: &Path) -> io::Result<ClearResult> {
    if !root.exists() {
        return Ok(ClearResult::default());
    }

    let (files_deleted, bytes_freed) = cache_stats(root)?;
    fs::remove_dir_all(root)?;

    Ok(ClearResult {
        files_deleted,
        bytes_freed,
    })
}

/// Count the files and bytes held in the cache.
pub fn cache_stats(root: &Path) -> io::Result<(u64, u64)> {
    if !root.exists() {
        return Ok((0, 0));
    }

    let mut files = 0;
    let mut bytes = 0;
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                files += 1;
                bytes += entry.metadata()?.len();
            }
        }
    }

    Ok((files, bytes))
}
