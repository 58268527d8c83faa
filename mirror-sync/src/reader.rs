//! Index readers: produce a [`FileIndex`] for a root location.
//!
//! [`FsReader`] walks a real directory tree and fingerprints every regular
//! file with SHA-256. A `HashMap<PathBuf, FileIndex>` is also a reader, which
//! is how tests feed canned indexes to the pipeline.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use mirror_core::types::{FileIndex, Fingerprint};

use crate::error::{io_err, SyncError};

/// Capability to snapshot a root location as fingerprint → filename.
pub trait IndexReader {
    fn read(&self, root: &Path) -> Result<FileIndex, SyncError>;
}

impl IndexReader for HashMap<PathBuf, FileIndex> {
    fn read(&self, root: &Path) -> Result<FileIndex, SyncError> {
        self.get(root).cloned().ok_or_else(|| {
            io_err(
                root,
                std::io::Error::new(ErrorKind::NotFound, "no index recorded for root"),
            )
        })
    }
}

// ---------------------------------------------------------------------------
// FsReader
// ---------------------------------------------------------------------------

/// Recursive directory reader.
///
/// Entries are visited in file-name order. Symlinks and other non-regular
/// files are skipped. When two files share content, the first one visited
/// keeps the fingerprint and the rest are left out of the index.
#[derive(Debug, Clone, Default)]
pub struct FsReader {
    exclude: Vec<PathBuf>,
    /// `(root, prefix)` pairs honored only while reading that exact root.
    scoped_exclude: Vec<(PathBuf, PathBuf)>,
    allow_missing_root: bool,
}

impl FsReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip every entry whose path relative to the root starts with one of
    /// `prefixes` (compared component by component).
    pub fn with_exclude<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathBuf>,
    {
        self.exclude.extend(prefixes.into_iter().map(Into::into));
        self
    }

    /// Skip `prefix` only when the walk starts at `root`. Used to keep one
    /// sync root out of the other when they are nested.
    pub fn with_exclude_under(mut self, root: impl Into<PathBuf>, prefix: impl Into<PathBuf>) -> Self {
        self.scoped_exclude.push((root.into(), prefix.into()));
        self
    }

    /// Treat a root that does not exist as empty instead of failing.
    pub fn allow_missing_root(mut self, allow: bool) -> Self {
        self.allow_missing_root = allow;
        self
    }

    fn is_excluded(&self, root: &Path, relative: &Path) -> bool {
        self.exclude.iter().any(|prefix| relative.starts_with(prefix))
            || self
                .scoped_exclude
                .iter()
                .any(|(scope, prefix)| scope == root && relative.starts_with(prefix))
    }

    fn walk(&self, root: &Path, relative: &Path, index: &mut FileIndex) -> Result<(), SyncError> {
        let dir = root.join(relative);
        let mut entries = std::fs::read_dir(&dir)
            .map_err(|e| io_err(&dir, e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| io_err(&dir, e))?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let name = relative.join(entry.file_name());
            if self.is_excluded(root, &name) {
                tracing::debug!("excluded: {}", name.display());
                continue;
            }

            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| io_err(&path, e))?;
            if file_type.is_dir() {
                self.walk(root, &name, index)?;
            } else if file_type.is_file() {
                let fingerprint = hash_file(&path)?;
                if let Some(first) = index.get(&fingerprint) {
                    tracing::debug!(
                        "duplicate content: {} matches {}",
                        name.display(),
                        first.display()
                    );
                    continue;
                }
                index.insert(fingerprint, name);
            } else {
                tracing::debug!("skipping non-regular file: {}", path.display());
            }
        }
        Ok(())
    }
}

impl IndexReader for FsReader {
    fn read(&self, root: &Path) -> Result<FileIndex, SyncError> {
        match std::fs::metadata(root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(SyncError::NotADirectory {
                    path: root.to_path_buf(),
                })
            }
            Err(err) if err.kind() == ErrorKind::NotFound && self.allow_missing_root => {
                tracing::debug!("missing root read as empty: {}", root.display());
                return Ok(FileIndex::new());
            }
            Err(err) => return Err(io_err(root, err)),
        }

        let mut index = FileIndex::new();
        self.walk(root, Path::new(""), &mut index)?;
        tracing::debug!("indexed {} file(s) under {}", index.len(), root.display());
        Ok(index)
    }
}

/// SHA-256 of the file's bytes, lowercase hex.
pub fn hash_file(path: &Path) -> Result<Fingerprint, SyncError> {
    let file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut BufReader::new(file), &mut hasher).map_err(|e| io_err(path, e))?;
    Ok(Fingerprint(hex::encode(hasher.finalize())))
}
