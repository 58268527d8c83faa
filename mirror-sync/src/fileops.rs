//! File operation sinks.
//!
//! [`FsFileOps`] performs operations on disk. [`RecordingFileOps`] only
//! remembers them, in call order, for tests and dry runs.

use std::path::{Path, PathBuf};

use mirror_core::types::FileOperation;

use crate::error::{io_err, SyncError};

/// Capability to copy, move and delete files.
pub trait FileOperations {
    fn copy(&mut self, src: &Path, dst: &Path) -> Result<(), SyncError>;
    fn move_file(&mut self, src: &Path, dst: &Path) -> Result<(), SyncError>;
    fn delete(&mut self, path: &Path) -> Result<(), SyncError>;

    /// Dispatch a single [`FileOperation`] to the matching method.
    fn apply(&mut self, op: &FileOperation) -> Result<(), SyncError> {
        match op {
            FileOperation::Copy { from, to } => self.copy(from, to),
            FileOperation::Move { from, to } => self.move_file(from, to),
            FileOperation::Delete { path } => self.delete(path),
        }
    }
}

// ---------------------------------------------------------------------------
// FsFileOps
// ---------------------------------------------------------------------------

/// Real filesystem sink rooted at the destination directory.
///
/// Parent directories of every target are created on demand. An empty
/// directory standing where a file must go is removed first, and directories
/// emptied by a move or delete are pruned up to (never including) `root`.
#[derive(Debug, Clone)]
pub struct FsFileOps {
    root: PathBuf,
}

impl FsFileOps {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn prepare_target(dst: &Path) -> Result<(), SyncError> {
        let is_dir = std::fs::symlink_metadata(dst)
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        if is_dir {
            std::fs::remove_dir(dst).map_err(|e| io_err(dst, e))?;
            tracing::debug!("removed empty directory in the way: {}", dst.display());
        }
        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        Ok(())
    }

    /// Remove directories left empty after `removed` went away. Stops at the
    /// first directory that still has entries.
    fn prune_empty_parents(&self, removed: &Path) {
        let mut dir = removed.parent();
        while let Some(current) = dir {
            if current == self.root || !current.starts_with(&self.root) {
                break;
            }
            if std::fs::remove_dir(current).is_err() {
                break;
            }
            tracing::debug!("pruned empty directory: {}", current.display());
            dir = current.parent();
        }
    }
}

impl FileOperations for FsFileOps {
    fn copy(&mut self, src: &Path, dst: &Path) -> Result<(), SyncError> {
        std::fs::metadata(src).map_err(|e| io_err(src, e))?;
        Self::prepare_target(dst)?;
        std::fs::copy(src, dst).map_err(|e| io_err(dst, e))?;
        tracing::info!("copied: {} -> {}", src.display(), dst.display());
        Ok(())
    }

    fn move_file(&mut self, src: &Path, dst: &Path) -> Result<(), SyncError> {
        std::fs::symlink_metadata(src).map_err(|e| io_err(src, e))?;
        Self::prepare_target(dst)?;
        std::fs::rename(src, dst).map_err(|e| io_err(dst, e))?;
        tracing::info!("moved: {} -> {}", src.display(), dst.display());
        self.prune_empty_parents(src);
        Ok(())
    }

    fn delete(&mut self, path: &Path) -> Result<(), SyncError> {
        std::fs::remove_file(path).map_err(|e| io_err(path, e))?;
        tracing::info!("deleted: {}", path.display());
        self.prune_empty_parents(path);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingFileOps
// ---------------------------------------------------------------------------

/// Sink that appends every call to a list and never fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingFileOps {
    pub operations: Vec<FileOperation>,
}

impl RecordingFileOps {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileOperations for RecordingFileOps {
    fn copy(&mut self, src: &Path, dst: &Path) -> Result<(), SyncError> {
        self.operations.push(FileOperation::copy(src, dst));
        Ok(())
    }

    fn move_file(&mut self, src: &Path, dst: &Path) -> Result<(), SyncError> {
        self.operations.push(FileOperation::move_file(src, dst));
        Ok(())
    }

    fn delete(&mut self, path: &Path) -> Result<(), SyncError> {
        self.operations.push(FileOperation::delete(path));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn recording_keeps_call_order() {
        let mut ops = RecordingFileOps::new();
        ops.delete(Path::new("/d/x")).unwrap();
        ops.copy(Path::new("/s/a"), Path::new("/d/a")).unwrap();
        assert_eq!(
            ops.operations,
            vec![
                FileOperation::delete("/d/x"),
                FileOperation::copy("/s/a", "/d/a"),
            ]
        );
    }

    #[test]
    fn apply_dispatches_to_matching_method() {
        let mut ops = RecordingFileOps::new();
        let op = FileOperation::move_file("/d/a", "/d/b");
        ops.apply(&op).unwrap();
        assert_eq!(ops.operations, vec![op]);
    }

    #[test]
    fn copy_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("a.txt");
        fs::write(&src, "data").unwrap();
        let dst = tmp.path().join("out").join("nested").join("a.txt");

        FsFileOps::new(tmp.path()).copy(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "data");
        assert!(src.exists(), "copy must keep the source");
    }

    #[test]
    fn move_renames_within_destination() {
        let tmp = TempDir::new().unwrap();
        let old = tmp.path().join("old.txt");
        fs::write(&old, "data").unwrap();
        let new = tmp.path().join("renamed").join("new.txt");

        FsFileOps::new(tmp.path()).move_file(&old, &new).unwrap();
        assert!(!old.exists());
        assert_eq!(fs::read_to_string(&new).unwrap(), "data");
    }

    #[test]
    fn delete_of_missing_file_reports_path() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing.txt");
        let err = FsFileOps::new(tmp.path()).delete(&missing).unwrap_err();
        match err {
            SyncError::Io { path, .. } => assert_eq!(path, missing),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn delete_prunes_emptied_directories_but_not_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("dst");
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/b/c.txt"), "c").unwrap();

        FsFileOps::new(&root).delete(&root.join("a/b/c.txt")).unwrap();
        assert!(!root.join("a").exists());
        assert!(root.is_dir(), "root must survive pruning");
    }

    #[test]
    fn pruning_stops_at_a_directory_with_entries() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("a/b")).unwrap();
        fs::write(tmp.path().join("a/keep.txt"), "keep").unwrap();
        fs::write(tmp.path().join("a/b/moved.txt"), "m").unwrap();

        FsFileOps::new(tmp.path())
            .move_file(&tmp.path().join("a/b/moved.txt"), &tmp.path().join("moved.txt"))
            .unwrap();
        assert!(!tmp.path().join("a/b").exists());
        assert!(tmp.path().join("a/keep.txt").exists());
    }

    #[test]
    fn copy_replaces_an_empty_directory_of_the_same_name() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("x.src");
        fs::write(&src, "file").unwrap();
        let dst = tmp.path().join("x");
        fs::create_dir(&dst).unwrap();

        FsFileOps::new(tmp.path()).copy(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "file");
    }

    #[test]
    fn copy_onto_a_non_empty_directory_reports_the_destination() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("x.src");
        fs::write(&src, "file").unwrap();
        let dst = tmp.path().join("x");
        fs::create_dir(&dst).unwrap();
        fs::write(dst.join("inside"), "occupied").unwrap();

        let err = FsFileOps::new(tmp.path()).copy(&src, &dst).unwrap_err();
        match err {
            SyncError::Io { path, .. } => assert_eq!(path, dst),
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
