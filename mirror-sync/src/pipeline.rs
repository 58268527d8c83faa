//! Shared sync pipeline entrypoint used by the CLI.
//!
//! [`sync`] is the collaborator-injected form: it reads both roots through
//! an [`IndexReader`], reconciles, schedules, and applies through a
//! [`FileOperations`] sink. [`sync_paths`] and [`run`] wire in the real
//! filesystem and the profile registry.

use std::path::{Path, PathBuf};

use serde::Serialize;

use mirror_core::{
    registry,
    types::{FileOperation, Profile, ProfileName},
};

use crate::{
    error::io_err,
    fileops::{FileOperations, FsFileOps},
    reader::{FsReader, IndexReader},
    reconcile::reconcile,
    schedule::schedule,
    SyncError,
};

/// Knobs for a single sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Compute and schedule operations without applying any of them.
    pub dry_run: bool,
}

/// Outcome of one source → destination run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub source_files: usize,
    pub dest_files: usize,
    /// Operations in the order they were (or would be) applied.
    pub operations: Vec<FileOperation>,
    pub dry_run: bool,
}

impl SyncReport {
    /// `true` when the destination already mirrored the source.
    pub fn is_noop(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Reconcile `dest_root` to `source_root` using injected collaborators.
///
/// Both roots are read once, source first. Collisions are detected before
/// any operation is applied. The first failing operation aborts the run and
/// its error is returned unchanged; earlier operations are not rolled back.
pub fn sync<R, F>(
    reader: &R,
    fileops: &mut F,
    source_root: &Path,
    dest_root: &Path,
    options: SyncOptions,
) -> Result<SyncReport, SyncError>
where
    R: IndexReader + ?Sized,
    F: FileOperations + ?Sized,
{
    let source = reader.read(source_root)?;
    let dest = reader.read(dest_root)?;

    let ops = reconcile(&source, &dest, source_root, dest_root);
    let operations = schedule(ops, &dest, dest_root)?;

    if options.dry_run {
        for op in &operations {
            tracing::info!("[dry-run] would {op}");
        }
    } else {
        for op in &operations {
            fileops.apply(op)?;
        }
    }

    if operations.is_empty() {
        tracing::debug!("in sync: {} -> {}", source_root.display(), dest_root.display());
    }

    Ok(SyncReport {
        source: source_root.to_path_buf(),
        dest: dest_root.to_path_buf(),
        source_files: source.len(),
        dest_files: dest.len(),
        operations,
        dry_run: options.dry_run,
    })
}

/// Mirror `source` into `dest` on the real filesystem.
///
/// `source` must be an existing directory. A missing `dest` is treated as
/// empty and created by the first copy. `exclude` holds path prefixes,
/// relative to each root, that are left out of both indexes. When one root
/// lies inside the other (after resolving symlinks, `.` and `..`), the inner
/// root is left out of the outer root's index, so the source is never read
/// back as destination content.
pub fn sync_paths(
    source: &Path,
    dest: &Path,
    exclude: &[String],
    options: SyncOptions,
) -> Result<SyncReport, SyncError> {
    let meta = std::fs::metadata(source).map_err(|e| io_err(source, e))?;
    if !meta.is_dir() {
        return Err(SyncError::NotADirectory {
            path: source.to_path_buf(),
        });
    }

    let mut reader = FsReader::new()
        .with_exclude(exclude.iter().map(PathBuf::from))
        .allow_missing_root(true);

    let (source_real, dest_real) = (resolve_root(source)?, resolve_root(dest)?);
    if let Ok(nested) = dest_real.strip_prefix(&source_real) {
        if !nested.as_os_str().is_empty() {
            tracing::debug!("destination nested in source, skipping {}", nested.display());
            reader = reader.with_exclude_under(source, nested);
        }
    } else if let Ok(nested) = source_real.strip_prefix(&dest_real) {
        tracing::debug!("source nested in destination, skipping {}", nested.display());
        reader = reader.with_exclude_under(dest, nested);
    }

    sync(&reader, &mut FsFileOps::new(dest), source, dest, options)
}

/// Canonical form of `path`. A path that does not exist yet resolves through
/// its nearest existing ancestor.
fn resolve_root(path: &Path) -> Result<PathBuf, SyncError> {
    match std::fs::canonicalize(path) {
        Ok(real) => Ok(real),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            match (path.parent(), path.file_name()) {
                (Some(parent), Some(name)) => {
                    let parent = if parent.as_os_str().is_empty() {
                        Path::new(".")
                    } else {
                        parent
                    };
                    Ok(resolve_root(parent)?.join(name))
                }
                _ => Err(io_err(path, err)),
            }
        }
        Err(err) => Err(io_err(path, err)),
    }
}

/// Mirror the pair described by a saved profile.
pub fn sync_profile(profile: &Profile, options: SyncOptions) -> Result<SyncReport, SyncError> {
    tracing::debug!("syncing profile '{}'", profile.name);
    sync_paths(&profile.source, &profile.dest, &profile.exclude, options)
}

// ---------------------------------------------------------------------------
// Profile-scoped runs
// ---------------------------------------------------------------------------

/// Scope for a profile pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncScope {
    /// Sync every saved profile.
    All,
    /// Sync a single named profile.
    Profile(String),
}

/// Outcome of syncing one saved profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSyncResult {
    pub profile: ProfileName,
    pub report: SyncReport,
}

/// Run the sync pipeline for a scope, with profiles read from `home`.
///
/// Profiles are processed in name order; the first failure stops the run.
pub fn run(
    home: &Path,
    scope: SyncScope,
    options: SyncOptions,
) -> Result<Vec<ProfileSyncResult>, SyncError> {
    let profiles = match scope {
        SyncScope::All => registry::list_profiles_at(home)?,
        SyncScope::Profile(name) => vec![registry::load_profile_at(home, &ProfileName::from(name))?],
    };

    let mut results = Vec::with_capacity(profiles.len());
    for profile in profiles {
        let report = sync_profile(&profile, options)?;
        results.push(ProfileSyncResult {
            profile: profile.name,
            report,
        });
    }
    Ok(results)
}
