//! Domain types for Mirror.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! None of these types know how they are read from disk or persisted.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Opaque content hash. Two files with equal fingerprints have the same content,
/// whatever they are called.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub String);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Fingerprint {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Fingerprint {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed name for a saved sync profile.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileName(pub String);

impl fmt::Display for ProfileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProfileName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProfileName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// FileIndex
// ---------------------------------------------------------------------------

/// Snapshot of one root location: each fingerprint maps to exactly one
/// filename, relative to that root.
///
/// Iteration is ordered by fingerprint so that operation lists built from an
/// index are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileIndex(BTreeMap<Fingerprint, PathBuf>);

impl FileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name` under `fingerprint`, returning the filename it replaced.
    pub fn insert(
        &mut self,
        fingerprint: impl Into<Fingerprint>,
        name: impl Into<PathBuf>,
    ) -> Option<PathBuf> {
        self.0.insert(fingerprint.into(), name.into())
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&Path> {
        self.0.get(fingerprint).map(PathBuf::as_path)
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.0.contains_key(fingerprint)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Fingerprint, &Path)> {
        self.0.iter().map(|(fp, name)| (fp, name.as_path()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<F, P> FromIterator<(F, P)> for FileIndex
where
    F: Into<Fingerprint>,
    P: Into<PathBuf>,
{
    fn from_iter<I: IntoIterator<Item = (F, P)>>(iter: I) -> Self {
        let mut index = Self::new();
        for (fp, name) in iter {
            index.insert(fp, name);
        }
        index
    }
}

// ---------------------------------------------------------------------------
// FileOperation
// ---------------------------------------------------------------------------

/// A single filesystem change needed to bring a destination in line with
/// its source. Paths are full paths (root joined with filename).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum FileOperation {
    /// Content exists only in the source.
    Copy { from: PathBuf, to: PathBuf },
    /// Content exists in the destination under another name.
    Move { from: PathBuf, to: PathBuf },
    /// Content no longer exists in the source.
    Delete { path: PathBuf },
}

impl FileOperation {
    pub fn copy(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self::Copy {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn move_file(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self::Move {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn delete(path: impl Into<PathBuf>) -> Self {
        Self::Delete { path: path.into() }
    }

    /// The path this operation writes to, if any. Deletes write nothing.
    pub fn target(&self) -> Option<&Path> {
        match self {
            Self::Copy { to, .. } | Self::Move { to, .. } => Some(to),
            Self::Delete { .. } => None,
        }
    }

    /// Short lowercase verb, matching the serialized `op` tag.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Copy { .. } => "copy",
            Self::Move { .. } => "move",
            Self::Delete { .. } => "delete",
        }
    }
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy { from, to } | Self::Move { from, to } => {
                write!(f, "{} {} -> {}", self.verb(), from.display(), to.display())
            }
            Self::Delete { path } => write!(f, "delete {}", path.display()),
        }
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// A saved source → destination pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: ProfileName,
    /// Directory whose contents are mirrored.
    pub source: PathBuf,
    /// Directory made to match `source`.
    pub dest: PathBuf,
    /// Relative path prefixes skipped on both sides.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
