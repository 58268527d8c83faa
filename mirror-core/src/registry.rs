//! Per-profile YAML registry.
//!
//! # Storage layout
//!
//! ```text
//! ~/.mirror/
//!   profiles/              (mode 0700, created on first save)
//!     <profile_name>.yaml  (one file per profile, mode 0600)
//! ```
//!
//! # API pattern
//!
//! Every function that touches disk has two forms:
//! - `fn_at(home: &Path, …)`: explicit home, used in tests with `TempDir`
//! - `fn(…)`: home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::RegistryError;
use crate::types::{Profile, ProfileName};

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.mirror/profiles/`. Pure, no I/O.
pub fn profiles_dir_at(home: &Path) -> PathBuf {
    home.join(".mirror").join("profiles")
}

/// `<home>/.mirror/profiles/<name>.yaml`. Pure, no I/O.
pub fn profile_path_at(home: &Path, name: &ProfileName) -> PathBuf {
    profiles_dir_at(home).join(format!("{}.yaml", name.0))
}

/// Reject names that would escape the profiles directory or hide the file.
pub fn validate_name(name: &ProfileName) -> Result<(), RegistryError> {
    let invalid = |reason| RegistryError::InvalidName {
        name: name.0.clone(),
        reason,
    };
    if name.0.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.0.contains(['/', '\\']) {
        return Err(invalid("name contains a path separator"));
    }
    if name.0.starts_with('.') {
        return Err(invalid("name starts with '.'"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load a single profile from `<home>/.mirror/profiles/<name>.yaml`.
///
/// Returns `RegistryError::ProfileNotFound` if absent,
/// `RegistryError::Parse` (with path + line context) if malformed YAML.
pub fn load_profile_at(home: &Path, name: &ProfileName) -> Result<Profile, RegistryError> {
    validate_name(name)?;
    let path = profile_path_at(home, name);
    if !path.exists() {
        return Err(RegistryError::ProfileNotFound {
            name: name.0.clone(),
            path,
        });
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|e| RegistryError::Parse { path, source: e })
}

/// `load_profile_at` convenience wrapper.
pub fn load_profile(name: &ProfileName) -> Result<Profile, RegistryError> {
    load_profile_at(&home()?, name)
}

/// Read every `<home>/.mirror/profiles/*.yaml`, sorted by profile name.
///
/// Leftover `.yaml.tmp` files from an interrupted save are ignored.
pub fn list_profiles_at(home: &Path) -> Result<Vec<Profile>, RegistryError> {
    let dir = profiles_dir_at(home);
    if !dir.exists() {
        return Ok(vec![]);
    }

    let mut entries: Vec<_> = std::fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .collect();
    entries.sort_by_key(|e| e.file_name());

    let mut result = Vec::new();
    for entry in entries {
        let fname = entry.file_name();
        if !fname.to_string_lossy().ends_with(".yaml") {
            continue;
        }
        let contents = std::fs::read_to_string(entry.path())?;
        let profile: Profile = serde_yaml::from_str(&contents).map_err(|e| {
            RegistryError::Parse { path: entry.path(), source: e }
        })?;
        result.push(profile);
    }
    result.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(result)
}

/// `list_profiles_at` convenience wrapper.
pub fn list_profiles() -> Result<Vec<Profile>, RegistryError> {
    list_profiles_at(&home()?)
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save a profile to `<home>/.mirror/profiles/<name>.yaml`.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
/// `.tmp` lives next to the target so the rename never crosses filesystems.
pub fn save_profile_at(home: &Path, profile: &Profile) -> Result<(), RegistryError> {
    validate_name(&profile.name)?;
    ensure_profiles_dir(home)?;
    let path = profile_path_at(home, &profile.name);
    let tmp_path = path.with_file_name(format!("{}.yaml.tmp", profile.name.0));

    let yaml = serde_yaml::to_string(profile)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(())
}

/// `save_profile_at` convenience wrapper.
pub fn save_profile(profile: &Profile) -> Result<(), RegistryError> {
    save_profile_at(&home()?, profile)
}

// ---------------------------------------------------------------------------
// 4. Add / remove
// ---------------------------------------------------------------------------

/// Create and save a new profile.
///
/// Returns `RegistryError::ProfileExists` if a profile with that name is
/// already saved; existing profiles are never overwritten by `add`.
pub fn add_profile_at(
    home: &Path,
    name: ProfileName,
    source: PathBuf,
    dest: PathBuf,
    exclude: Vec<String>,
) -> Result<Profile, RegistryError> {
    validate_name(&name)?;
    if profile_path_at(home, &name).exists() {
        return Err(RegistryError::ProfileExists { name: name.0 });
    }

    let now = Utc::now();
    let profile = Profile {
        name,
        source,
        dest,
        exclude,
        created_at: now,
        updated_at: now,
    };
    save_profile_at(home, &profile)?;
    Ok(profile)
}

/// `add_profile_at` convenience wrapper.
pub fn add_profile(
    name: ProfileName,
    source: PathBuf,
    dest: PathBuf,
    exclude: Vec<String>,
) -> Result<Profile, RegistryError> {
    add_profile_at(&home()?, name, source, dest, exclude)
}

/// Delete the saved profile file. The directories it names are not touched.
pub fn remove_profile_at(home: &Path, name: &ProfileName) -> Result<(), RegistryError> {
    validate_name(name)?;
    let path = profile_path_at(home, name);
    if !path.exists() {
        return Err(RegistryError::ProfileNotFound {
            name: name.0.clone(),
            path,
        });
    }
    std::fs::remove_file(&path)?;
    Ok(())
}

/// `remove_profile_at` convenience wrapper.
pub fn remove_profile(name: &ProfileName) -> Result<(), RegistryError> {
    remove_profile_at(&home()?, name)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, RegistryError> {
    dirs::home_dir().ok_or(RegistryError::HomeNotFound)
}

fn ensure_profiles_dir(home: &Path) -> Result<PathBuf, RegistryError> {
    let dir = profiles_dir_at(home);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
        set_dir_permissions(&dir)?;
    }
    Ok(dir)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), RegistryError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), RegistryError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), RegistryError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), RegistryError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
