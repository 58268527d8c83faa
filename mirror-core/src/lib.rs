//! Mirror core library — domain types, profile registry, errors.
//!
//! Public API surface:
//! - [`types`]: fingerprints, file indexes, file operations, profiles
//! - [`error`]: [`RegistryError`]
//! - [`registry`]: load / save / add / remove profiles

pub mod error;
pub mod registry;
pub mod types;

pub use error::RegistryError;
pub use types::{FileIndex, FileOperation, Fingerprint, Profile, ProfileName};
