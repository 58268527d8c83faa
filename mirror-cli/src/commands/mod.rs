//! Subcommand implementations.

pub mod plan;
pub mod profile;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};

pub(crate) fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}
