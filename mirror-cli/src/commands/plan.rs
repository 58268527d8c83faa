//! `mirror plan <source> <dest>`: show the operations sync would apply.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use mirror_sync::{sync_paths, SyncOptions};

use super::sync::print_report;

/// Arguments for `mirror plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Directory to mirror.
    pub source: PathBuf,

    /// Directory that would be made to match the source.
    pub dest: PathBuf,

    /// Relative path prefix to leave alone on both sides (repeatable).
    #[arg(long, value_name = "PREFIX")]
    pub exclude: Vec<String>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl PlanArgs {
    pub fn run(self) -> Result<()> {
        let report = sync_paths(
            &self.source,
            &self.dest,
            &self.exclude,
            SyncOptions { dry_run: true },
        )
        .with_context(|| {
            format!(
                "plan failed for '{}' -> '{}'",
                self.source.display(),
                self.dest.display()
            )
        })?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize plan JSON")?
            );
            return Ok(());
        }

        println!(
            "source: {} file(s) | destination: {} file(s)",
            report.source_files, report.dest_files
        );
        print_report(&self.dest.display().to_string(), &report);
        Ok(())
    }
}
