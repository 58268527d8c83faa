//! `mirror sync` — reconcile a destination directory to its source.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use mirror_core::types::FileOperation;
use mirror_sync::{
    pipeline::{self, SyncScope},
    sync_paths, SyncOptions, SyncReport,
};

use super::home_dir;

/// Arguments for `mirror sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Directory to mirror (omit when using `--profile` or `--all`).
    #[arg(requires = "dest")]
    pub source: Option<PathBuf>,

    /// Directory made to match the source. Created if missing.
    pub dest: Option<PathBuf>,

    /// Sync a saved profile instead of explicit paths.
    #[arg(long, conflicts_with_all = ["source", "all"])]
    pub profile: Option<String>,

    /// Sync every saved profile.
    #[arg(long, conflicts_with = "source")]
    pub all: bool,

    /// Relative path prefix to leave alone on both sides (repeatable).
    #[arg(long, value_name = "PREFIX", conflicts_with_all = ["profile", "all"])]
    pub exclude: Vec<String>,

    /// Show what would change without touching any files.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let options = SyncOptions {
            dry_run: self.dry_run,
        };

        if self.all || self.profile.is_some() {
            let home = home_dir()?;
            let scope = match self.profile.clone() {
                Some(name) => SyncScope::Profile(name),
                None => SyncScope::All,
            };
            let results = pipeline::run(&home, scope, options).context("profile sync failed")?;

            if self.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&results).context("failed to serialize sync JSON")?
                );
                return Ok(());
            }
            if results.is_empty() {
                println!("No profiles saved. Run `mirror profile add` first.");
            }
            for r in &results {
                print_report(&r.profile.0, &r.report);
            }
            return Ok(());
        }

        let (Some(source), Some(dest)) = (self.source, self.dest) else {
            anyhow::bail!("provide <SOURCE> <DEST>, --profile <NAME>, or --all");
        };
        let report = sync_paths(&source, &dest, &self.exclude, options).with_context(|| {
            format!("sync failed for '{}' -> '{}'", source.display(), dest.display())
        })?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize sync JSON")?
            );
            return Ok(());
        }
        print_report(&dest.display().to_string(), &report);
        Ok(())
    }
}

pub(crate) fn print_report(label: &str, report: &SyncReport) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };

    if report.is_noop() {
        println!("{prefix}✓ '{label}' — already in sync");
        return;
    }

    let count = |verb: &str| {
        report
            .operations
            .iter()
            .filter(|op| op.verb() == verb)
            .count()
    };
    println!(
        "{prefix}✓ '{label}' {} ({} copied, {} moved, {} deleted)",
        if report.dry_run { "planned" } else { "synced" },
        count("copy"),
        count("move"),
        count("delete"),
    );

    for op in &report.operations {
        print_operation(op);
    }
}

fn print_operation(op: &FileOperation) {
    match op {
        FileOperation::Copy { to, .. } => println!("  {}  {}", "+".green(), to.display()),
        FileOperation::Move { from, to } => println!(
            "  {}  {} -> {}",
            "~".yellow(),
            from.display(),
            to.display()
        ),
        FileOperation::Delete { path } => println!("  {}  {}", "-".red(), path.display()),
    }
}
