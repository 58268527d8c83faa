//! `mirror profile add|list|remove`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tabled::{settings::Style, Table, Tabled};

use mirror_core::{registry, types::ProfileName};

use super::home_dir;

/// Manage saved source/destination profiles.
#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Save a new named source/destination pair.
    Add(AddArgs),

    /// List saved profiles.
    List {
        /// Emit machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Forget a saved profile. Neither directory is touched.
    Remove {
        /// Profile name.
        name: String,
    },
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Profile name (e.g. "photos", "dotfiles").
    pub name: String,

    /// Directory to mirror. Must exist.
    pub source: PathBuf,

    /// Directory made to match the source. Need not exist yet.
    pub dest: PathBuf,

    /// Relative path prefix to leave alone on both sides (repeatable).
    #[arg(long, value_name = "PREFIX")]
    pub exclude: Vec<String>,
}

pub fn run(cmd: ProfileCommand) -> Result<()> {
    let home = home_dir()?;
    match cmd {
        ProfileCommand::Add(args) => add(&home, args),
        ProfileCommand::List { json } => list(&home, json),
        ProfileCommand::Remove { name } => remove(&home, &name),
    }
}

fn add(home: &Path, args: AddArgs) -> Result<()> {
    let source = args
        .source
        .canonicalize()
        .with_context(|| format!("cannot resolve source '{}'", args.source.display()))?;
    let dest = absolute(&args.dest)?;

    let profile = registry::add_profile_at(
        home,
        ProfileName::from(args.name.clone()),
        source,
        dest,
        args.exclude,
    )
    .with_context(|| format!("failed to add profile '{}'", args.name))?;

    println!(
        "✓ Added profile '{}' ({} -> {})",
        profile.name,
        profile.source.display(),
        profile.dest.display()
    );
    Ok(())
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "profile")]
    name: String,
    #[tabled(rename = "source")]
    source: String,
    #[tabled(rename = "destination")]
    dest: String,
    #[tabled(rename = "exclude")]
    exclude: String,
}

fn list(home: &Path, json: bool) -> Result<()> {
    let profiles = registry::list_profiles_at(home).context("failed to load profiles")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&profiles).context("failed to serialize profile JSON")?
        );
        return Ok(());
    }

    if profiles.is_empty() {
        println!("No profiles saved.");
        println!("Run: mirror profile add <name> <source> <dest>");
        return Ok(());
    }

    let rows: Vec<ProfileRow> = profiles
        .into_iter()
        .map(|p| ProfileRow {
            name: p.name.0,
            source: p.source.display().to_string(),
            dest: p.dest.display().to_string(),
            exclude: p.exclude.join(", "),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

fn remove(home: &Path, name: &str) -> Result<()> {
    registry::remove_profile_at(home, &ProfileName::from(name))
        .with_context(|| format!("failed to remove profile '{name}'"))?;
    println!("✓ Removed profile '{name}'");
    Ok(())
}

/// Absolute form of `path` without requiring it to exist.
fn absolute(path: &Path) -> Result<PathBuf> {
    if let Ok(resolved) = path.canonicalize() {
        return Ok(resolved);
    }
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("could not determine current directory")?;
    Ok(cwd.join(path))
}
