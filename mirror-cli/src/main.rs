//! Mirror — one-way directory synchronization CLI.
//!
//! # Usage
//!
//! ```text
//! mirror sync <source> <dest> [--exclude <prefix>...] [--dry-run] [--json]
//! mirror sync --profile <name> [--dry-run] [--json]
//! mirror sync --all [--dry-run] [--json]
//! mirror plan <source> <dest> [--exclude <prefix>...] [--json]
//! mirror profile add <name> <source> <dest> [--exclude <prefix>...]
//! mirror profile list [--json]
//! mirror profile remove <name>
//! ```

mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use commands::{plan::PlanArgs, profile::ProfileCommand, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "mirror",
    version,
    about = "Make a destination directory mirror a source directory",
    long_about = None,
)]
struct Cli {
    /// Increase log output on stderr (-v info, -vv debug). RUST_LOG wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy, move and delete files so the destination matches the source.
    Sync(SyncArgs),

    /// Show what sync would do without touching either directory.
    Plan(PlanArgs),

    /// Manage saved source/destination profiles.
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Plan(args) => args.run(),
        Commands::Profile { command } => commands::profile::run(command),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env = env_logger::Env::default().default_filter_or(level);
    // Fails only if a logger is already installed; keep that one.
    let _ = env_logger::Builder::from_env(env)
        .format_target(false)
        .try_init();
    log::debug!("log level: {level}");
}
