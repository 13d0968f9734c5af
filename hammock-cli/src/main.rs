//! hammock: keep CouchDB design documents in sync with a designs tree.
//!
//! # Usage
//!
//! ```text
//! hammock init --url <url> --database <db> [--username u --password p] [--designs dir] [--force]
//! hammock sync [<document>] [--designs dir] [--dry-run]
//! hammock diff [<document>] [--designs dir]
//! hammock status [--designs dir] [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{diff::DiffArgs, init::InitArgs, status::StatusArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "hammock",
    version,
    about = "Push view, show, list, update, filter and validate functions to CouchDB",
    long_about = None,
)]
struct Cli {
    /// Log progress to stderr (RUST_LOG overrides).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write ~/.hammock/config.yaml.
    Init(InitArgs),

    /// Push changed design documents to the database.
    Sync(SyncArgs),

    /// Show unified diffs of the functions sync would change.
    Diff(DiffArgs),

    /// Show which design documents are out of date.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Sync(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let env = env_logger::Env::default().default_filter_or(default);
    let _ = env_logger::Builder::from_env(env)
        .format_target(false)
        .try_init();
}
