//! `hammock sync`: push changed design documents.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use hammock_sync::{sync_with, DocumentReport, Outcome, SyncOptions, SyncReport};

use super::{resolve, scope};

/// Arguments for `hammock sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Sync only this design document (directory name under the designs root).
    pub document: Option<String>,

    /// Designs root; defaults to the `designs` entry of the config.
    #[arg(long)]
    pub designs: Option<PathBuf>,

    /// Show what would change without writing to the database.
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let mut workspace = resolve(self.designs)?;
        let options = SyncOptions {
            scope: scope(self.document),
            dry_run: self.dry_run,
        };

        match sync_with(&workspace.designs, &mut workspace.store, &options) {
            Ok(report) => {
                print_report(&report, self.dry_run);
                Ok(())
            }
            Err(aborted) => {
                print_report(&aborted.report, self.dry_run);
                let done = aborted.report.documents.len();
                Err(aborted.error).with_context(|| {
                    format!(
                        "sync of {} aborted after {done} document(s)",
                        workspace.designs.display()
                    )
                })
            }
        }
    }
}

fn print_report(report: &SyncReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    for doc in &report.documents {
        print_document(doc, prefix);
    }

    let written = report.written();
    let verb = if dry_run { "would be written" } else { "written" };
    println!(
        "{prefix}{} document(s) checked, {written} {verb}",
        report.documents.len()
    );
}

fn print_document(doc: &DocumentReport, prefix: &str) {
    match &doc.outcome {
        Outcome::Unchanged => {
            println!("{prefix}{} {} up to date", "·".bright_black(), doc.id);
            return;
        }
        Outcome::Persisted { rev } => {
            let action = if doc.created { "created" } else { "updated" };
            let rev = rev.as_deref().unwrap_or("?");
            println!("{prefix}{} {} {action} (rev {rev})", "✓".green().bold(), doc.id);
        }
        Outcome::WouldPersist => {
            let action = if doc.created { "would be created" } else { "would be updated" };
            println!("{prefix}{} {} {action}", "~".yellow().bold(), doc.id);
        }
    }
    for change in &doc.changes {
        println!("  {change}");
    }
}
