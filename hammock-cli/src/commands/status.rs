//! `hammock status`: which design documents differ from the database.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use hammock_sync::{plan, DocumentReport, Outcome, SyncReport};

use super::resolve;

/// Arguments for `hammock status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Designs root; defaults to the `designs` entry of the config.
    #[arg(long)]
    pub designs: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let mut workspace = resolve(self.designs)?;
        let report = plan(&workspace.designs, &mut workspace.store).map_err(|aborted| {
            anyhow::Error::new(aborted.error)
                .context(format!("status check failed for '{}'", workspace.designs.display()))
        })?;

        if self.json {
            return print_json(&report);
        }
        print_table(&report);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    New,
    OutOfDate,
    Current,
}

impl State {
    fn of(doc: &DocumentReport) -> Self {
        match (&doc.outcome, doc.created) {
            (Outcome::Unchanged, _) => State::Current,
            (_, true) => State::New,
            (_, false) => State::OutOfDate,
        }
    }

    fn key(self) -> &'static str {
        match self {
            State::New => "new",
            State::OutOfDate => "out_of_date",
            State::Current => "current",
        }
    }

    fn label(self) -> String {
        match self {
            State::New => "NEW".cyan().bold().to_string(),
            State::OutOfDate => "OUT OF DATE".yellow().bold().to_string(),
            State::Current => "CURRENT".green().to_string(),
        }
    }
}

#[derive(Serialize)]
struct StatusJson {
    documents: Vec<DocumentJson>,
}

#[derive(Serialize)]
struct DocumentJson {
    id: String,
    status: &'static str,
    changes: Vec<String>,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "document")]
    document: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "changes")]
    changes: usize,
}

fn print_json(report: &SyncReport) -> Result<()> {
    let payload = StatusJson {
        documents: report
            .documents
            .iter()
            .map(|doc| DocumentJson {
                id: doc.id.to_string(),
                status: State::of(doc).key(),
                changes: doc.changes.iter().map(ToString::to_string).collect(),
            })
            .collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(report: &SyncReport) {
    if report.documents.is_empty() {
        println!("No design documents found.");
        return;
    }

    let pending = report
        .documents
        .iter()
        .filter(|doc| State::of(doc) != State::Current)
        .count();
    println!(
        "hammock v{} | {} documents | {} need sync",
        env!("CARGO_PKG_VERSION"),
        report.documents.len(),
        pending,
    );

    let rows: Vec<StatusTableRow> = report
        .documents
        .iter()
        .map(|doc| StatusTableRow {
            document: doc.id.to_string(),
            status: State::of(doc).label(),
            changes: doc.changes.len(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if pending > 0 {
        println!("Run 'hammock diff' to inspect or 'hammock sync' to push.");
    }
}

#[cfg(test)]
mod tests {
    use hammock_core::DocId;

    use super::*;

    fn report(outcome: Outcome, created: bool) -> DocumentReport {
        DocumentReport {
            id: DocId::from("_design/app"),
            created,
            changes: Vec::new(),
            outcome,
        }
    }

    #[test]
    fn state_follows_outcome_and_creation() {
        assert_eq!(State::of(&report(Outcome::Unchanged, false)), State::Current);
        assert_eq!(State::of(&report(Outcome::WouldPersist, true)), State::New);
        assert_eq!(State::of(&report(Outcome::WouldPersist, false)), State::OutOfDate);
    }
}
