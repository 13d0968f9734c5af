//! `hammock diff`: show unified diffs for what sync would write.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use hammock_sync::diff;

use super::{resolve, scope};

/// Arguments for `hammock diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Diff only this design document.
    pub document: Option<String>,

    /// Designs root; defaults to the `designs` entry of the config.
    #[arg(long)]
    pub designs: Option<PathBuf>,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let mut workspace = resolve(self.designs)?;

        let docs = diff(&workspace.designs, &mut workspace.store, &scope(self.document))
            .with_context(|| format!("diff failed for '{}'", workspace.designs.display()))?;

        if docs.is_empty() {
            println!("No differences.");
            return Ok(());
        }

        for doc in docs {
            for function in doc.diffs {
                print!("{}", function.unified_diff);
                if !function.unified_diff.ends_with('\n') {
                    println!();
                }
            }
        }

        Ok(())
    }
}
