//! Subcommand implementations.

pub mod diff;
pub mod init;
pub mod status;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};

use hammock_core::{config, Config, DocName};
use hammock_sync::{CouchStore, SyncScope};

/// Designs root and the store a command talks to.
pub(crate) struct Workspace {
    pub designs: PathBuf,
    pub store: CouchStore,
}

/// Load `~/.hammock/config.yaml` and resolve the designs root.
///
/// `--designs` wins over the config file.
pub(crate) fn resolve(designs: Option<PathBuf>) -> Result<Workspace> {
    let config: Config =
        config::load().context("failed to load config; run `hammock init` first")?;
    let designs = designs.unwrap_or_else(|| config.designs.clone());
    Ok(Workspace {
        designs,
        store: CouchStore::from_config(&config),
    })
}

pub(crate) fn scope(document: Option<String>) -> SyncScope {
    match document {
        Some(name) => SyncScope::Document(DocName::from(name)),
        None => SyncScope::All,
    }
}
