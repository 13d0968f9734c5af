//! hammock core library: design document model, disk loader, reconciliation.
//!
//! - [`types`]: design documents, views, function groups
//! - [`loader`]: build a [`DesignCollection`] from a designs root
//! - [`reconcile`]: merge a desired document into a current one
//! - [`config`]: connection settings in `~/.hammock/config.yaml`
//! - [`error`]: [`LoadError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod loader;
pub mod reconcile;
pub mod types;

pub use config::Config;
pub use error::{ConfigError, LoadError};
pub use loader::load_collection;
pub use reconcile::{
    reconcile, Change, ChangeKind, FunctionChange, Reconciliation, ViewChange,
};
pub use types::{
    DesignCollection, DesignDocument, DocId, DocName, FunctionGroup, Functions, View, Views,
};
