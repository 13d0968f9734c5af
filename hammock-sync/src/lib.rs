//! # hammock-sync
//!
//! Pushes design documents from a designs tree on disk to a remote store.
//!
//! Call [`sync`] with a designs root and any [`DesignStore`] (for example
//! [`CouchStore`] or [`MemoryStore`]). [`plan`] does the same without
//! writing, and [`diff`] renders unified diffs of the function bodies that
//! would change.

pub mod couch;
pub mod diff;
pub mod error;
pub mod pipeline;
pub mod store;

pub use couch::CouchStore;
pub use diff::{diff, DocumentDiff, FunctionDiff};
pub use error::{StoreError, SyncAborted, SyncError};
pub use pipeline::{
    plan, sync, sync_collection, sync_with, DocumentReport, Outcome, SyncOptions, SyncReport,
    SyncScope,
};
pub use store::{DesignStore, MemoryStore, PutResponse};
