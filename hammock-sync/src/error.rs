//! Error types for hammock-sync.

use thiserror::Error;

use hammock_core::{DocId, DocName, LoadError};

use crate::pipeline::SyncReport;

/// Failures talking to the remote store.
///
/// "Not found" is not an error; [`crate::DesignStore::get`] returns `Ok(None)`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection, DNS, TLS or similar failure before any HTTP status.
    #[error("transport error for {id}: {message}")]
    Transport { id: DocId, message: String },

    /// The store answered with a status hammock does not expect.
    #[error("unexpected HTTP status {status} for {id}: {body}")]
    Status { id: DocId, status: u16, body: String },

    /// The write carried a stale or missing revision.
    #[error("revision conflict writing {id}")]
    Conflict { id: DocId },

    /// The response body was not the expected JSON.
    #[error("failed to decode response for {id}: {source}")]
    Decode {
        id: DocId,
        #[source]
        source: std::io::Error,
    },
}

/// Everything that can stop a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The designs tree could not be read; nothing was sent.
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("fetching {id} failed: {source}")]
    Fetch {
        id: DocId,
        #[source]
        source: StoreError,
    },

    #[error("persisting {id} failed: {source}")]
    Persist {
        id: DocId,
        #[source]
        source: StoreError,
    },

    /// The store answered the write with `ok: false`.
    #[error("store rejected the write of {id}")]
    PersistRejected { id: DocId },

    /// A single-document run named a document that is not on disk.
    #[error("no design document named '{0}' under the designs root")]
    UnknownDocument(DocName),
}

/// A sync run that stopped early.
///
/// `report` holds every document completed before `error`.
#[derive(Debug, Error)]
#[error("sync aborted after {} document(s)", .report.documents.len())]
pub struct SyncAborted {
    pub report: SyncReport,
    #[source]
    pub error: SyncError,
}

impl SyncAborted {
    pub(crate) fn before_start(error: impl Into<SyncError>) -> Self {
        Self {
            report: SyncReport::default(),
            error: error.into(),
        }
    }
}
