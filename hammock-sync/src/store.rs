//! Remote store seam.
//!
//! The orchestrator only needs two calls: fetch a design document by id and
//! write one back. [`crate::couch::CouchStore`] speaks HTTP to a CouchDB
//! server; [`MemoryStore`] keeps everything in a map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use hammock_core::{DesignDocument, DocId};

use crate::error::StoreError;

/// Body of a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Revision assigned by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
}

/// A store holding design documents.
pub trait DesignStore {
    /// Fetch the document with `id`. `Ok(None)` means it does not exist.
    fn get(&mut self, id: &DocId) -> Result<Option<DesignDocument>, StoreError>;

    /// Write `doc` under `id`. `doc.rev` must match the stored revision.
    fn put(&mut self, id: &DocId, doc: &DesignDocument) -> Result<PutResponse, StoreError>;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process store with revision checking.
///
/// Revisions are `<n>-hammock`, bumped on every write. A write whose `rev`
/// does not match the stored one fails with [`StoreError::Conflict`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: BTreeMap<DocId, DesignDocument>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document as if it had already been written once.
    pub fn insert(&mut self, mut doc: DesignDocument) -> String {
        let rev = next_rev(doc.rev.as_deref());
        doc.rev = Some(rev.clone());
        self.docs.insert(doc.id.clone(), doc);
        rev
    }

    pub fn document(&self, id: &DocId) -> Option<&DesignDocument> {
        self.docs.get(id)
    }

    /// Number of successful `put` calls.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl DesignStore for MemoryStore {
    fn get(&mut self, id: &DocId) -> Result<Option<DesignDocument>, StoreError> {
        Ok(self.docs.get(id).cloned())
    }

    fn put(&mut self, id: &DocId, doc: &DesignDocument) -> Result<PutResponse, StoreError> {
        let stored_rev = self.docs.get(id).and_then(|d| d.rev.clone());
        if stored_rev != doc.rev {
            return Err(StoreError::Conflict { id: id.clone() });
        }

        let rev = next_rev(stored_rev.as_deref());
        let mut stored = doc.clone();
        stored.id = id.clone();
        stored.rev = Some(rev.clone());
        self.docs.insert(id.clone(), stored);
        self.writes += 1;

        Ok(PutResponse {
            ok: true,
            id: Some(id.to_string()),
            rev: Some(rev),
        })
    }
}

fn next_rev(current: Option<&str>) -> String {
    let generation = current
        .and_then(|rev| rev.split_once('-'))
        .and_then(|(n, _)| n.parse::<u64>().ok())
        .unwrap_or(0);
    format!("{}-hammock", generation + 1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
