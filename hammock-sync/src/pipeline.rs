//! Sync orchestration.
//!
//! For each document on disk, in name order:
//!
//! 1. Fetch the remote copy (`None` → start from an empty document).
//! 2. Reconcile it against the disk copy.
//! 3. If anything changed, stamp `mtime` and write it back with its revision.
//! 4. Record the document's changes in the report.
//!
//! The first fetch or write failure stops the run; the caller gets the report
//! for every document finished before it inside [`SyncAborted`].

use std::path::Path;

use chrono::Utc;

use hammock_core::{
    load_collection, reconcile, Change, DesignCollection, DesignDocument, DocId, DocName,
};

use crate::error::{StoreError, SyncAborted, SyncError};
use crate::store::DesignStore;

// ---------------------------------------------------------------------------
// Options and report
// ---------------------------------------------------------------------------

/// Which documents a run covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SyncScope {
    /// Every document under the designs root.
    #[default]
    All,
    /// A single named document.
    Document(DocName),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    pub scope: SyncScope,
    /// Reconcile and report, but never write.
    pub dry_run: bool,
}

impl SyncOptions {
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }
}

/// What happened to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Remote copy already matched the disk copy.
    Unchanged,
    /// Merged document was written; `rev` is the store's new revision.
    Persisted { rev: Option<String> },
    /// Dry run: the merged document would have been written.
    WouldPersist,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReport {
    pub id: DocId,
    /// The document did not exist on the remote before this run.
    pub created: bool,
    pub changes: Vec<Change>,
    pub outcome: Outcome,
}

/// Result of a sync run, one entry per processed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub documents: Vec<DocumentReport>,
}

impl SyncReport {
    /// The aggregate change log, in processing order.
    pub fn changes(&self) -> impl Iterator<Item = &Change> {
        self.documents.iter().flat_map(|d| d.changes.iter())
    }

    /// Rendered change log.
    pub fn messages(&self) -> Vec<String> {
        self.changes().map(ToString::to_string).collect()
    }

    /// Documents that were (or in a dry run, would be) written.
    pub fn written(&self) -> usize {
        self.documents
            .iter()
            .filter(|d| !matches!(d.outcome, Outcome::Unchanged))
            .count()
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Sync every design document under `root` into `store`.
pub fn sync<S: DesignStore + ?Sized>(root: &Path, store: &mut S) -> Result<SyncReport, SyncAborted> {
    sync_with(root, store, &SyncOptions::default())
}

/// Report what [`sync`] would do without writing anything.
pub fn plan<S: DesignStore + ?Sized>(root: &Path, store: &mut S) -> Result<SyncReport, SyncAborted> {
    sync_with(root, store, &SyncOptions::dry_run())
}

/// Load the designs tree under `root` and sync it with `options`.
///
/// A load failure aborts before any remote call.
pub fn sync_with<S: DesignStore + ?Sized>(
    root: &Path,
    store: &mut S,
    options: &SyncOptions,
) -> Result<SyncReport, SyncAborted> {
    let collection = load_collection(root).map_err(SyncAborted::before_start)?;
    sync_collection(&collection, store, options)
}

/// Sync an already loaded collection.
pub fn sync_collection<S: DesignStore + ?Sized>(
    collection: &DesignCollection,
    store: &mut S,
    options: &SyncOptions,
) -> Result<SyncReport, SyncAborted> {
    let selected = select(collection, &options.scope).map_err(SyncAborted::before_start)?;

    let mut report = SyncReport::default();
    for desired in selected {
        match sync_document(desired, store, options.dry_run) {
            Ok(doc_report) => report.documents.push(doc_report),
            Err(error) => return Err(SyncAborted { report, error }),
        }
    }
    Ok(report)
}

/// Fetch `id`, treating "not found" as an empty document.
///
/// Returns the document and whether it had to be created.
pub fn fetch_or_empty<S: DesignStore + ?Sized>(
    store: &mut S,
    id: &DocId,
) -> Result<(DesignDocument, bool), SyncError> {
    match store.get(id) {
        Ok(Some(doc)) => Ok((doc, false)),
        Ok(None) => Ok((DesignDocument::new(id.clone()), true)),
        Err(source) => Err(SyncError::Fetch {
            id: id.clone(),
            source,
        }),
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

pub(crate) fn select<'a>(
    collection: &'a DesignCollection,
    scope: &SyncScope,
) -> Result<Vec<&'a DesignDocument>, SyncError> {
    match scope {
        SyncScope::All => Ok(collection.iter().map(|(_, doc)| doc).collect()),
        SyncScope::Document(name) => collection
            .get(name)
            .map(|doc| vec![doc])
            .ok_or_else(|| SyncError::UnknownDocument(name.clone())),
    }
}

fn sync_document<S: DesignStore + ?Sized>(
    desired: &DesignDocument,
    store: &mut S,
    dry_run: bool,
) -> Result<DocumentReport, SyncError> {
    let id = desired.id.clone();
    let (mut current, created) = fetch_or_empty(store, &id)?;

    let result = reconcile(&mut current, desired);
    if !result.changed() {
        tracing::debug!("unchanged: {}", id);
        return Ok(DocumentReport {
            id,
            created,
            changes: result.changes,
            outcome: Outcome::Unchanged,
        });
    }

    if dry_run {
        tracing::info!("[dry-run] would update {} ({} change(s))", id, result.changes.len());
        return Ok(DocumentReport {
            id,
            created,
            changes: result.changes,
            outcome: Outcome::WouldPersist,
        });
    }

    current.mtime = Some(Utc::now());
    let response = store.put(&id, &current).map_err(|source| persist_err(&id, source))?;
    if !response.ok {
        return Err(SyncError::PersistRejected { id });
    }

    tracing::info!("updated {} ({} change(s))", id, result.changes.len());
    Ok(DocumentReport {
        id,
        created,
        changes: result.changes,
        outcome: Outcome::Persisted { rev: response.rev },
    })
}

fn persist_err(id: &DocId, source: StoreError) -> SyncError {
    SyncError::Persist {
        id: id.clone(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::fs;

    use hammock_core::{ChangeKind, FunctionChange, FunctionGroup, View, ViewChange};
    use tempfile::TempDir;

    use super::*;
    use crate::store::{MemoryStore, PutResponse};

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Store that fails every call for one id and forwards the rest.
    struct FailingStore {
        inner: MemoryStore,
        fail_get: Option<DocId>,
        fail_put: Option<DocId>,
        reject_put: bool,
    }

    impl FailingStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                fail_get: None,
                fail_put: None,
                reject_put: false,
            }
        }
    }

    impl DesignStore for FailingStore {
        fn get(&mut self, id: &DocId) -> Result<Option<DesignDocument>, StoreError> {
            if self.fail_get.as_ref() == Some(id) {
                return Err(StoreError::Transport {
                    id: id.clone(),
                    message: "connection reset".into(),
                });
            }
            self.inner.get(id)
        }

        fn put(&mut self, id: &DocId, doc: &DesignDocument) -> Result<PutResponse, StoreError> {
            if self.fail_put.as_ref() == Some(id) {
                return Err(StoreError::Conflict { id: id.clone() });
            }
            if self.reject_put {
                return Ok(PutResponse {
                    ok: false,
                    id: None,
                    rev: None,
                });
            }
            self.inner.put(id, doc)
        }
    }

    #[test]
    fn new_document_is_created() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "foo/views/bar/map.js", "m");
        let mut store = MemoryStore::new();

        let report = sync(tmp.path(), &mut store).expect("sync");
        assert_eq!(report.documents.len(), 1);
        assert!(report.documents[0].created);
        assert_eq!(
            report.documents[0].outcome,
            Outcome::Persisted {
                rev: Some("1-hammock".into())
            }
        );
        let stored = store.document(&DocId::from("_design/foo")).expect("stored");
        assert!(stored.mtime.is_some());
    }

    #[test]
    fn second_run_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "foo/shows/s.js", "s");
        let mut store = MemoryStore::new();

        sync(tmp.path(), &mut store).expect("first");
        let again = sync(tmp.path(), &mut store).expect("second");
        assert_eq!(again.documents[0].outcome, Outcome::Unchanged);
        assert!(again.messages().is_empty());
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn dry_run_leaves_store_untouched() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "foo/lists/l.js", "l");
        let mut store = MemoryStore::new();

        let report = plan(tmp.path(), &mut store).expect("plan");
        assert_eq!(report.documents[0].outcome, Outcome::WouldPersist);
        assert_eq!(report.written(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn remote_revision_and_unmanaged_fields_survive() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "foo/views/bar/map.js", "new");

        let mut store = MemoryStore::new();
        let mut remote = DesignDocument::new(DocId::from("_design/foo"));
        remote.views.insert("bar".into(), View::with_map("old"));
        remote
            .extra
            .insert("options".into(), serde_json::json!({ "local_seq": true }));
        store.insert(remote);

        let report = sync(tmp.path(), &mut store).expect("sync");
        assert_eq!(
            report.documents[0].changes[0].kind,
            ChangeKind::View(ViewChange::MapOutOfDate)
        );
        let stored = store.document(&DocId::from("_design/foo")).unwrap();
        assert_eq!(stored.rev.as_deref(), Some("2-hammock"));
        assert_eq!(stored.views["bar"].map.as_deref(), Some("new"));
        assert!(stored.extra.contains_key("options"));
    }

    #[test]
    fn fetch_failure_keeps_earlier_documents() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a/shows/s.js", "a");
        write(tmp.path(), "b/shows/s.js", "b");
        write(tmp.path(), "c/shows/s.js", "c");
        let mut store = FailingStore::new();
        store.fail_get = Some(DocId::from("_design/b"));

        let aborted = sync(tmp.path(), &mut store).unwrap_err();
        assert!(matches!(aborted.error, SyncError::Fetch { .. }), "got: {}", aborted.error);
        assert_eq!(aborted.report.documents.len(), 1);
        assert_eq!(aborted.report.documents[0].id, DocId::from("_design/a"));
        assert!(store.inner.document(&DocId::from("_design/c")).is_none());
    }

    #[test]
    fn persist_failure_aborts_run() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a/filters/f.js", "a");
        write(tmp.path(), "b/filters/f.js", "b");
        let mut store = FailingStore::new();
        store.fail_put = Some(DocId::from("_design/a"));

        let aborted = sync(tmp.path(), &mut store).unwrap_err();
        match &aborted.error {
            SyncError::Persist { source, .. } => {
                assert!(matches!(source, StoreError::Conflict { .. }))
            }
            other => panic!("expected persist error, got {other:?}"),
        }
        assert!(aborted.report.documents.is_empty());
        assert!(store.inner.is_empty());
    }

    #[test]
    fn ok_false_is_rejected() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a/updates/u.js", "u");
        let mut store = FailingStore::new();
        store.reject_put = true;

        let aborted = sync(tmp.path(), &mut store).unwrap_err();
        assert!(matches!(aborted.error, SyncError::PersistRejected { .. }));
    }

    #[test]
    fn load_failure_touches_nothing() {
        let tmp = TempDir::new().unwrap();
        let mut store = MemoryStore::new();
        let aborted = sync(&tmp.path().join("missing"), &mut store).unwrap_err();
        assert!(matches!(aborted.error, SyncError::Load(_)));
        assert!(aborted.report.documents.is_empty());
    }

    #[test]
    fn single_document_scope() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a/validate/v.js", "a");
        write(tmp.path(), "b/validate/v.js", "b");
        let mut store = MemoryStore::new();

        let options = SyncOptions {
            scope: SyncScope::Document(DocName::from("b")),
            dry_run: false,
        };
        let report = sync_with(tmp.path(), &mut store, &options).expect("sync");
        assert_eq!(report.documents.len(), 1);
        assert_eq!(
            report.documents[0].changes[0].kind,
            ChangeKind::Function(FunctionGroup::Validate, FunctionChange::Missing)
        );
        assert!(store.document(&DocId::from("_design/a")).is_none());

        let unknown = SyncOptions {
            scope: SyncScope::Document(DocName::from("zzz")),
            dry_run: false,
        };
        let aborted = sync_with(tmp.path(), &mut store, &unknown).unwrap_err();
        assert!(matches!(aborted.error, SyncError::UnknownDocument(_)));
    }
}
