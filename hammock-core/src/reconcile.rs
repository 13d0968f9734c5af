//! Reconciliation of a current design document against a desired one.
//!
//! [`reconcile`] mutates `current` into the merged document and returns the
//! ordered list of [`Change`]s it applied. Groups are processed in the order
//! views, shows, lists, updates, filters, validate. Within a group,
//! deletions and updates come first in `current`'s name order, then
//! additions in `desired`'s name order.

use std::collections::BTreeMap;
use std::fmt;

use crate::types::{DesignDocument, DocId, FunctionGroup, Functions, View, Views};

// ---------------------------------------------------------------------------
// Change log
// ---------------------------------------------------------------------------

/// What happened to a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewChange {
    /// Present on the current side only; removed.
    Deleted,
    /// Map function differs; overwritten.
    MapOutOfDate,
    /// Reduce function differs; overwritten.
    ReduceOutOfDate,
    /// Present on the desired side only; inserted.
    Missing,
}

/// What happened to a flat function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionChange {
    Deleted,
    /// Source text differs; overwritten.
    OutOfDate,
    Missing,
}

/// The part of a design document a change touches and what happened to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    View(ViewChange),
    Function(FunctionGroup, FunctionChange),
}

impl ChangeKind {
    /// Path segment of the entry, e.g. `_view` or `_show`.
    pub fn segment(self) -> &'static str {
        match self {
            ChangeKind::View(_) => "_view",
            ChangeKind::Function(group, _) => group.segment(),
        }
    }
}

/// One entry of the change log.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Change {
    pub doc: DocId,
    pub name: String,
    pub kind: ChangeKind,
}

impl Change {
    fn new(doc: &DocId, name: &str, kind: ChangeKind) -> Self {
        Self {
            doc: doc.clone(),
            name: name.to_string(),
            kind,
        }
    }

    /// Address of the entry, e.g. `_design/app/_view/by_date`.
    pub fn path(&self) -> String {
        format!("{}/{}/{}", self.doc, self.kind.segment(), self.name)
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path();
        match self.kind {
            ChangeKind::View(ViewChange::Deleted) => write!(f, "View {path} needs to be deleted"),
            ChangeKind::View(ViewChange::MapOutOfDate) => {
                write!(f, "Map function for view {path} is out of date")
            }
            ChangeKind::View(ViewChange::ReduceOutOfDate) => {
                write!(f, "Reduce function for view {path} is out of date")
            }
            ChangeKind::View(ViewChange::Missing) => write!(f, "View {path} is missing"),
            ChangeKind::Function(group, change) => {
                let label = group.label();
                match change {
                    FunctionChange::Deleted => write!(f, "{label} function {path} needs to be deleted"),
                    FunctionChange::OutOfDate => write!(f, "{label} function {path} is out of date"),
                    FunctionChange::Missing => write!(f, "{label} function {path} is missing"),
                }
            }
        }
    }
}

/// Result of one [`reconcile`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub changes: Vec<Change>,
}

impl Reconciliation {
    /// True when `current` was modified.
    pub fn changed(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Rendered change messages, in order.
    pub fn messages(&self) -> Vec<String> {
        self.changes.iter().map(ToString::to_string).collect()
    }
}

// ---------------------------------------------------------------------------
// reconcile
// ---------------------------------------------------------------------------

/// Bring `current` in line with `desired`.
///
/// `language`, the revision and unmanaged fields of `current` are left as is.
pub fn reconcile(current: &mut DesignDocument, desired: &DesignDocument) -> Reconciliation {
    let id = current.id.clone();
    let mut changes = Vec::new();

    reconcile_views(&id, &mut current.views, &desired.views, &mut changes);
    for group in FunctionGroup::all() {
        reconcile_functions(
            &id,
            *group,
            current.group_mut(*group),
            desired.group(*group),
            &mut changes,
        );
    }

    Reconciliation { changes }
}

/// Keys of any map, sorted ascending.
pub fn sorted_keys<'a, K, V, M>(map: M) -> Vec<K>
where
    M: IntoIterator<Item = (&'a K, &'a V)>,
    K: Ord + Clone + 'a,
    V: 'a,
{
    let mut keys: Vec<K> = map.into_iter().map(|(k, _)| k.clone()).collect();
    keys.sort();
    keys
}

fn reconcile_views(id: &DocId, current: &mut Views, desired: &Views, changes: &mut Vec<Change>) {
    for name in sorted_keys(&*current) {
        let Some(wanted) = desired.get(&name) else {
            changes.push(Change::new(id, &name, ChangeKind::View(ViewChange::Deleted)));
            current.remove(&name);
            continue;
        };
        if let Some(view) = current.get_mut(&name) {
            update_view(id, &name, view, wanted, changes);
        }
    }

    insert_missing(id, ChangeKind::View(ViewChange::Missing), current, desired, changes);
}

fn update_view(id: &DocId, name: &str, view: &mut View, wanted: &View, changes: &mut Vec<Change>) {
    if view.map != wanted.map {
        changes.push(Change::new(id, name, ChangeKind::View(ViewChange::MapOutOfDate)));
        view.map.clone_from(&wanted.map);
    }
    if view.reduce != wanted.reduce {
        changes.push(Change::new(id, name, ChangeKind::View(ViewChange::ReduceOutOfDate)));
        view.reduce.clone_from(&wanted.reduce);
    }
}

fn reconcile_functions(
    id: &DocId,
    group: FunctionGroup,
    current: &mut Functions,
    desired: &Functions,
    changes: &mut Vec<Change>,
) {
    let kind = |change| ChangeKind::Function(group, change);
    for name in sorted_keys(&*current) {
        let Some(wanted) = desired.get(&name) else {
            changes.push(Change::new(id, &name, kind(FunctionChange::Deleted)));
            current.remove(&name);
            continue;
        };
        if let Some(source) = current.get_mut(&name) {
            if source != wanted {
                changes.push(Change::new(id, &name, kind(FunctionChange::OutOfDate)));
                source.clone_from(wanted);
            }
        }
    }

    insert_missing(id, kind(FunctionChange::Missing), current, desired, changes);
}

/// Insert every desired entry `current` lacks, logging each as `missing`.
fn insert_missing<V: Clone>(
    id: &DocId,
    missing: ChangeKind,
    current: &mut BTreeMap<String, V>,
    desired: &BTreeMap<String, V>,
    changes: &mut Vec<Change>,
) {
    for name in sorted_keys(desired) {
        if current.contains_key(&name) {
            continue;
        }
        changes.push(Change::new(id, &name, missing));
        if let Some(value) = desired.get(&name) {
            current.insert(name, value.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::types::DocName;

    fn doc() -> DesignDocument {
        DesignDocument::named(&DocName::from("app"))
    }

    #[test]
    fn sorted_keys_orders_hash_map_keys() {
        let map: HashMap<String, u8> = [("b", 1), ("c", 2), ("a", 3)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        assert_eq!(sorted_keys(&map), vec!["a", "b", "c"]);
    }

    #[test]
    fn identical_documents_produce_no_changes() {
        let mut current = doc();
        current.views.insert("v".into(), View::with_map("m"));
        current.shows.insert("s".into(), "x".into());
        let desired = current.clone();
        let result = reconcile(&mut current, &desired);
        assert!(!result.changed());
        assert_eq!(current, desired);
    }

    #[test]
    fn every_deleted_function_is_reported() {
        let mut current = doc();
        for name in ["a", "b", "c"] {
            current.updates.insert(name.into(), "fn".into());
        }
        let desired = doc();
        let result = reconcile(&mut current, &desired);
        assert_eq!(
            result.messages(),
            vec![
                "Update function _design/app/_update/a needs to be deleted",
                "Update function _design/app/_update/b needs to be deleted",
                "Update function _design/app/_update/c needs to be deleted",
            ]
        );
        assert!(current.updates.is_empty());
    }

    #[test]
    fn map_and_reduce_are_compared_separately() {
        let mut current = doc();
        current.views.insert(
            "v".into(),
            View {
                map: Some("m1".into()),
                reduce: Some("r1".into()),
            },
        );
        let mut desired = doc();
        desired.views.insert(
            "v".into(),
            View {
                map: Some("m2".into()),
                reduce: Some("r2".into()),
            },
        );
        let result = reconcile(&mut current, &desired);
        let kinds: Vec<_> = result.changes.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChangeKind::View(ViewChange::MapOutOfDate),
                ChangeKind::View(ViewChange::ReduceOutOfDate),
            ]
        );
        assert_eq!(current.views["v"], desired.views["v"]);
    }

    #[test]
    fn language_and_revision_are_left_alone() {
        let mut current = doc();
        current.language = "erlang".into();
        current.rev = Some("7-abc".into());
        let mut desired = doc();
        desired.filters.insert("f".into(), "src".into());
        reconcile(&mut current, &desired);
        assert_eq!(current.language, "erlang");
        assert_eq!(current.rev.as_deref(), Some("7-abc"));
    }

    #[test]
    fn change_paths_use_group_segments() {
        let change = Change::new(
            &DocId::from("_design/app"),
            "feed",
            ChangeKind::Function(FunctionGroup::Lists, FunctionChange::Missing),
        );
        assert_eq!(change.path(), "_design/app/_list/feed");
        assert_eq!(change.to_string(), "List function _design/app/_list/feed is missing");
    }
}
