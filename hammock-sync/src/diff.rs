//! Unified diffs of function source for `hammock diff`.
//!
//! Runs the same reconciliation as a dry-run sync and renders, for every
//! change, the remote text against the disk text. Nothing is written.

use std::path::Path;

use similar::TextDiff;

use hammock_core::{
    load_collection, reconcile, Change, ChangeKind, DesignDocument, DocId, ViewChange,
};

use crate::{
    pipeline::{fetch_or_empty, select, SyncScope},
    DesignStore, SyncError,
};

/// One changed function body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDiff {
    /// Entry address plus field, e.g. `_design/app/_view/by_date/map`.
    pub path: String,
    pub unified_diff: String,
}

/// Diffs for one design document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDiff {
    pub id: DocId,
    pub created: bool,
    pub diffs: Vec<FunctionDiff>,
}

/// Compare every document under `root` with its remote copy.
///
/// Documents without differences are omitted.
pub fn diff<S: DesignStore + ?Sized>(
    root: &Path,
    store: &mut S,
    scope: &SyncScope,
) -> Result<Vec<DocumentDiff>, SyncError> {
    let collection = load_collection(root)?;
    let mut result = Vec::new();
    for desired in select(&collection, scope)? {
        let (current, created) = fetch_or_empty(store, &desired.id)?;
        let diffs = diff_document(&current, desired);
        if diffs.is_empty() {
            continue;
        }
        result.push(DocumentDiff {
            id: desired.id.clone(),
            created,
            diffs,
        });
    }
    Ok(result)
}

/// Diffs between `current` and `desired`, in change-log order.
///
/// A change that is invisible as text (line endings only, absent vs empty)
/// gets a header and a `#` note instead of a hunk.
pub fn diff_document(current: &DesignDocument, desired: &DesignDocument) -> Vec<FunctionDiff> {
    let mut merged = current.clone();
    let changes = reconcile(&mut merged, desired).changes;

    let mut diffs = Vec::new();
    for change in &changes {
        for &field in fields(change.kind) {
            let old = text(current, change, field);
            let new = text(desired, change, field);
            if old == new {
                continue;
            }
            let path = match field {
                Field::Source => change.path(),
                Field::Map => format!("{}/map", change.path()),
                Field::Reduce => format!("{}/reduce", change.path()),
            };
            diffs.push(FunctionDiff {
                unified_diff: render(old, new, &path),
                path,
            });
        }
    }
    diffs
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Map,
    Reduce,
    Source,
}

fn fields(kind: ChangeKind) -> &'static [Field] {
    match kind {
        ChangeKind::View(ViewChange::MapOutOfDate) => &[Field::Map],
        ChangeKind::View(ViewChange::ReduceOutOfDate) => &[Field::Reduce],
        ChangeKind::View(_) => &[Field::Map, Field::Reduce],
        ChangeKind::Function(..) => &[Field::Source],
    }
}

fn text<'a>(doc: &'a DesignDocument, change: &Change, field: Field) -> Option<&'a str> {
    match change.kind {
        ChangeKind::View(_) => doc.views.get(&change.name).and_then(|view| match field {
            Field::Map => view.map.as_deref(),
            Field::Reduce => view.reduce.as_deref(),
            Field::Source => None,
        }),
        ChangeKind::Function(group, _) => doc.group(group).get(&change.name).map(String::as_str),
    }
}

fn render(old: Option<&str>, new: Option<&str>, path: &str) -> String {
    let old_text = normalize_line_endings(old.unwrap_or_default());
    let new_text = normalize_line_endings(new.unwrap_or_default());
    if old_text != new_text {
        return unified(&old_text, &new_text, path);
    }

    let note = if old.is_some() == new.is_some() {
        "line endings differ"
    } else {
        "absent on one side, empty on the other"
    };
    format!("--- a/{path}\n+++ b/{path}\n# {note}\n")
}

fn unified(old: &str, new: &str, path: &str) -> String {
    let old_header = format!("a/{path}");
    let new_header = format!("b/{path}");
    TextDiff::from_lines(old, new)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string()
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use hammock_core::{DocName, View};
    use tempfile::TempDir;

    use super::*;
    use crate::{store::MemoryStore, sync};

    fn doc() -> DesignDocument {
        DesignDocument::named(&DocName::from("app"))
    }

    #[test]
    fn reduce_edit_diffs_reduce_only() {
        let mut current = doc();
        current.views.insert(
            "stats".into(),
            View {
                map: Some("function(doc){emit(doc.n)}\n".into()),
                reduce: Some("_sum\n".into()),
            },
        );
        let mut desired = current.clone();
        desired.views.get_mut("stats").unwrap().reduce = Some("_stats\n".into());

        let diffs = diff_document(&current, &desired);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "_design/app/_view/stats/reduce");
        assert!(diffs[0].unified_diff.contains("--- a/_design/app/_view/stats/reduce"));
        assert!(diffs[0].unified_diff.contains("-_sum"));
        assert!(diffs[0].unified_diff.contains("+_stats"));
    }

    #[test]
    fn deleted_function_diffs_to_empty() {
        let mut current = doc();
        current.shows.insert("item".into(), "function(doc){}\n".into());
        let diffs = diff_document(&current, &doc());
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].unified_diff.contains("-function(doc){}"));
    }

    #[test]
    fn crlf_only_difference_gets_a_note() {
        let mut current = doc();
        current.lists.insert("feed".into(), "a\r\nb\r\n".into());
        let mut desired = doc();
        desired.lists.insert("feed".into(), "a\nb\n".into());

        let diffs = diff_document(&current, &desired);
        assert_eq!(diffs.len(), 1);
        assert_eq!(
            diffs[0].unified_diff,
            "--- a/_design/app/_list/feed\n+++ b/_design/app/_list/feed\n# line endings differ\n"
        );
    }

    #[test]
    fn absent_map_against_empty_map_gets_a_note() {
        let mut current = doc();
        current.views.insert(
            "v".into(),
            View {
                map: None,
                reduce: Some("_count".into()),
            },
        );
        let mut desired = current.clone();
        desired.views.get_mut("v").unwrap().map = Some(String::new());

        let diffs = diff_document(&current, &desired);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "_design/app/_view/v/map");
        assert!(diffs[0]
            .unified_diff
            .ends_with("# absent on one side, empty on the other\n"));
    }

    #[test]
    fn new_view_without_reduce_diffs_map_only() {
        let mut desired = doc();
        desired.views.insert("v".into(), View::with_map("m\n"));
        let diffs = diff_document(&doc(), &desired);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "_design/app/_view/v/map");
        assert!(diffs[0].unified_diff.contains("+m"));
    }

    #[test]
    fn no_diffs_after_sync() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("app/filters/mine.js");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "function(doc,req){return true}\n").unwrap();
        let mut store = MemoryStore::new();

        let before = diff(tmp.path(), &mut store, &SyncScope::All).expect("diff");
        assert_eq!(before.len(), 1);
        assert!(before[0].created);

        sync(tmp.path(), &mut store).expect("sync");
        let after = diff(tmp.path(), &mut store, &SyncScope::All).expect("diff");
        assert!(after.is_empty(), "synced designs should have no diff");
    }
}
