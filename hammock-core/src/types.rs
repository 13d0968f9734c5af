//! Design document model.
//!
//! Every mapping is a `BTreeMap`, so iteration (and therefore anything
//! emitted from it) is lexicographic by name.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Language tag written on documents created by this tool.
pub const DEFAULT_LANGUAGE: &str = "javascript";

/// Prefix of every design document id on the remote store.
pub const DESIGN_PREFIX: &str = "_design/";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Name of a design document, i.e. the directory name under the designs root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocName(pub String);

impl DocName {
    /// Remote id for this document: `_design/<name>`.
    pub fn id(&self) -> DocId {
        DocId(format!("{DESIGN_PREFIX}{}", self.0))
    }
}

impl fmt::Display for DocName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for DocName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DocName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Remote id of a design document (`_design/<name>`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub String);

impl DocId {
    /// The `<name>` part of `_design/<name>`, if the id has the design prefix.
    pub fn name(&self) -> Option<DocName> {
        self.0.strip_prefix(DESIGN_PREFIX).map(DocName::from)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for DocId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Function groups
// ---------------------------------------------------------------------------

/// The five single-function groups stored next to views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FunctionGroup {
    Shows,
    Lists,
    Updates,
    Filters,
    Validate,
}

impl FunctionGroup {
    /// All groups in reconciliation order.
    pub fn all() -> &'static [FunctionGroup] {
        &[
            FunctionGroup::Shows,
            FunctionGroup::Lists,
            FunctionGroup::Updates,
            FunctionGroup::Filters,
            FunctionGroup::Validate,
        ]
    }

    /// Directory name of this group inside a document directory.
    pub fn dir_name(self) -> &'static str {
        match self {
            FunctionGroup::Shows => "shows",
            FunctionGroup::Lists => "lists",
            FunctionGroup::Updates => "updates",
            FunctionGroup::Filters => "filters",
            FunctionGroup::Validate => "validate",
        }
    }

    pub fn from_dir_name(name: &str) -> Option<FunctionGroup> {
        FunctionGroup::all()
            .iter()
            .copied()
            .find(|group| group.dir_name() == name)
    }

    /// Capitalised singular used in change messages ("Show function ...").
    pub fn label(self) -> &'static str {
        match self {
            FunctionGroup::Shows => "Show",
            FunctionGroup::Lists => "List",
            FunctionGroup::Updates => "Update",
            FunctionGroup::Filters => "Filter",
            FunctionGroup::Validate => "Validate",
        }
    }

    /// Path segment used when addressing a function, e.g. `_design/app/_show/item`.
    pub fn segment(self) -> &'static str {
        match self {
            FunctionGroup::Shows => "_show",
            FunctionGroup::Lists => "_list",
            FunctionGroup::Updates => "_update",
            FunctionGroup::Filters => "_filter",
            FunctionGroup::Validate => "_validate",
        }
    }
}

impl fmt::Display for FunctionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A map/reduce pair. Either side may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce: Option<String>,
}

impl View {
    pub fn with_map(map: impl Into<String>) -> Self {
        Self {
            map: Some(map.into()),
            reduce: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_none() && self.reduce.is_none()
    }
}

/// View name -> map/reduce pair.
pub type Views = BTreeMap<String, View>;

/// Function name -> source text.
pub type Functions = BTreeMap<String, String>;

/// A design document as stored on the remote and as loaded from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignDocument {
    #[serde(rename = "_id")]
    pub id: DocId,

    /// Revision token; opaque, carried through untouched.
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub views: Views,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub shows: Functions,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub lists: Functions,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub updates: Functions,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: Functions,
    #[serde(
        rename = "validate_doc_update",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub validate: Functions,

    /// Time of the last write made by hammock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<DateTime<Utc>>,

    /// Remote fields hammock does not manage (`options`, `rewrites`, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl DesignDocument {
    /// An empty document with every group present and no revision.
    pub fn new(id: DocId) -> Self {
        Self {
            id,
            rev: None,
            language: default_language(),
            views: Views::new(),
            shows: Functions::new(),
            lists: Functions::new(),
            updates: Functions::new(),
            filters: Functions::new(),
            validate: Functions::new(),
            mtime: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn named(name: &DocName) -> Self {
        Self::new(name.id())
    }

    pub fn group(&self, group: FunctionGroup) -> &Functions {
        match group {
            FunctionGroup::Shows => &self.shows,
            FunctionGroup::Lists => &self.lists,
            FunctionGroup::Updates => &self.updates,
            FunctionGroup::Filters => &self.filters,
            FunctionGroup::Validate => &self.validate,
        }
    }

    pub fn group_mut(&mut self, group: FunctionGroup) -> &mut Functions {
        match group {
            FunctionGroup::Shows => &mut self.shows,
            FunctionGroup::Lists => &mut self.lists,
            FunctionGroup::Updates => &mut self.updates,
            FunctionGroup::Filters => &mut self.filters,
            FunctionGroup::Validate => &mut self.validate,
        }
    }

    /// True when the document holds no views and no functions.
    pub fn has_no_functions(&self) -> bool {
        self.views.is_empty()
            && FunctionGroup::all()
                .iter()
                .all(|group| self.group(*group).is_empty())
    }
}

/// Every design document found under a designs root, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesignCollection {
    pub documents: BTreeMap<DocName, DesignDocument>,
}

impl DesignCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// The document for `name`, created empty on first access.
    pub fn entry(&mut self, name: DocName) -> &mut DesignDocument {
        let id = name.id();
        self.documents
            .entry(name)
            .or_insert_with(|| DesignDocument::new(id))
    }

    pub fn get(&self, name: &DocName) -> Option<&DesignDocument> {
        self.documents.get(name)
    }

    /// Documents in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&DocName, &DesignDocument)> {
        self.documents.iter()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
