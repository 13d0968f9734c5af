//! Design tree loader.
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   <doc_name>/
//!     views/<view_name>/map.js
//!     views/<view_name>/reduce.js
//!     shows/<name>.js
//!     lists/<name>.js
//!     updates/<name>.js
//!     filters/<name>.js
//!     validate/<name>.js
//! ```
//!
//! Anything else under a document directory is ignored and never descended
//! into. Directory entries are visited in file-name order, and the first I/O
//! failure aborts the whole load.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::error::{io_err, LoadError};
use crate::types::{DesignCollection, DesignDocument, DocName, FunctionGroup, Functions, View, Views};

/// Extension of function source files.
pub const SOURCE_EXTENSION: &str = "js";

/// Directory holding the views of a document.
pub const VIEWS_DIR: &str = "views";

/// File holding a view's map function.
pub const MAP_FILE: &str = "map.js";

/// File holding a view's reduce function.
pub const REDUCE_FILE: &str = "reduce.js";

// ---------------------------------------------------------------------------
// Function group reader
// ---------------------------------------------------------------------------

/// Read a whole source file.
///
/// The length is taken from the file metadata up front and the buffer is
/// filled in one pass. Non UTF-8 content is reported as an I/O error.
pub fn read_source(path: &Path) -> Result<String, LoadError> {
    let mut file = File::open(path).map_err(|e| io_err(path, e))?;
    let len = file.metadata().map_err(|e| io_err(path, e))?.len();
    let mut buf = Vec::with_capacity(usize::try_from(len).unwrap_or_default());
    file.read_to_end(&mut buf).map_err(|e| io_err(path, e))?;
    String::from_utf8(buf).map_err(|e| io_err(path, io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Read a flat function group: every `*.js` file directly inside `dir`.
///
/// Entry name is the file stem.
pub fn read_functions(dir: &Path) -> Result<Functions, LoadError> {
    let mut functions = Functions::new();
    for path in sorted_children(dir)? {
        if !path.is_file() || !has_source_extension(&path) {
            continue;
        }
        let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        tracing::debug!("function {}: {}", name, path.display());
        let source = read_source(&path)?;
        functions.insert(name, source);
    }
    Ok(functions)
}

/// Read a view group: each subdirectory of `dir` is a view.
///
/// A view directory holding neither `map.js` nor `reduce.js` yields no view.
pub fn read_views(dir: &Path) -> Result<Views, LoadError> {
    let mut views = Views::new();
    for view_dir in sorted_children(dir)? {
        if !view_dir.is_dir() {
            continue;
        }
        let Some(name) = file_name(&view_dir) else {
            continue;
        };

        let mut view = View::default();
        let map_path = view_dir.join(MAP_FILE);
        if map_path.is_file() {
            view.map = Some(read_source(&map_path)?);
        }
        let reduce_path = view_dir.join(REDUCE_FILE);
        if reduce_path.is_file() {
            view.reduce = Some(read_source(&reduce_path)?);
        }

        if view.is_empty() {
            tracing::debug!("skipping view dir without functions: {}", view_dir.display());
            continue;
        }
        tracing::debug!("view {}: {}", name, view_dir.display());
        views.insert(name, view);
    }
    Ok(views)
}

// ---------------------------------------------------------------------------
// Document tree loader
// ---------------------------------------------------------------------------

/// Fill `doc` from the recognised group directories under `doc_dir`.
pub fn load_document(doc_dir: &Path, doc: &mut DesignDocument) -> Result<(), LoadError> {
    for child in sorted_children(doc_dir)? {
        if !child.is_dir() {
            continue;
        }
        let Some(name) = file_name(&child) else {
            continue;
        };

        if name == VIEWS_DIR {
            doc.views.extend(read_views(&child)?);
        } else if let Some(group) = FunctionGroup::from_dir_name(&name) {
            doc.group_mut(group).extend(read_functions(&child)?);
        }
    }
    Ok(())
}

/// Load every design document under `root`.
///
/// Each immediate subdirectory becomes the document `_design/<dir name>`.
/// Plain files at the root are ignored.
pub fn load_collection(root: &Path) -> Result<DesignCollection, LoadError> {
    tracing::debug!("scanning design docs at {}", root.display());
    let mut collection = DesignCollection::new();
    for doc_dir in sorted_children(root)? {
        if !doc_dir.is_dir() {
            continue;
        }
        let Some(name) = file_name(&doc_dir) else {
            continue;
        };
        let doc = collection.entry(DocName::from(name));
        load_document(&doc_dir, doc)?;
    }
    Ok(collection)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn sorted_children(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == SOURCE_EXTENSION)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
