mod graph_tests;
mod traversal_tests;

use crate::module_path::ModulePath;
use crate::{FxIndexSet, Graph};

/// Borrow an ordered path set as plain strings for assertions.
pub(crate) fn paths(set: &FxIndexSet<ModulePath>) -> Vec<&str> {
    set.iter().map(|path| path.as_str()).collect()
}

/// The store's key order as plain strings.
pub(crate) fn key_order(graph: &Graph) -> Vec<&str> {
    graph.module_paths().map(|path| path.as_str()).collect()
}

pub(crate) fn path(p: &str) -> ModulePath {
    ModulePath::new(p)
}
