use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::module_path::ModulePath;
use crate::{FxIndexMap, FxIndexSet};

/// One named edge in a module's dependency list.
///
/// `name` is the specifier exactly as written in source; `path` is the
/// canonical target the resolver mapped it to. Two different names may
/// resolve to the same target and both edges are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub path: ModulePath,
}

impl Dependency {
    pub fn new(name: impl Into<String>, path: impl Into<ModulePath>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Opaque artifact produced by the transformer, stored verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformOutput {
    pub code: String,
    pub source_map: Option<String>,
    pub source_type: SourceType,
}

/// Resolved module source type derived from file extensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceType {
    JavaScript,
    TypeScript,
    Json,
    Asset,
    #[default]
    Unknown,
}

impl SourceType {
    /// Derive the source type from a file extension string.
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "js" | "mjs" | "cjs" | "jsx" => Self::JavaScript,
            "ts" | "mts" | "cts" | "tsx" => Self::TypeScript,
            "json" => Self::Json,
            "css" | "png" | "jpg" | "gif" | "svg" | "ttf" => Self::Asset,
            _ => Self::Unknown,
        }
    }

    /// Attempt to infer the source type from a file path.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(Self::Unknown, Self::from_extension)
    }
}

/// A module record in the graph.
///
/// Holds the module's canonical path, its dependency list in source textual
/// order, the set of modules currently referring to it, and the transform
/// output. Records are created and mutated only by the traversal engine;
/// everything else reads them through [`crate::Graph`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    path: ModulePath,
    dependencies: FxIndexMap<String, ModulePath>,
    inverse_dependencies: FxIndexSet<ModulePath>,
    output: TransformOutput,
}

impl Module {
    pub(crate) fn new(path: ModulePath, output: TransformOutput) -> Self {
        Self {
            path,
            dependencies: FxIndexMap::default(),
            inverse_dependencies: FxIndexSet::default(),
            output,
        }
    }

    pub fn path(&self) -> &ModulePath {
        &self.path
    }

    /// Iterate `(name, target)` pairs in source textual order.
    pub fn dependencies(
        &self,
    ) -> impl DoubleEndedIterator<Item = (&str, &ModulePath)> + ExactSizeIterator {
        self.dependencies
            .iter()
            .map(|(name, path)| (name.as_str(), path))
    }

    pub fn dependency_count(&self) -> usize {
        self.dependencies.len()
    }

    /// True if any entry of the dependency list points at `target`.
    pub fn targets(&self, target: &ModulePath) -> bool {
        self.dependencies.values().any(|path| path == target)
    }

    /// Target path recorded under a dependency name, if any.
    pub fn dependency(&self, name: &str) -> Option<&ModulePath> {
        self.dependencies.get(name)
    }

    /// Modules currently holding an edge into this one.
    pub fn inverse_dependencies(&self) -> &FxIndexSet<ModulePath> {
        &self.inverse_dependencies
    }

    pub fn output(&self) -> &TransformOutput {
        &self.output
    }

    pub(crate) fn dependency_map(&self) -> &FxIndexMap<String, ModulePath> {
        &self.dependencies
    }

    /// Replace the dependency list wholesale, preserving iteration order of
    /// the input. Inverse sets are not touched here.
    pub(crate) fn set_dependencies(&mut self, dependencies: impl IntoIterator<Item = Dependency>) {
        self.dependencies = dependencies
            .into_iter()
            .map(|dep| (dep.name, dep.path))
            .collect();
    }

    pub(crate) fn set_output(&mut self, output: TransformOutput) {
        self.output = output;
    }

    /// Record a referrer. Idempotent; returns true if the referrer was new.
    pub(crate) fn add_inverse(&mut self, referrer: ModulePath) -> bool {
        self.inverse_dependencies.insert(referrer)
    }

    /// Drop a referrer. Idempotent; returns true if the set is now empty,
    /// which is the release signal for non-entry modules.
    pub(crate) fn remove_inverse(&mut self, referrer: &ModulePath) -> bool {
        self.inverse_dependencies.shift_remove(referrer);
        self.inverse_dependencies.is_empty()
    }
}
