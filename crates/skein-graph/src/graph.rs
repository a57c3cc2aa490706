use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::module::Module;
use crate::module_path::ModulePath;
use crate::FxIndexMap;

/// In-memory module dependency graph.
///
/// Modules iterate in insertion order, which the traversal engine keeps
/// equal to discovery order; that order is part of the public contract and
/// can be rewritten canonically with [`crate::reorder_graph`]. The engine
/// owns the graph exclusively (`&mut`) while a traversal call runs; between
/// calls the graph is read-only and freely shareable.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    modules: FxIndexMap<ModulePath, Module>,
    entry_points: Vec<ModulePath>,
}

impl Graph {
    /// Create an empty graph rooted at the given entry points.
    pub fn new(entry_points: impl IntoIterator<Item = ModulePath>) -> Self {
        Self {
            modules: FxIndexMap::default(),
            entry_points: entry_points.into_iter().collect(),
        }
    }

    /// Ordered entry-point paths.
    pub fn entry_points(&self) -> &[ModulePath] {
        &self.entry_points
    }

    /// True if `path` is declared as an entry point. Entry points carry a
    /// synthetic inbound reference and are never released.
    pub fn is_entry(&self, path: &ModulePath) -> bool {
        self.entry_points.iter().any(|entry| entry == path)
    }

    /// Declare an additional entry point. The new root is expanded on the
    /// next incremental traversal that marks it dirty.
    pub fn add_entry_point(&mut self, path: ModulePath) {
        if !self.is_entry(&path) {
            self.entry_points.push(path);
        }
    }

    /// Whether a module is present.
    pub fn contains(&self, path: &ModulePath) -> bool {
        self.modules.contains_key(path)
    }

    /// Fetch a module record by path.
    pub fn module(&self, path: &ModulePath) -> Option<&Module> {
        self.modules.get(path)
    }

    /// Iterate module records in insertion order.
    pub fn modules(&self) -> impl ExactSizeIterator<Item = &Module> {
        self.modules.values()
    }

    /// Iterate module paths in insertion order.
    pub fn module_paths(&self) -> impl ExactSizeIterator<Item = &ModulePath> {
        self.modules.keys()
    }

    /// Return total module count.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check whether the graph holds no modules.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Returns true if `from` depends on `to`, directly or transitively.
    pub fn depends_on(&self, from: &ModulePath, to: &ModulePath) -> bool {
        if from == to {
            return true;
        }

        let mut visited = FxHashSet::default();
        let mut queue = VecDeque::new();
        queue.push_back(from.clone());

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }

            if let Some(module) = self.modules.get(&current) {
                for (_, target) in module.dependencies() {
                    if target == to {
                        return true;
                    }
                    if !visited.contains(target) {
                        queue.push_back(target.clone());
                    }
                }
            }
        }

        false
    }

    /// Collect transitive dependencies of a module.
    pub fn transitive_dependencies(&self, path: &ModulePath) -> FxHashSet<ModulePath> {
        let mut visited = FxHashSet::default();
        let mut queue = VecDeque::new();
        queue.push_back(path.clone());

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }

            if let Some(module) = self.modules.get(&current) {
                for (_, target) in module.dependencies() {
                    if !visited.contains(target) {
                        queue.push_back(target.clone());
                    }
                }
            }
        }

        visited.remove(path);
        visited
    }

    /// Every module reachable from the entry points along forward edges.
    pub(crate) fn reachable_from_entries(&self) -> FxHashSet<ModulePath> {
        let mut visited = FxHashSet::default();
        let mut queue: VecDeque<ModulePath> = self.entry_points.iter().cloned().collect();

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }

            if let Some(module) = self.modules.get(&current) {
                for (_, target) in module.dependencies() {
                    if !visited.contains(target) {
                        queue.push_back(target.clone());
                    }
                }
            }
        }

        visited
    }

    pub(crate) fn module_mut(&mut self, path: &ModulePath) -> Option<&mut Module> {
        self.modules.get_mut(path)
    }

    pub(crate) fn insert_module(&mut self, module: Module) {
        self.modules.insert(module.path().clone(), module);
    }

    /// Remove a module, preserving the insertion order of the rest.
    pub(crate) fn remove_module(&mut self, path: &ModulePath) -> Option<Module> {
        self.modules.shift_remove(path)
    }

    /// Remove a module without preserving order. Only safe while the whole
    /// map is being rebuilt.
    pub(crate) fn take_module_unordered(&mut self, path: &ModulePath) -> Option<Module> {
        self.modules.swap_remove(path)
    }

    pub(crate) fn replace_modules(&mut self, modules: FxIndexMap<ModulePath, Module>) {
        self.modules = modules;
    }

    pub(crate) fn clear_modules(&mut self) {
        self.modules.clear();
    }
}
