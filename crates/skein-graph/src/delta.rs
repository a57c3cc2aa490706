use crate::module_path::ModulePath;
use crate::FxIndexSet;

/// Minimal difference produced by one traversal call.
///
/// `added` holds every module created or re-transformed during the call:
/// newly discovered modules first, in discovery order, then re-transformed
/// dirty modules in the order the caller supplied them. `deleted` holds
/// every module released. The two sets are always disjoint; a module
/// created and released within the same call appears in neither.
#[derive(Debug, Clone, Default)]
pub struct GraphDelta {
    pub(crate) added: FxIndexSet<ModulePath>,
    pub(crate) deleted: FxIndexSet<ModulePath>,
}

impl GraphDelta {
    /// Paths added or re-transformed, in order.
    pub fn added(&self) -> &FxIndexSet<ModulePath> {
        &self.added
    }

    /// Paths released, in release order.
    pub fn deleted(&self) -> &FxIndexSet<ModulePath> {
        &self.deleted
    }

    /// Returns true if the call changed or re-processed anything.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.deleted.is_empty()
    }

    pub fn added_count(&self) -> usize {
        self.added.len()
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }
}
