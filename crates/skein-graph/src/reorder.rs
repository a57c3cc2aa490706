use rustc_hash::FxHashSet;

use crate::graph::Graph;
use crate::module_path::ModulePath;
use crate::FxIndexMap;

/// Rewrite the store's insertion order to the depth-first pre-order
/// visitation from the entry points, taking entries in declaration order
/// and each module's children in dependency-list order. Already-visited
/// modules are skipped; modules unreachable from any entry are dropped.
/// The pass is idempotent.
pub fn reorder_graph(graph: &mut Graph) {
    let mut visited: FxHashSet<ModulePath> = FxHashSet::default();
    let mut order: Vec<ModulePath> = Vec::with_capacity(graph.len());

    for entry in graph.entry_points().to_vec() {
        let mut stack = vec![entry];
        while let Some(path) = stack.pop() {
            if !graph.contains(&path) || !visited.insert(path.clone()) {
                continue;
            }
            let module = graph.module(&path).expect("visited module must be present");
            // Children push in reverse so the first dependency pops first.
            for (_, target) in module.dependencies().rev() {
                if !visited.contains(target) {
                    stack.push(target.clone());
                }
            }
            order.push(path);
        }
    }

    tracing::debug!(modules = order.len(), dropped = graph.len() - order.len(), "reordered graph");

    let mut modules = FxIndexMap::default();
    modules.reserve(order.len());
    for path in order {
        let module = graph
            .take_module_unordered(&path)
            .expect("ordered module must be present");
        modules.insert(path, module);
    }
    graph.replace_modules(modules);
}
