//! Traversal engine: initial discovery and incremental delta updates.
//!
//! Discovery is pipelined but applied deterministically. A module's shallow
//! resolution (transform plus per-name resolve) runs as a spawned task;
//! tasks for sibling subtrees overlap freely at the I/O layer, while all
//! graph mutation, delta bookkeeping and progress emission happen on the
//! caller's task in depth-first list order. A record therefore takes its
//! position in the store before any of its children are awaited, and slow
//! siblings can never jump ahead of fast ones.

use std::sync::Arc;

use futures::future::BoxFuture;
use rustc_hash::FxHashSet;
use tokio::task::JoinHandle;

use crate::delta::GraphDelta;
use crate::graph::Graph;
use crate::module::{Dependency, Module};
use crate::module_path::ModulePath;
use crate::progress::{ProgressCounter, ProgressSink};
use crate::resolve::{resolve_shallow, Resolve, ResolvedModule, Transform, TraverseOptions};
use crate::{FxIndexMap, FxIndexSet, Result};

/// Discover every module reachable from the graph's entry points.
///
/// The graph must be empty and declare at least one entry point. On
/// success, `added` lists every module now in the graph in discovery order
/// and `deleted` is empty. On failure the error is surfaced verbatim and
/// the store is cleared: a partial graph is never observable.
///
/// Must be called from within a Tokio runtime.
pub async fn initial_traverse_dependencies(
    graph: &mut Graph,
    options: &TraverseOptions,
) -> Result<GraphDelta> {
    assert!(
        graph.is_empty(),
        "initial traversal requires an empty graph"
    );
    assert!(
        !graph.entry_points().is_empty(),
        "initial traversal requires at least one entry point"
    );

    tracing::debug!(entries = graph.entry_points().len(), "initial traversal");

    let mut state = TraversalState::new(options);
    let entries: Vec<ModulePath> = graph.entry_points().to_vec();
    for entry in &entries {
        state.prefetch(entry, graph);
    }

    for entry in entries {
        if graph.contains(&entry) {
            // Duplicate entry, or already reached through an earlier one.
            continue;
        }
        if let Err(err) = expand_module(&mut state, graph, entry).await {
            state.abort_inflight();
            graph.clear_modules();
            return Err(err);
        }
    }

    state.abort_inflight();
    Ok(state.into_delta())
}

/// Re-traverse a batch of dirty paths and compute the resulting delta.
///
/// Each dirty path must either be present in the graph or be a declared
/// entry point awaiting expansion; anything else is a stale notification
/// and is skipped. Dirty modules are re-transformed, their dependency
/// lists diffed edge-by-edge (keyed by `(name, target)` so aliases never
/// collapse), new subtrees expanded and orphaned ones released through
/// reference counting. On failure the error is surfaced verbatim and the
/// batch is abandoned; the caller keeps its dirty set and may retry.
///
/// Must be called from within a Tokio runtime.
pub async fn traverse_dependencies(
    paths: &[ModulePath],
    graph: &mut Graph,
    options: &TraverseOptions,
) -> Result<GraphDelta> {
    let mut state = TraversalState::new(options);

    let mut work: Vec<ModulePath> = Vec::new();
    for path in paths {
        if (graph.contains(path) || graph.is_entry(path)) && !work.contains(path) {
            work.push(path.clone());
        }
    }

    tracing::debug!(dirty = work.len(), "incremental traversal");

    // Shallow resolution depends only on the collaborators, so every dirty
    // module's transform can start before any mutation is applied.
    for path in &work {
        state.prefetch_dirty(path);
    }

    for path in work {
        let outcome = if graph.contains(&path) {
            process_dirty(&mut state, graph, path).await
        } else if graph.is_entry(&path) {
            // A declared entry point not yet expanded.
            expand_module(&mut state, graph, path).await
        } else {
            // Released earlier in this batch by another dirty path.
            continue;
        };
        if let Err(err) = outcome {
            state.abort_inflight();
            return Err(err);
        }
    }

    state.sweep_stranded(graph);
    state.abort_inflight();
    Ok(state.into_delta())
}

/// Working state for one traversal call. Dropped when the call returns.
struct TraversalState {
    resolver: Arc<dyn Resolve>,
    transformer: Arc<dyn Transform>,
    on_progress: Option<ProgressSink>,
    /// Shallow resolutions in flight, keyed by module path. Consumed in
    /// slot order by the serialized apply loop; leftovers are aborted.
    inflight: FxIndexMap<ModulePath, JoinHandle<Result<ResolvedModule>>>,
    progress: ProgressCounter,
    /// Records created this call, in discovery order.
    added: FxIndexSet<ModulePath>,
    /// Pre-existing dirty records re-transformed this call, caller order.
    retransformed: FxIndexSet<ModulePath>,
    /// Records released this call.
    deleted: FxIndexSet<ModulePath>,
    /// Modules whose inverse set shrank without emptying; a cycle that
    /// lost its last external referrer hides among these.
    sweep_candidates: FxIndexSet<ModulePath>,
}

impl TraversalState {
    fn new(options: &TraverseOptions) -> Self {
        Self {
            resolver: Arc::clone(&options.resolver),
            transformer: Arc::clone(&options.transformer),
            on_progress: options.on_progress.clone(),
            inflight: FxIndexMap::default(),
            progress: ProgressCounter::default(),
            added: FxIndexSet::default(),
            retransformed: FxIndexSet::default(),
            deleted: FxIndexSet::default(),
            sweep_candidates: FxIndexSet::default(),
        }
    }

    fn spawn_shallow(&self, path: &ModulePath) -> JoinHandle<Result<ResolvedModule>> {
        tokio::spawn(resolve_shallow(
            Arc::clone(&self.resolver),
            Arc::clone(&self.transformer),
            path.clone(),
        ))
    }

    /// Start shallow resolution for a module not yet in the graph.
    fn prefetch(&mut self, path: &ModulePath, graph: &Graph) {
        if graph.contains(path) || self.inflight.contains_key(path) {
            return;
        }
        let handle = self.spawn_shallow(path);
        self.inflight.insert(path.clone(), handle);
    }

    /// Start shallow resolution for a dirty module regardless of presence.
    fn prefetch_dirty(&mut self, path: &ModulePath) {
        if self.inflight.contains_key(path) {
            return;
        }
        let handle = self.spawn_shallow(path);
        self.inflight.insert(path.clone(), handle);
    }

    /// Await the module's shallow resolution, starting it if nothing was
    /// prefetched for this path.
    async fn shallow(&mut self, path: &ModulePath) -> Result<ResolvedModule> {
        let handle = match self.inflight.shift_remove(path) {
            Some(handle) => handle,
            None => self.spawn_shallow(path),
        };
        match handle.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => unreachable!("shallow resolution task cancelled while awaited"),
        }
    }

    fn abort_inflight(&mut self) {
        for (_, handle) in self.inflight.drain(..) {
            handle.abort();
        }
    }

    fn record_created(&mut self, path: &ModulePath) {
        // Released and re-discovered within one batch cancels out; the
        // caller sees neither an addition nor a deletion.
        if !self.deleted.shift_remove(path) {
            self.added.insert(path.clone());
        }
    }

    fn record_released(&mut self, path: &ModulePath) {
        self.retransformed.shift_remove(path);
        self.sweep_candidates.shift_remove(path);
        // Created and released within one batch cancels out as well.
        if !self.added.shift_remove(path) {
            self.deleted.insert(path.clone());
        }
    }

    /// Drop the edge `from -> target` unless another name in `from`'s
    /// current list still points at `target`.
    fn remove_edge(&mut self, graph: &mut Graph, from: &ModulePath, target: &ModulePath) {
        if graph
            .module(from)
            .is_some_and(|module| module.targets(target))
        {
            return;
        }
        let Some(record) = graph.module_mut(target) else {
            // Already released earlier in this batch.
            return;
        };
        if record.remove_inverse(from) {
            if !graph.is_entry(target) {
                self.release_module(graph, target.clone());
            }
        } else if !graph.is_entry(target) {
            self.sweep_candidates.insert(target.clone());
        }
    }

    /// Remove a module whose last referrer disappeared, cascading into any
    /// child this release orphans. Outbound edges are disconnected first,
    /// so a cycle entered through its empty node collapses entirely.
    fn release_module(&mut self, graph: &mut Graph, path: ModulePath) {
        let record = graph
            .remove_module(&path)
            .expect("released module must still be present");
        tracing::debug!(module = %path, "released module");
        self.record_released(&path);

        let mut dropped: FxHashSet<&ModulePath> = FxHashSet::default();
        for (_, target) in record.dependencies() {
            if !dropped.insert(target) {
                // Second alias to the same target; its inverse reference
                // was already dropped.
                continue;
            }
            let Some(child) = graph.module_mut(target) else {
                continue;
            };
            if child.remove_inverse(&path) {
                if !graph.is_entry(target) {
                    self.release_module(graph, target.clone());
                }
            } else if !graph.is_entry(target) {
                self.sweep_candidates.insert(target.clone());
            }
        }
    }

    /// Release cycles stranded by reference counting. A module that kept
    /// referrers but lost its path from the entries is garbage; releasing
    /// stranded modules in store order keeps the outcome deterministic.
    fn sweep_stranded(&mut self, graph: &mut Graph) {
        self.sweep_candidates.retain(|path| graph.contains(path));
        if self.sweep_candidates.is_empty() {
            return;
        }

        let reachable = graph.reachable_from_entries();
        let stranded: Vec<ModulePath> = graph
            .module_paths()
            .filter(|path| !reachable.contains(*path))
            .cloned()
            .collect();

        for path in stranded {
            if graph.contains(&path) {
                self.release_module(graph, path);
            }
        }
        self.sweep_candidates.clear();
    }

    fn into_delta(self) -> GraphDelta {
        let mut added = self.added;
        added.extend(self.retransformed);
        GraphDelta {
            added,
            deleted: self.deleted,
        }
    }
}

/// Expand a module not yet present in the graph: create its record at the
/// next store position, then apply its children in list order, recursing
/// into targets seen for the first time.
fn expand_module<'a>(
    state: &'a mut TraversalState,
    graph: &'a mut Graph,
    path: ModulePath,
) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        tracing::trace!(module = %path, "expanding module");
        state.progress.discovered(&state.on_progress);

        let resolved = state.shallow(&path).await?;
        let ResolvedModule {
            dependencies,
            output,
            ..
        } = resolved;

        state.record_created(&path);
        let mut module = Module::new(path.clone(), output);
        module.set_dependencies(dependencies.iter().cloned());
        graph.insert_module(module);

        // Reserve sibling slots: start shallow resolution for every
        // unknown target now, so transforms overlap while results are
        // applied in list order below.
        for dep in &dependencies {
            state.prefetch(&dep.path, graph);
        }
        state.progress.finished(&state.on_progress);

        for dep in dependencies {
            if !graph.contains(&dep.path) {
                expand_module(&mut *state, &mut *graph, dep.path.clone()).await?;
            }
            graph
                .module_mut(&dep.path)
                .expect("expanded dependency target must be present")
                .add_inverse(path.clone());
        }

        Ok(())
    })
}

/// Re-transform a dirty module already in the graph and reconcile its edge
/// churn: additions first (expanding unknown subtrees), then removals with
/// reference-counted release.
async fn process_dirty(
    state: &mut TraversalState,
    graph: &mut Graph,
    path: ModulePath,
) -> Result<()> {
    tracing::trace!(module = %path, "re-transforming dirty module");
    state.progress.discovered(&state.on_progress);

    // Shallow resolution completes wholly before any mutation, so a
    // collaborator failure here leaves the module untouched.
    let resolved = state.shallow(&path).await?;
    let ResolvedModule {
        dependencies: new_list,
        output,
        ..
    } = resolved;

    let old: FxIndexMap<String, ModulePath> = graph
        .module(&path)
        .expect("dirty module must be present")
        .dependency_map()
        .clone();
    let new_map: FxIndexMap<String, ModulePath> = new_list
        .iter()
        .map(|dep| (dep.name.clone(), dep.path.clone()))
        .collect();

    // Diff by (name, target) pair so two names resolving to the same
    // target stay independent edges.
    let mut to_add: Vec<Dependency> = Vec::new();
    for dep in &new_list {
        if old.get(&dep.name) != Some(&dep.path) {
            to_add.push(dep.clone());
        }
    }
    let mut to_remove: Vec<ModulePath> = Vec::new();
    for (name, target) in &old {
        if new_map.get(name) != Some(target) {
            to_remove.push(target.clone());
        }
    }

    for dep in &to_add {
        state.prefetch(&dep.path, graph);
    }
    state.progress.finished(&state.on_progress);

    // Expand every unknown target before the record is touched. A
    // collaborator failure in here leaves the stored list as it was, so a
    // retried batch recomputes the same diff and hits the same failure.
    for dep in &to_add {
        if !graph.contains(&dep.path) {
            expand_module(state, graph, dep.path.clone()).await?;
        }
    }

    // No collaborator calls from here on; the edge churn applies whole.
    for dep in &to_add {
        graph
            .module_mut(&dep.path)
            .expect("expanded dependency target must be present")
            .add_inverse(path.clone());
    }

    // The record adopts its new list and output; the alias-retention check
    // during removals reads the post-update list.
    {
        let record = graph
            .module_mut(&path)
            .expect("dirty module must be present");
        record.set_dependencies(new_list.iter().cloned());
        record.set_output(output);
    }

    for target in to_remove {
        state.remove_edge(graph, &path, &target);
    }

    if graph.contains(&path) {
        state.retransformed.insert(path);
    }

    Ok(())
}
