//! Test fixtures: an in-memory collaborator world and graph checkers.
//!
//! `TestWorld` stands in for the resolver and transformer: tests declare
//! modules with named dependencies, optionally alias specifiers, inject
//! per-module transform delays to simulate I/O jitter, and remove or break
//! modules between traversals to exercise failure paths.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::graph::Graph;
use crate::module::{SourceType, TransformOutput};
use crate::module_path::ModulePath;
use crate::resolve::{
    Resolve, ResolveError, Transform, TransformError, TransformResult, TraverseOptions,
};

#[derive(Debug, Clone)]
struct WorldModule {
    dependencies: Vec<String>,
    code: String,
    delay: Option<Duration>,
    broken: bool,
}

/// Declarative in-memory module world implementing both collaborators.
///
/// Dependency specifiers resolve to `/<specifier>` unless an alias says
/// otherwise, and only to modules that exist in the world.
#[derive(Debug, Default)]
pub struct TestWorld {
    modules: RwLock<FxHashMap<ModulePath, WorldModule>>,
    aliases: RwLock<FxHashMap<String, ModulePath>>,
}

impl TestWorld {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Define or replace a module with the given dependency specifiers.
    pub fn module(&self, path: &str, dependencies: &[&str]) {
        self.modules.write().insert(
            ModulePath::new(path),
            WorldModule {
                dependencies: dependencies.iter().map(|name| name.to_string()).collect(),
                code: format!("// {path}"),
                delay: None,
                broken: false,
            },
        );
    }

    /// Route a specifier to an explicit target path.
    pub fn alias(&self, specifier: &str, target: &str) {
        self.aliases
            .write()
            .insert(specifier.to_string(), ModulePath::new(target));
    }

    /// Delay this module's transform to simulate slow I/O.
    pub fn delay(&self, path: &str, delay: Duration) {
        if let Some(module) = self.modules.write().get_mut(path) {
            module.delay = Some(delay);
        }
    }

    /// Make this module's transform fail with a parse error.
    pub fn break_transform(&self, path: &str) {
        if let Some(module) = self.modules.write().get_mut(path) {
            module.broken = true;
        }
    }

    /// Delete a module from the world; resolutions against it now fail.
    pub fn remove(&self, path: &str) {
        self.modules.write().remove(path);
    }

    fn target_for(&self, specifier: &str) -> ModulePath {
        if let Some(target) = self.aliases.read().get(specifier) {
            target.clone()
        } else {
            ModulePath::new(format!("/{specifier}"))
        }
    }
}

#[async_trait]
impl Resolve for TestWorld {
    async fn resolve(
        &self,
        from: &ModulePath,
        specifier: &str,
    ) -> Result<ModulePath, ResolveError> {
        let target = self.target_for(specifier);
        if self.modules.read().contains_key(&target) {
            Ok(target)
        } else {
            Err(ResolveError::new(
                from.clone(),
                specifier,
                "module does not exist",
            ))
        }
    }
}

#[async_trait]
impl Transform for TestWorld {
    async fn transform(&self, path: &ModulePath) -> Result<TransformResult, TransformError> {
        let module = {
            let modules = self.modules.read();
            match modules.get(path) {
                Some(module) => module.clone(),
                None => {
                    return Err(TransformError::Io {
                        path: path.clone(),
                        message: "no such file".to_string(),
                    })
                }
            }
        };

        if let Some(delay) = module.delay {
            tokio::time::sleep(delay).await;
        }

        if module.broken {
            return Err(TransformError::Parse {
                path: path.clone(),
                message: "unexpected token".to_string(),
            });
        }

        Ok(TransformResult {
            dependencies: module.dependencies,
            output: TransformOutput {
                code: module.code,
                source_map: None,
                source_type: SourceType::from_path(std::path::Path::new(path.as_str())),
            },
        })
    }
}

/// Traversal options backed by a world.
pub fn options_for(world: &Arc<TestWorld>) -> TraverseOptions {
    TraverseOptions::new(
        Arc::clone(world) as Arc<dyn Resolve>,
        Arc::clone(world) as Arc<dyn Transform>,
    )
}

/// Shared log of `(finished, discovered)` progress events.
pub type ProgressLog = Arc<Mutex<Vec<(usize, usize)>>>;

/// A progress log plus a closure to hand to `TraverseOptions::with_progress`.
pub fn progress_recorder() -> (ProgressLog, impl Fn(usize, usize) + Send + Sync + 'static) {
    let log: ProgressLog = Arc::new(Mutex::new(Vec::new()));
    let sink_log = Arc::clone(&log);
    let sink = move |finished: usize, discovered: usize| {
        sink_log.lock().push((finished, discovered));
    };
    (log, sink)
}

/// Full structural snapshot: (path, ordered dependency list, sorted inverse
/// set) per module, in store order.
pub type GraphSnapshot = Vec<(String, Vec<(String, String)>, Vec<String>)>;

pub fn graph_snapshot(graph: &Graph) -> GraphSnapshot {
    graph
        .modules()
        .map(|module| {
            let dependencies = module
                .dependencies()
                .map(|(name, target)| (name.to_string(), target.to_string()))
                .collect();
            let mut inverse: Vec<String> = module
                .inverse_dependencies()
                .iter()
                .map(|path| path.to_string())
                .collect();
            inverse.sort();
            (module.path().to_string(), dependencies, inverse)
        })
        .collect()
}

/// Check the referential invariants the engine must uphold between calls.
pub fn assert_graph_invariants(graph: &Graph) {
    for module in graph.modules() {
        for (name, target) in module.dependencies() {
            let record = graph.module(target).unwrap_or_else(|| {
                panic!(
                    "edge {} -> {} ('{}') points at a missing module",
                    module.path(),
                    target,
                    name
                )
            });
            assert!(
                record.inverse_dependencies().contains(module.path()),
                "{} lists {} but the reverse edge is missing",
                module.path(),
                target
            );
        }
        for referrer in module.inverse_dependencies() {
            let record = graph.module(referrer).unwrap_or_else(|| {
                panic!(
                    "{} names missing referrer {}",
                    module.path(),
                    referrer
                )
            });
            assert!(
                record.targets(module.path()),
                "{} claims referrer {} which holds no such edge",
                module.path(),
                referrer
            );
        }
        if !graph.is_entry(module.path()) {
            assert!(
                !module.inverse_dependencies().is_empty(),
                "non-entry {} has no referrers",
                module.path()
            );
        }
    }

    let reachable = graph.reachable_from_entries();
    for path in graph.module_paths() {
        assert!(
            reachable.contains(path),
            "{} is stored but unreachable from the entry points",
            path
        );
    }
}
