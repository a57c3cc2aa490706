//! Collaborator seam: resolution and transformation of modules.
//!
//! The graph never touches the filesystem. Resolution (specifier name to
//! canonical path) and transformation (path to code plus dependency names)
//! are supplied by the caller behind the [`Resolve`] and [`Transform`]
//! traits, and the engine only composes them into per-module shallow
//! resolution steps.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future;
use thiserror::Error;

use crate::module::{Dependency, TransformOutput};
use crate::module_path::ModulePath;
use crate::progress::ProgressSink;
use crate::Result;

/// Resolution failure reported by the resolver collaborator.
#[derive(Debug, Clone, Error)]
#[error("cannot resolve '{specifier}' from '{from}': {reason}")]
pub struct ResolveError {
    pub from: ModulePath,
    pub specifier: String,
    pub reason: String,
}

impl ResolveError {
    pub fn new(
        from: impl Into<ModulePath>,
        specifier: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            specifier: specifier.into(),
            reason: reason.into(),
        }
    }
}

/// Transformation failure reported by the transformer collaborator.
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    /// The module file could not be read.
    #[error("failed to read '{path}': {message}")]
    Io { path: ModulePath, message: String },

    /// The module source could not be parsed.
    #[error("failed to parse '{path}': {message}")]
    Parse { path: ModulePath, message: String },
}

/// Maps a dependency specifier, as written in a module's source, to the
/// canonical path of the target module.
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve(
        &self,
        from: &ModulePath,
        specifier: &str,
    ) -> std::result::Result<ModulePath, ResolveError>;
}

/// Produces a module's dependency specifiers (in source textual order) and
/// its opaque output artifact.
#[async_trait]
pub trait Transform: Send + Sync {
    async fn transform(
        &self,
        path: &ModulePath,
    ) -> std::result::Result<TransformResult, TransformError>;
}

/// Result of transforming a single module.
#[derive(Debug, Clone)]
pub struct TransformResult {
    /// Dependency specifiers in the order they appear in source.
    pub dependencies: Vec<String>,
    pub output: TransformOutput,
}

/// Collaborators and hooks for one traversal call.
#[derive(Clone)]
pub struct TraverseOptions {
    pub(crate) resolver: Arc<dyn Resolve>,
    pub(crate) transformer: Arc<dyn Transform>,
    pub(crate) on_progress: Option<ProgressSink>,
}

impl TraverseOptions {
    pub fn new(resolver: Arc<dyn Resolve>, transformer: Arc<dyn Transform>) -> Self {
        Self {
            resolver,
            transformer,
            on_progress: None,
        }
    }

    /// Install a progress sink; see [`ProgressSink`] for the event contract.
    pub fn with_progress(mut self, sink: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(sink));
        self
    }
}

impl std::fmt::Debug for TraverseOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraverseOptions")
            .field("on_progress", &self.on_progress.is_some())
            .finish_non_exhaustive()
    }
}

/// A module's freshly computed shallow view: resolved dependency list in
/// textual order plus the transform output.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedModule {
    pub dependencies: Vec<Dependency>,
    pub output: TransformOutput,
}

/// Transform one module and resolve each of its dependency names.
///
/// Name resolutions run concurrently but the output list follows the
/// textual order of the transform result, and when several resolutions
/// fail the error reported is the first one in that order. Nothing here
/// depends on completion order.
pub(crate) async fn resolve_shallow(
    resolver: Arc<dyn Resolve>,
    transformer: Arc<dyn Transform>,
    path: ModulePath,
) -> Result<ResolvedModule> {
    let result = transformer.transform(&path).await?;

    let lookups = result.dependencies.iter().map(|name| {
        let resolver = Arc::clone(&resolver);
        let from = path.clone();
        async move {
            resolver
                .resolve(&from, name)
                .await
                .map(|target| Dependency::new(name.clone(), target))
        }
    });

    let mut dependencies = Vec::with_capacity(result.dependencies.len());
    for resolution in future::join_all(lookups).await {
        dependencies.push(resolution?);
    }

    Ok(ResolvedModule {
        dependencies,
        output: result.output,
    })
}
