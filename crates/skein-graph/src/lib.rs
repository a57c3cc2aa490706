//! # skein-graph
//!
//! Incremental module dependency graph for the skein bundler.
//!
//! From a set of entry paths, the traversal engine drives the caller's
//! resolver and transformer to discover every reachable module and records
//! each module's dependency list in source textual order. Later calls take
//! a batch of dirty paths and compute the minimal delta - modules added
//! and modules whose last referrer disappeared - while keeping the store's
//! iteration order deterministic regardless of how collaborator I/O
//! interleaves.
//!
//! Resolution, transformation, file watching and caching live behind the
//! [`Resolve`] and [`Transform`] seams; this crate never touches the
//! filesystem and never serializes the graph.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use skein_graph::{
//!     initial_traverse_dependencies, traverse_dependencies, Graph, ModulePath,
//!     Resolve, Transform, TraverseOptions,
//! };
//!
//! # async fn example(resolver: Arc<dyn Resolve>, transformer: Arc<dyn Transform>)
//! # -> skein_graph::Result<()> {
//! let options = TraverseOptions::new(resolver, transformer)
//!     .with_progress(|finished, discovered| {
//!         eprintln!("{finished}/{discovered}");
//!     });
//!
//! let mut graph = Graph::new([ModulePath::new("/index.js")]);
//! let delta = initial_traverse_dependencies(&mut graph, &options).await?;
//! assert_eq!(delta.added_count(), graph.len());
//!
//! // ...the file watcher reports /index.js changed...
//! let dirty = [ModulePath::new("/index.js")];
//! let delta = traverse_dependencies(&dirty, &mut graph, &options).await?;
//! for path in delta.deleted() {
//!     eprintln!("dropped {path}");
//! }
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

mod delta;
mod graph;
mod module;
mod module_path;
mod progress;
mod reorder;
mod resolve;
mod traversal;

#[cfg(feature = "logging")]
pub mod logging;
#[cfg(feature = "logging")]
pub use logging::init_tracing;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use delta::GraphDelta;
pub use graph::Graph;
pub use module::{Dependency, Module, SourceType, TransformOutput};
pub use module_path::ModulePath;
pub use progress::ProgressSink;
pub use reorder::reorder_graph;
pub use resolve::{
    Resolve, ResolveError, Transform, TransformError, TransformResult, TraverseOptions,
};
pub use traversal::{initial_traverse_dependencies, traverse_dependencies};

/// Insertion-ordered map with Fx hashing.
pub type FxIndexMap<K, V> = indexmap::IndexMap<K, V, rustc_hash::FxBuildHasher>;
/// Insertion-ordered set with Fx hashing.
pub type FxIndexSet<T> = indexmap::IndexSet<T, rustc_hash::FxBuildHasher>;

/// Error surfaced by a traversal call.
///
/// Collaborator failures are reported verbatim; retrying against an
/// unchanged world reproduces the same error.
#[derive(Debug, Clone, Error)]
pub enum TraversalError {
    /// The resolver could not map a dependency specifier to a module.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The transformer could not read or parse a module.
    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Result type alias for skein-graph operations.
pub type Result<T> = std::result::Result<T, TraversalError>;

#[cfg(test)]
mod tests;
