use std::sync::Arc;
use std::time::Duration;

use super::{key_order, path, paths};
use crate::test_utils::{assert_graph_invariants, options_for, TestWorld};
use crate::{initial_traverse_dependencies, Graph, SourceType, TraversalError};

fn bundle_world() -> Arc<TestWorld> {
    let world = TestWorld::new();
    world.module("/bundle", &["foo"]);
    world.module("/foo", &["bar", "baz"]);
    world.module("/bar", &[]);
    world.module("/baz", &[]);
    world
}

#[tokio::test]
async fn initial_traversal_discovers_everything_in_order() {
    let world = bundle_world();
    let mut graph = Graph::new([path("/bundle")]);

    let delta = initial_traverse_dependencies(&mut graph, &options_for(&world))
        .await
        .unwrap();

    assert_eq!(paths(delta.added()), ["/bundle", "/foo", "/bar", "/baz"]);
    assert!(delta.deleted().is_empty());
    assert_eq!(key_order(&graph), ["/bundle", "/foo", "/bar", "/baz"]);
    assert_graph_invariants(&graph);
}

#[tokio::test]
async fn initial_traversal_links_inverse_edges() {
    let world = bundle_world();
    let mut graph = Graph::new([path("/bundle")]);
    initial_traverse_dependencies(&mut graph, &options_for(&world))
        .await
        .unwrap();

    let foo = graph.module(&path("/foo")).unwrap();
    assert!(foo.inverse_dependencies().contains(&path("/bundle")));
    let bar = graph.module(&path("/bar")).unwrap();
    assert!(bar.inverse_dependencies().contains(&path("/foo")));
    // Entry points have no parents; a synthetic reference protects them.
    let bundle = graph.module(&path("/bundle")).unwrap();
    assert!(bundle.inverse_dependencies().is_empty());
}

#[tokio::test]
async fn shared_dependency_is_discovered_once() {
    let world = TestWorld::new();
    world.module("/bundle", &["a", "b"]);
    world.module("/a", &["shared"]);
    world.module("/b", &["shared"]);
    world.module("/shared", &[]);

    let mut graph = Graph::new([path("/bundle")]);
    let delta = initial_traverse_dependencies(&mut graph, &options_for(&world))
        .await
        .unwrap();

    assert_eq!(paths(delta.added()), ["/bundle", "/a", "/shared", "/b"]);
    let shared = graph.module(&path("/shared")).unwrap();
    assert_eq!(shared.inverse_dependencies().len(), 2);
    assert_graph_invariants(&graph);
}

#[tokio::test]
async fn cycles_terminate_and_link_back() {
    let world = TestWorld::new();
    world.module("/bundle", &["a"]);
    world.module("/a", &["b"]);
    world.module("/b", &["a"]);

    let mut graph = Graph::new([path("/bundle")]);
    let delta = initial_traverse_dependencies(&mut graph, &options_for(&world))
        .await
        .unwrap();

    assert_eq!(paths(delta.added()), ["/bundle", "/a", "/b"]);
    let a = graph.module(&path("/a")).unwrap();
    assert!(a.inverse_dependencies().contains(&path("/b")));
    assert_graph_invariants(&graph);
}

#[tokio::test]
async fn self_dependency_is_permitted() {
    let world = TestWorld::new();
    world.module("/loop", &["loop"]);

    let mut graph = Graph::new([path("/loop")]);
    initial_traverse_dependencies(&mut graph, &options_for(&world))
        .await
        .unwrap();

    let module = graph.module(&path("/loop")).unwrap();
    assert!(module.inverse_dependencies().contains(&path("/loop")));
    assert_graph_invariants(&graph);
}

#[tokio::test]
async fn duplicate_names_for_one_target_are_distinct_edges() {
    let world = bundle_world();
    world.alias("foo.js", "/foo");
    world.module("/bundle", &["foo.js", "foo"]);

    let mut graph = Graph::new([path("/bundle")]);
    initial_traverse_dependencies(&mut graph, &options_for(&world))
        .await
        .unwrap();

    let bundle = graph.module(&path("/bundle")).unwrap();
    let deps: Vec<(&str, &str)> = bundle
        .dependencies()
        .map(|(name, target)| (name, target.as_str()))
        .collect();
    assert_eq!(deps, [("foo.js", "/foo"), ("foo", "/foo")]);
    assert_graph_invariants(&graph);
}

#[tokio::test]
async fn transform_output_is_stored_verbatim() {
    let world = TestWorld::new();
    world.module("/entry.js", &["styles.css"]);
    world.module("/styles.css", &[]);

    let mut graph = Graph::new([path("/entry.js")]);
    initial_traverse_dependencies(&mut graph, &options_for(&world))
        .await
        .unwrap();

    let entry = graph.module(&path("/entry.js")).unwrap().output();
    assert_eq!(entry.code, "// /entry.js");
    assert_eq!(entry.source_type, SourceType::JavaScript);
    let styles = graph.module(&path("/styles.css")).unwrap().output();
    assert_eq!(styles.source_type, SourceType::Asset);
}

#[tokio::test]
async fn entry_reached_through_another_entry_is_not_expanded_twice() {
    let world = TestWorld::new();
    world.module("/bundle", &["second"]);
    world.module("/second", &[]);

    let mut graph = Graph::new([path("/bundle"), path("/second")]);
    let delta = initial_traverse_dependencies(&mut graph, &options_for(&world))
        .await
        .unwrap();

    assert_eq!(paths(delta.added()), ["/bundle", "/second"]);
    let second = graph.module(&path("/second")).unwrap();
    assert!(second.inverse_dependencies().contains(&path("/bundle")));
}

#[tokio::test]
async fn multiple_entries_expand_in_declaration_order() {
    let world = TestWorld::new();
    world.module("/bundle", &["foo"]);
    world.module("/foo", &["bar", "baz"]);
    world.module("/bar", &[]);
    world.module("/baz", &[]);
    world.module("/bundle-2", &["bar", "quux"]);
    world.module("/quux", &[]);

    let mut graph = Graph::new([path("/bundle"), path("/bundle-2")]);
    initial_traverse_dependencies(&mut graph, &options_for(&world))
        .await
        .unwrap();

    assert_eq!(
        key_order(&graph),
        ["/bundle", "/foo", "/bar", "/baz", "/bundle-2", "/quux"]
    );
    assert_graph_invariants(&graph);
}

#[tokio::test]
async fn key_order_is_independent_of_transform_jitter() {
    let delays: [&[(&str, u64)]; 3] = [
        &[("/foo", 40), ("/bar", 5)],
        &[("/bundle-2", 1), ("/quux", 1), ("/foo", 25)],
        &[("/baz", 30), ("/bar", 30), ("/bundle", 10)],
    ];

    let mut orders = Vec::new();
    for assignment in delays {
        let world = TestWorld::new();
        world.module("/bundle", &["foo"]);
        world.module("/foo", &["bar", "baz"]);
        world.module("/bar", &[]);
        world.module("/baz", &[]);
        world.module("/bundle-2", &["bar", "quux"]);
        world.module("/quux", &[]);
        for (p, millis) in assignment {
            world.delay(p, Duration::from_millis(*millis));
        }

        let mut graph = Graph::new([path("/bundle"), path("/bundle-2")]);
        initial_traverse_dependencies(&mut graph, &options_for(&world))
            .await
            .unwrap();
        orders.push(
            key_order(&graph)
                .into_iter()
                .map(str::to_string)
                .collect::<Vec<_>>(),
        );
    }

    assert_eq!(
        orders[0],
        ["/bundle", "/foo", "/bar", "/baz", "/bundle-2", "/quux"]
    );
    assert_eq!(orders[0], orders[1]);
    assert_eq!(orders[1], orders[2]);
}

#[tokio::test]
async fn failed_initial_traversal_leaves_the_graph_empty() {
    let world = bundle_world();
    world.remove("/baz");

    let mut graph = Graph::new([path("/bundle")]);
    let err = initial_traverse_dependencies(&mut graph, &options_for(&world))
        .await
        .unwrap_err();

    assert!(matches!(err, TraversalError::Resolve(_)));
    assert!(graph.is_empty());
}

#[tokio::test]
async fn transform_failures_surface_verbatim() {
    let world = bundle_world();
    world.break_transform("/foo");

    let mut graph = Graph::new([path("/bundle")]);
    let err = initial_traverse_dependencies(&mut graph, &options_for(&world))
        .await
        .unwrap_err();

    assert!(matches!(err, TraversalError::Transform(_)));
    assert!(graph.is_empty());
}
