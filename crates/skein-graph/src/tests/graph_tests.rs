use super::{key_order, path};
use crate::module::{Dependency, Module, TransformOutput};
use crate::Graph;

fn raw_module(graph: &mut Graph, p: &str, deps: &[(&str, &str)]) {
    let mut module = Module::new(path(p), TransformOutput::default());
    module.set_dependencies(
        deps.iter()
            .map(|(name, target)| Dependency::new(*name, *target)),
    );
    graph.insert_module(module);
}

#[test]
fn modules_iterate_in_insertion_order() {
    let mut graph = Graph::new([path("/a")]);
    raw_module(&mut graph, "/c", &[]);
    raw_module(&mut graph, "/a", &[]);
    raw_module(&mut graph, "/b", &[]);

    assert_eq!(key_order(&graph), ["/c", "/a", "/b"]);
    assert_eq!(graph.len(), 3);
}

#[test]
fn remove_preserves_order_of_the_rest() {
    let mut graph = Graph::new([path("/a")]);
    raw_module(&mut graph, "/a", &[]);
    raw_module(&mut graph, "/b", &[]);
    raw_module(&mut graph, "/c", &[]);

    graph.remove_module(&path("/b"));
    assert_eq!(key_order(&graph), ["/a", "/c"]);
}

#[test]
fn entry_points_keep_declaration_order() {
    let mut graph = Graph::new([path("/b"), path("/a")]);
    assert_eq!(graph.entry_points(), [path("/b"), path("/a")]);
    assert!(graph.is_entry(&path("/a")));
    assert!(!graph.is_entry(&path("/c")));

    graph.add_entry_point(path("/c"));
    graph.add_entry_point(path("/a"));
    assert_eq!(graph.entry_points().len(), 3);
}

#[test]
fn depends_on_detects_transitive_edges() {
    let mut graph = Graph::new([path("/a")]);
    raw_module(&mut graph, "/a", &[("b", "/b")]);
    raw_module(&mut graph, "/b", &[("c", "/c")]);
    raw_module(&mut graph, "/c", &[]);

    assert!(graph.depends_on(&path("/a"), &path("/c")));
    assert!(!graph.depends_on(&path("/c"), &path("/a")));
}

#[test]
fn depends_on_handles_cycles_without_infinite_loop() {
    let mut graph = Graph::new([path("/a")]);
    raw_module(&mut graph, "/a", &[("b", "/b")]);
    raw_module(&mut graph, "/b", &[("a", "/a")]);

    assert!(graph.depends_on(&path("/a"), &path("/b")));
    assert!(graph.depends_on(&path("/b"), &path("/a")));
}

#[test]
fn transitive_dependencies_collects_unique_paths() {
    let mut graph = Graph::new([path("/a")]);
    raw_module(&mut graph, "/a", &[("b", "/b"), ("c", "/c")]);
    raw_module(&mut graph, "/b", &[("d", "/d")]);
    raw_module(&mut graph, "/c", &[("d", "/d")]);
    raw_module(&mut graph, "/d", &[]);

    let deps = graph.transitive_dependencies(&path("/a"));
    assert_eq!(deps.len(), 3);
    assert!(deps.contains(&path("/b")));
    assert!(deps.contains(&path("/c")));
    assert!(deps.contains(&path("/d")));
}
