//! Property-based tests for manifest assembly using proptest.
//!
//! Graphs are generated as a list of routes, each with a chunk and a set of
//! client modules, and a registry that knows some of those modules.

mod helpers;

use std::collections::HashMap;

use flight_graph::{Chunk, MemoryGraph};
use flight_manifest::{
    ClientReferenceManifest, ManifestAssembler, ModuleIdRegistry, ModuleKey, ServerRuntime,
};
use helpers::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Route {
    segment: String,
    chunk_id: u64,
    /// (path below `/proj/src`, browser id, known to the default server)
    modules: Vec<(String, u64, bool)>,
}

fn path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,8}", 1..=3).prop_map(|parts| format!("{}.js", parts.join("/")))
}

fn route_strategy() -> impl Strategy<Value = Route> {
    (
        "[a-z]{1,8}",
        0u64..1000,
        prop::collection::vec((path_strategy(), 0u64..50, prop::bool::ANY), 0..=6),
    )
        .prop_map(|(segment, chunk_id, modules)| Route {
            segment,
            chunk_id,
            modules,
        })
}

fn build(routes: &[Route]) -> (MemoryGraph, ModuleIdRegistry) {
    let mut graph = MemoryGraph::new();
    let registry = ModuleIdRegistry::new();
    // A file keeps one browser id for the whole compilation.
    let mut ids: HashMap<&str, u64> = HashMap::new();

    for route in routes {
        let (boundary, _) = add_route(
            &mut graph,
            &format!("app/{}/page", route.segment),
            Chunk::new(route.chunk_id).with_file(format!("static/chunks/{}.js", route.chunk_id)),
        );
        for (path, id, known) in &route.modules {
            let id = *ids.entry(path.as_str()).or_insert(*id);
            let resource = format!("/proj/src/{path}");
            add_client_module(&mut graph, boundary, client_module(&resource), id);
            if *known {
                registry.record_server_module(
                    ServerRuntime::Nodejs,
                    ModuleKey::new(format!("./src/{path}")),
                    format!("s-{id}"),
                );
            }
        }
    }

    (graph, registry)
}

fn assemble(graph: &MemoryGraph, registry: &ModuleIdRegistry) -> ClientReferenceManifest {
    let settings = test_config()
        .runtime_aliases(Vec::new())
        .compile()
        .unwrap();
    ManifestAssembler::new(&settings)
        .assemble(graph, &registry.snapshot())
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: the same compilation always serializes to the same bytes.
    #[test]
    fn prop_output_is_deterministic(routes in prop::collection::vec(route_strategy(), 0..=5)) {
        let (first_graph, first_registry) = build(&routes);
        let (second_graph, second_registry) = build(&routes);

        let first = assemble(&first_graph, &first_registry);
        let second = assemble(&second_graph, &second_registry);

        prop_assert_eq!(first.to_json(false).unwrap(), second.to_json(false).unwrap());
        prop_assert_eq!(first.to_json(true).unwrap(), second.to_json(true).unwrap());
    }

    /// Property: every client module appears exactly once, keyed by resource.
    #[test]
    fn prop_client_modules_are_deduplicated(routes in prop::collection::vec(route_strategy(), 1..=5)) {
        let (graph, registry) = build(&routes);
        let manifest = assemble(&graph, &registry);

        let mut expected: Vec<String> = routes
            .iter()
            .flat_map(|route| route.modules.iter().map(|(path, _, _)| format!("/proj/src/{path}")))
            .collect();
        expected.sort();
        expected.dedup();

        prop_assert_eq!(manifest.client_modules.keys().cloned().collect::<Vec<_>>(), expected);
    }

    /// Property: server records never list chunks, and always point back at
    /// a browser id present in clientModules.
    #[test]
    fn prop_server_mapping_is_consistent(routes in prop::collection::vec(route_strategy(), 1..=5)) {
        let (graph, registry) = build(&routes);
        let manifest = assemble(&graph, &registry);

        let browser_ids: Vec<String> = manifest
            .client_modules
            .values()
            .map(|entry| entry.id.to_string())
            .collect();

        for (browser_id, node) in &manifest.ssr_module_mapping {
            prop_assert!(browser_ids.contains(browser_id));
            for entry in node.values() {
                prop_assert!(entry.chunks.is_empty());
                prop_assert_eq!(entry.name.as_str(), "*");
            }
        }
        prop_assert!(manifest.edge_ssr_module_mapping.is_empty());
    }

    /// Property: one CSS entry per route group, whatever its contents.
    #[test]
    fn prop_every_route_has_a_css_entry(routes in prop::collection::vec(route_strategy(), 0..=5)) {
        let (graph, registry) = build(&routes);
        let manifest = assemble(&graph, &registry);

        let mut segments: Vec<&str> = routes.iter().map(|route| route.segment.as_str()).collect();
        segments.sort();
        segments.dedup();

        prop_assert_eq!(manifest.entry_css_files.len(), segments.len());
        prop_assert!(manifest.entry_css_files.values().all(Vec::is_empty));
    }

    /// Property: module keys do not depend on the path separator.
    #[test]
    fn prop_module_key_is_separator_independent(parts in prop::collection::vec("[A-Za-z0-9_.-]{1,10}", 1..=5)) {
        prop_assume!(parts.iter().all(|part| part != "." && part != ".."));

        let posix = ModuleKey::from_resource("/proj", &format!("/proj/{}", parts.join("/")));
        let windows = ModuleKey::from_resource("\\proj", &format!("\\proj\\{}", parts.join("\\")));

        prop_assert_eq!(&posix, &windows);
        prop_assert!(posix.as_str().starts_with("./"));
        prop_assert!(!posix.as_str().contains('\\'));
    }
}
