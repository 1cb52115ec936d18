//! Shared fixtures for flight-manifest integration tests.
//!
//! Graphs are laid out like a real app-router build: one chunk group per
//! route, each with a synthetic client-entry boundary module whose edges
//! point at the client modules of that route.

#![allow(dead_code)]

use flight_graph::{Chunk, ChunkGroup, ChunkRef, MemoryGraph, Module, ModuleId, ModuleRef};
use flight_manifest::{ManifestConfig, ManifestSettings};

pub const CLIENT_LAYER: &str = "app-client";

pub const ENTRY_LOADER: &str =
    "/proj/node_modules/next/dist/build/webpack/loaders/next-flight-client-entry-loader.js";

/// Config rooted at `/proj/app`, aliases on.
pub fn test_config() -> ManifestConfig {
    ManifestConfig::new("/proj/app")
}

pub fn test_settings() -> ManifestSettings {
    test_config().compile().expect("test config compiles")
}

/// The synthetic boundary module the client-entry loader creates.
pub fn boundary_module(route: &str) -> Module {
    Module::normal(ENTRY_LOADER)
        .layer(CLIENT_LAYER)
        .request(format!("{ENTRY_LOADER}?modules={route}&server=false"))
        .build()
}

/// A client component living at `resource`.
pub fn client_module(resource: &str) -> Module {
    Module::normal(resource).layer(CLIENT_LAYER).build()
}

/// Add a chunk group `name` made of `chunk`, with a boundary module as the
/// chunk's entry. Returns the boundary module and the chunk.
pub fn add_route(graph: &mut MemoryGraph, name: &str, chunk: Chunk) -> (ModuleRef, ChunkRef) {
    let chunk = graph.add_chunk(chunk).expect("add chunk");
    let boundary = graph
        .add_module(boundary_module(name))
        .expect("add boundary module");
    graph
        .add_entry_module(chunk, boundary)
        .expect("add entry module");
    graph
        .add_chunk_group(ChunkGroup::new(name).with_chunk(chunk))
        .expect("add chunk group");
    (boundary, chunk)
}

/// Add `module` with browser id `id` and an edge from `boundary` to it.
pub fn add_client_module(
    graph: &mut MemoryGraph,
    boundary: ModuleRef,
    module: Module,
    id: impl Into<ModuleId>,
) -> ModuleRef {
    let module = graph
        .add_module_with_id(module, id)
        .expect("add client module");
    graph
        .add_dependency(boundary, module)
        .expect("add dependency");
    module
}

/// The documented single-route build: `app/page` with chunk 7 and one
/// `Button` client component with id 42.
pub fn page_graph() -> MemoryGraph {
    let mut graph = MemoryGraph::new();
    let (boundary, _) = add_route(
        &mut graph,
        "app/page",
        Chunk::new(7u64)
            .with_name("app/page")
            .with_files(["static/chunks/7.js", "static/css/app/page.css"]),
    );
    add_client_module(
        &mut graph,
        boundary,
        client_module("/proj/components/Button.js"),
        42u64,
    );
    graph
}

/// `sep`-joined absolute path, matching how entry names are rendered.
pub fn native_path(parts: &[&str]) -> String {
    let sep = std::path::MAIN_SEPARATOR.to_string();
    format!("{sep}{}", parts.join(&sep))
}
