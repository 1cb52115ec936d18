//! # flight-graph
//!
//! Read-only view of a finished bundler compilation, as consumed by the
//! client reference manifest pass.
//!
//! The bundler owns module graph construction, chunk optimization and file
//! emission. This crate only models what is left once that work is done:
//!
//! - **Chunk groups**: one per loadable entry point, listing member chunks in
//!   load order
//! - **Chunks**: an id, an optional name, and the files emitted for them
//! - **Modules**: layer, request, resource and the compound identifier, tagged
//!   with a [`ModuleKind`]
//! - **Edges**: outgoing [`Connection`]s, dependency resolution and bundler
//!   assigned [`ModuleId`]s
//!
//! Any bundler adapter implements [`CompilationGraph`]. [`MemoryGraph`] is the
//! in-memory implementation, buildable in code or loadable from JSON.
//!
//! ```rust
//! use flight_graph::{Chunk, ChunkGroup, CompilationGraph, MemoryGraph, Module};
//!
//! # fn main() -> Result<(), flight_graph::GraphError> {
//! let mut graph = MemoryGraph::new();
//! let button = graph.add_module_with_id(Module::normal("/proj/Button.js").build(), 42u64)?;
//! let chunk = graph.add_chunk(Chunk::new(7u64).with_file("static/chunks/7.js"))?;
//! graph.add_entry_module(chunk, button)?;
//! graph.add_chunk_group(ChunkGroup::new("app/page").with_chunk(chunk))?;
//!
//! assert_eq!(graph.chunk_groups().count(), 1);
//! # Ok(())
//! # }
//! ```

pub mod chunk;
pub mod error;
pub mod graph;
pub mod id;
pub mod memory;
pub mod module;

pub use chunk::{Chunk, ChunkGroup};
pub use error::{GraphError, Result};
pub use graph::{ChunkRef, CompilationGraph, Connection, DependencyRef, ModuleRef};
pub use id::{ChunkId, ModuleId};
pub use memory::MemoryGraph;
pub use module::{Module, ModuleBuilder, ModuleKind};
