//! The read-only view of a finished compilation.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::chunk::{Chunk, ChunkGroup};
use crate::error::{GraphError, Result};
use crate::id::ModuleId;
use crate::module::Module;

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

define_handle!(
    /// Opaque handle to a module inside one graph.
    ModuleRef
);
define_handle!(
    /// Opaque handle to a chunk inside one graph.
    ChunkRef
);
define_handle!(
    /// Opaque handle to a dependency (an import site) inside one graph.
    DependencyRef
);

/// An outgoing edge of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// The dependency that created the edge. Synthetic edges have none.
    #[serde(default)]
    pub dependency: Option<DependencyRef>,
    /// Target as seen after optimization. When the target was inlined into a
    /// concatenation this is the concatenated container, not the original.
    #[serde(default)]
    pub module: Option<ModuleRef>,
}

/// Graph operations a finished compilation must offer.
///
/// Everything here is a synchronous lookup against a graph that is immutable
/// for the duration of a manifest pass.
pub trait CompilationGraph {
    /// Every chunk group of the compilation, in the bundler's order.
    fn chunk_groups(&self) -> impl Iterator<Item = &ChunkGroup> + '_;

    fn chunk(&self, chunk: ChunkRef) -> Option<&Chunk>;

    fn module(&self, module: ModuleRef) -> Option<&Module>;

    /// Modules that act as entry points of `chunk`, not every member.
    fn chunk_entry_modules(&self, chunk: ChunkRef) -> impl Iterator<Item = ModuleRef> + '_;

    fn outgoing_connections(&self, module: ModuleRef) -> impl Iterator<Item = Connection> + '_;

    /// The original module a dependency resolved to.
    fn resolved_module(&self, dependency: DependencyRef) -> Option<ModuleRef>;

    /// The id the bundler assigned to `module`; `None` when it has no id of its
    /// own (pruned, or inlined into a concatenation).
    fn module_id(&self, module: ModuleRef) -> Option<ModuleId>;

    /// Resolve a chunk handle, treating a dangling handle as a broken graph.
    fn expect_chunk(&self, chunk: ChunkRef) -> Result<&Chunk> {
        self.chunk(chunk).ok_or(GraphError::UnknownChunk(chunk))
    }

    /// Resolve a module handle, treating a dangling handle as a broken graph.
    fn expect_module(&self, module: ModuleRef) -> Result<&Module> {
        self.module(module).ok_or(GraphError::UnknownModule(module))
    }

    /// All files emitted for a chunk group: chunk order, then file order,
    /// each file listed once.
    fn chunk_group_files(&self, group: &ChunkGroup) -> Result<Vec<String>> {
        let mut files = IndexSet::new();
        for chunk in &group.chunks {
            let chunk = self.expect_chunk(*chunk)?;
            for file in &chunk.files {
                files.insert(file.clone());
            }
        }
        Ok(files.into_iter().collect())
    }
}
