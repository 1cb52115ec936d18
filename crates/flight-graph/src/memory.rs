//! In-memory compilation graph.
//!
//! `MemoryGraph` is what bundler adapters fill in (or deserialize from the JSON
//! a JavaScript bundler hands over) before a manifest pass. Handles are plain
//! indices into the owning graph and are only meaningful for that graph.

use serde::{Deserialize, Serialize};

use crate::chunk::{Chunk, ChunkGroup};
use crate::error::{GraphError, Result};
use crate::graph::{ChunkRef, CompilationGraph, Connection, DependencyRef, ModuleRef};
use crate::id::ModuleId;
use crate::module::Module;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryGraph {
    #[serde(default)]
    modules: Vec<ModuleNode>,
    #[serde(default)]
    chunks: Vec<ChunkNode>,
    #[serde(default)]
    chunk_groups: Vec<ChunkGroup>,
    /// Resolution target of each dependency, indexed by `DependencyRef`.
    #[serde(default)]
    dependencies: Vec<Option<ModuleRef>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ModuleNode {
    module: Module,
    #[serde(default)]
    id: Option<ModuleId>,
    #[serde(default)]
    connections: Vec<Connection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ChunkNode {
    chunk: Chunk,
    #[serde(default)]
    entry_modules: Vec<ModuleRef>,
}

fn next_handle(len: usize, what: &'static str) -> Result<u32> {
    u32::try_from(len).map_err(|_| GraphError::Capacity(what))
}

impl MemoryGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a graph from its JSON interchange form and check every handle.
    pub fn from_json(json: &str) -> Result<Self> {
        let graph: Self = serde_json::from_str(json)?;
        graph.validate()?;
        Ok(graph)
    }

    /// Serialize into the JSON interchange form read by [`MemoryGraph::from_json`].
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Add a module without an id. Returns its handle.
    pub fn add_module(&mut self, module: Module) -> Result<ModuleRef> {
        let handle = ModuleRef(next_handle(self.modules.len(), "modules")?);
        self.modules.push(ModuleNode {
            module,
            id: None,
            connections: Vec::new(),
        });
        Ok(handle)
    }

    /// Add a module that already has its bundler id.
    pub fn add_module_with_id(
        &mut self,
        module: Module,
        id: impl Into<ModuleId>,
    ) -> Result<ModuleRef> {
        let handle = self.add_module(module)?;
        self.set_module_id(handle, id)?;
        Ok(handle)
    }

    /// Assign or replace the bundler id of `module`.
    pub fn set_module_id(&mut self, module: ModuleRef, id: impl Into<ModuleId>) -> Result<()> {
        self.node_mut(module)?.id = Some(id.into());
        Ok(())
    }

    /// Add a chunk. Returns its handle.
    pub fn add_chunk(&mut self, chunk: Chunk) -> Result<ChunkRef> {
        let handle = ChunkRef(next_handle(self.chunks.len(), "chunks")?);
        self.chunks.push(ChunkNode {
            chunk,
            entry_modules: Vec::new(),
        });
        Ok(handle)
    }

    /// Mark `module` as an entry point of `chunk`.
    pub fn add_entry_module(&mut self, chunk: ChunkRef, module: ModuleRef) -> Result<()> {
        self.check_module(module)?;
        let node = self
            .chunks
            .get_mut(chunk.index())
            .ok_or(GraphError::UnknownChunk(chunk))?;
        node.entry_modules.push(module);
        Ok(())
    }

    /// Add a chunk group. Every member chunk must already exist.
    pub fn add_chunk_group(&mut self, group: ChunkGroup) -> Result<()> {
        for chunk in &group.chunks {
            self.check_chunk(*chunk)?;
        }
        self.chunk_groups.push(group);
        Ok(())
    }

    /// Record that `from` imports `to`.
    pub fn add_dependency(&mut self, from: ModuleRef, to: ModuleRef) -> Result<DependencyRef> {
        self.add_dependency_via(from, to, to)
    }

    /// Record that `from` imports `to`, which the bundler inlined into the
    /// concatenated module `container`.
    pub fn add_concatenated_dependency(
        &mut self,
        from: ModuleRef,
        to: ModuleRef,
        container: ModuleRef,
    ) -> Result<DependencyRef> {
        self.add_dependency_via(from, to, container)
    }

    /// Append a raw connection, e.g. one without a dependency.
    pub fn add_connection(&mut self, from: ModuleRef, connection: Connection) -> Result<()> {
        if let Some(dependency) = connection.dependency {
            self.check_dependency(dependency)?;
        }
        if let Some(module) = connection.module {
            self.check_module(module)?;
        }
        self.node_mut(from)?.connections.push(connection);
        Ok(())
    }

    /// Number of modules in the graph.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Number of chunks in the graph.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Check that every stored handle points inside this graph.
    pub fn validate(&self) -> Result<()> {
        for group in &self.chunk_groups {
            for chunk in &group.chunks {
                self.check_chunk(*chunk)?;
            }
        }
        for node in &self.chunks {
            for module in &node.entry_modules {
                self.check_module(*module)?;
            }
        }
        for target in self.dependencies.iter().flatten() {
            self.check_module(*target)?;
        }
        for node in &self.modules {
            for connection in &node.connections {
                if let Some(dependency) = connection.dependency {
                    self.check_dependency(dependency)?;
                }
                if let Some(module) = connection.module {
                    self.check_module(module)?;
                }
            }
        }
        Ok(())
    }

    fn add_dependency_via(
        &mut self,
        from: ModuleRef,
        to: ModuleRef,
        via: ModuleRef,
    ) -> Result<DependencyRef> {
        self.check_module(to)?;
        self.check_module(via)?;
        self.check_module(from)?;

        let dependency = DependencyRef(next_handle(self.dependencies.len(), "dependencies")?);
        self.dependencies.push(Some(to));
        self.node_mut(from)?.connections.push(Connection {
            dependency: Some(dependency),
            module: Some(via),
        });
        Ok(dependency)
    }

    fn node_mut(&mut self, module: ModuleRef) -> Result<&mut ModuleNode> {
        self.modules
            .get_mut(module.index())
            .ok_or(GraphError::UnknownModule(module))
    }

    fn check_module(&self, module: ModuleRef) -> Result<()> {
        if module.index() < self.modules.len() {
            Ok(())
        } else {
            Err(GraphError::UnknownModule(module))
        }
    }

    fn check_chunk(&self, chunk: ChunkRef) -> Result<()> {
        if chunk.index() < self.chunks.len() {
            Ok(())
        } else {
            Err(GraphError::UnknownChunk(chunk))
        }
    }

    fn check_dependency(&self, dependency: DependencyRef) -> Result<()> {
        if dependency.index() < self.dependencies.len() {
            Ok(())
        } else {
            Err(GraphError::UnknownDependency(dependency))
        }
    }
}

impl CompilationGraph for MemoryGraph {
    fn chunk_groups(&self) -> impl Iterator<Item = &ChunkGroup> + '_ {
        self.chunk_groups.iter()
    }

    fn chunk(&self, chunk: ChunkRef) -> Option<&Chunk> {
        self.chunks.get(chunk.index()).map(|node| &node.chunk)
    }

    fn module(&self, module: ModuleRef) -> Option<&Module> {
        self.modules.get(module.index()).map(|node| &node.module)
    }

    fn chunk_entry_modules(&self, chunk: ChunkRef) -> impl Iterator<Item = ModuleRef> + '_ {
        self.chunks
            .get(chunk.index())
            .into_iter()
            .flat_map(|node| node.entry_modules.iter().copied())
    }

    fn outgoing_connections(&self, module: ModuleRef) -> impl Iterator<Item = Connection> + '_ {
        self.modules
            .get(module.index())
            .into_iter()
            .flat_map(|node| node.connections.iter().copied())
    }

    fn resolved_module(&self, dependency: DependencyRef) -> Option<ModuleRef> {
        self.dependencies.get(dependency.index()).copied().flatten()
    }

    fn module_id(&self, module: ModuleRef) -> Option<ModuleId> {
        self.modules
            .get(module.index())
            .and_then(|node| node.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleKind;

    #[test]
    fn dependency_resolves_to_original_module() {
        let mut graph = MemoryGraph::new();
        let entry = graph.add_module(Module::normal("/proj/entry.js").build()).unwrap();
        let button = graph
            .add_module_with_id(Module::normal("/proj/Button.js").build(), 42u64)
            .unwrap();

        let dep = graph.add_dependency(entry, button).unwrap();

        assert_eq!(graph.resolved_module(dep), Some(button));
        assert_eq!(graph.module_id(button), Some(ModuleId::Number(42)));
        assert_eq!(graph.module_id(entry), None);

        let connections: Vec<_> = graph.outgoing_connections(entry).collect();
        assert_eq!(
            connections,
            vec![Connection {
                dependency: Some(dep),
                module: Some(button),
            }]
        );
    }

    #[test]
    fn concatenated_dependency_points_connection_at_container() {
        let mut graph = MemoryGraph::new();
        let entry = graph.add_module(Module::normal("/proj/entry.js").build()).unwrap();
        let inner = graph.add_module(Module::normal("/proj/inner.js").build()).unwrap();
        let container = graph
            .add_module_with_id(
                Module::builder(ModuleKind::Concatenated, "concat|/proj/inner.js").build(),
                "c1",
            )
            .unwrap();

        let dep = graph
            .add_concatenated_dependency(entry, inner, container)
            .unwrap();

        assert_eq!(graph.resolved_module(dep), Some(inner));
        let connection = graph.outgoing_connections(entry).next().unwrap();
        assert_eq!(connection.module, Some(container));
    }

    #[test]
    fn rejects_dangling_handles() {
        let mut graph = MemoryGraph::new();
        let chunk = graph.add_chunk(Chunk::new(1u64)).unwrap();

        assert!(matches!(
            graph.add_entry_module(chunk, ModuleRef(3)),
            Err(GraphError::UnknownModule(ModuleRef(3)))
        ));
        assert!(matches!(
            graph.add_chunk_group(ChunkGroup::new("app/page").with_chunk(ChunkRef(9))),
            Err(GraphError::UnknownChunk(ChunkRef(9)))
        ));
    }

    #[test]
    fn chunk_group_files_are_ordered_and_unique() {
        let mut graph = MemoryGraph::new();
        let a = graph
            .add_chunk(Chunk::new(1u64).with_files(["a.js", "shared.css"]))
            .unwrap();
        let b = graph
            .add_chunk(Chunk::new(2u64).with_files(["b.js", "shared.css"]))
            .unwrap();
        let group = ChunkGroup::new("app/page").with_chunk(a).with_chunk(b);

        assert_eq!(
            graph.chunk_group_files(&group).unwrap(),
            vec!["a.js", "shared.css", "b.js"]
        );
    }

    #[test]
    fn json_round_trip_keeps_the_graph() {
        let mut graph = MemoryGraph::new();
        let entry = graph.add_module(Module::normal("/proj/entry.js").build()).unwrap();
        let chunk = graph.add_chunk(Chunk::new(7u64).with_file("7.js")).unwrap();
        graph.add_entry_module(chunk, entry).unwrap();
        graph
            .add_chunk_group(ChunkGroup::new("app/page").with_chunk(chunk))
            .unwrap();

        let json = graph.to_json().unwrap();
        assert_eq!(MemoryGraph::from_json(&json).unwrap(), graph);
    }

    #[test]
    fn from_json_rejects_dangling_handles() {
        let json = r#"{"chunk_groups": [{"name": "app/page", "chunks": [0]}]}"#;
        assert!(matches!(
            MemoryGraph::from_json(json),
            Err(GraphError::UnknownChunk(ChunkRef(0)))
        ));
    }
}
