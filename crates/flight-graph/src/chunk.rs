use serde::{Deserialize, Serialize};

use crate::graph::ChunkRef;
use crate::id::ChunkId;

/// One emitted chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    /// Declared chunk name, if the chunk was named (entry chunks usually are).
    #[serde(default)]
    pub name: Option<String>,
    /// Emitted output files in emission order (JS, CSS, source maps, ...).
    #[serde(default)]
    pub files: Vec<String>,
}

impl Chunk {
    /// Create an unnamed chunk with no files.
    pub fn new(id: impl Into<ChunkId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            files: Vec::new(),
        }
    }

    /// Set the declared chunk name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append one emitted file.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.files.push(file.into());
        self
    }

    /// Append emitted files, keeping their order.
    pub fn with_files(mut self, files: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.files.extend(files.into_iter().map(Into::into));
        self
    }
}

/// A loadable entry point: the ordered chunks a browser fetches for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkGroup {
    #[serde(default)]
    pub name: Option<String>,
    /// Member chunks in load order.
    pub chunks: Vec<ChunkRef>,
}

impl ChunkGroup {
    /// Create a named group with no chunks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            chunks: Vec::new(),
        }
    }

    /// Create a group without a name; it is never a route entry.
    pub fn unnamed() -> Self {
        Self {
            name: None,
            chunks: Vec::new(),
        }
    }

    /// Append a member chunk; the browser loads chunks in this order.
    pub fn with_chunk(mut self, chunk: ChunkRef) -> Self {
        self.chunks.push(chunk);
        self
    }
}
