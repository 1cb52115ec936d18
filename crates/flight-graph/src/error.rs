//! Error types for graph construction and lookups.

use thiserror::Error;

use crate::graph::{ChunkRef, DependencyRef, ModuleRef};

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("unknown module handle {0}")]
    UnknownModule(ModuleRef),

    #[error("unknown chunk handle {0}")]
    UnknownChunk(ChunkRef),

    #[error("unknown dependency handle {0}")]
    UnknownDependency(DependencyRef),

    #[error("graph has too many {0} to address")]
    Capacity(&'static str),

    #[error("invalid graph JSON: {0}")]
    Json(#[from] serde_json::Error),
}
