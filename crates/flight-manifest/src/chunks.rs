//! Chunk graph walking: which files a browser loads for an entry point.

use std::fmt;
use std::str::FromStr;

use flight_graph::{ChunkGroup, ChunkId, CompilationGraph};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Result;

/// One file the browser must fetch, serialized as `"chunkId:fileName"`, or as
/// the bare file name when no chunk id is attached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChunkReference {
    pub chunk_id: Option<ChunkId>,
    pub file: String,
}

impl ChunkReference {
    pub fn new(chunk_id: impl Into<ChunkId>, file: impl Into<String>) -> Self {
        Self {
            chunk_id: Some(chunk_id.into()),
            file: file.into(),
        }
    }

    pub fn file(file: impl Into<String>) -> Self {
        Self {
            chunk_id: None,
            file: file.into(),
        }
    }
}

impl fmt::Display for ChunkReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.chunk_id {
            Some(id) => write!(f, "{id}:{}", self.file),
            None => f.write_str(&self.file),
        }
    }
}

impl FromStr for ChunkReference {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.split_once(':') {
            Some((id, file)) => {
                let chunk_id = id
                    .parse::<u64>()
                    .map(ChunkId::Number)
                    .unwrap_or_else(|_| ChunkId::from(id));
                Self::new(chunk_id, file)
            }
            None => Self::file(s),
        })
    }
}

impl Serialize for ChunkReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChunkReference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.parse() {
            Ok(reference) => Ok(reference),
            Err(never) => match never {},
        }
    }
}

/// Which chunks and files count as required JavaScript.
#[derive(Debug, Clone)]
pub struct ChunkFilter {
    system_entrypoints: FxHashSet<String>,
    hot_update_suffix: String,
}

impl ChunkFilter {
    pub fn new(
        system_entrypoints: impl IntoIterator<Item = impl Into<String>>,
        hot_update_suffix: impl Into<String>,
    ) -> Self {
        Self {
            system_entrypoints: system_entrypoints.into_iter().map(Into::into).collect(),
            hot_update_suffix: hot_update_suffix.into(),
        }
    }

    /// Bootstrap chunks are loaded by the runtime itself, never on demand.
    pub fn is_system_chunk(&self, name: Option<&str>) -> bool {
        self.system_entrypoints.contains(name.unwrap_or_default())
    }

    pub fn is_required_file(&self, file: &str) -> bool {
        file.ends_with(".js") && !file.ends_with(&self.hot_update_suffix)
    }
}

/// The ordered chunk references a browser loads to obtain `group`.
///
/// Order follows the group's chunk order, then each chunk's file order; the
/// client loader fetches them in sequence.
pub fn required_chunks<G: CompilationGraph>(
    graph: &G,
    group: &ChunkGroup,
    filter: &ChunkFilter,
) -> Result<Vec<ChunkReference>> {
    let mut required = Vec::new();
    for chunk in &group.chunks {
        let chunk = graph.expect_chunk(*chunk)?;
        if filter.is_system_chunk(chunk.name.as_deref()) {
            continue;
        }
        required.extend(
            chunk
                .files
                .iter()
                .filter(|file| filter.is_required_file(file))
                .map(|file| ChunkReference::new(chunk.id.clone(), file.clone())),
        );
    }
    Ok(required)
}

/// CSS files of `group`, minus the legacy page-level stylesheet location.
pub fn entry_css_files<G: CompilationGraph>(
    graph: &G,
    group: &ChunkGroup,
    excluded_prefix: &str,
) -> Result<Vec<String>> {
    Ok(graph
        .chunk_group_files(group)?
        .into_iter()
        .filter(|file| file.ends_with(".css") && !file.starts_with(excluded_prefix))
        .collect())
}
