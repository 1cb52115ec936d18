//! The client reference manifest artifact.
//!
//! The serving runtime loads this file and trusts it as-is, so the JSON shape
//! is a stable contract:
//!
//! ```json
//! {
//!   "clientModules": { "/proj/components/Button.js": { "id": 42, "name": "*", "chunks": ["7:static/chunks/7.js"], "async": false } },
//!   "ssrModuleMapping": { "42": { "*": { "id": "s1", "name": "*", "chunks": [], "async": false } } },
//!   "edgeSSRModuleMapping": {},
//!   "entryCSSFiles": { "/proj/app/page": ["static/css/app/page.css"] }
//! }
//! ```
//!
//! All maps are ordered by key so the same graph always serializes to the
//! same bytes.

use std::collections::BTreeMap;

use flight_graph::ModuleId;
use serde::{Deserialize, Serialize};

use crate::chunks::ChunkReference;
use crate::registry::ServerRuntime;
use crate::{Error, Result};

/// Export name meaning "the whole module".
pub const ALL_EXPORTS: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: ModuleId,
    pub name: String,
    pub chunks: Vec<ChunkReference>,
    #[serde(rename = "async", default)]
    pub is_async: bool,
}

impl ManifestEntry {
    /// Entry for the whole module `id`, loaded from `chunks`.
    pub fn all_exports(id: ModuleId, chunks: Vec<ChunkReference>, is_async: bool) -> Self {
        Self {
            id,
            name: ALL_EXPORTS.to_string(),
            chunks,
            is_async,
        }
    }

    /// The same record under a server-assigned id. Servers never load
    /// browser chunks, so `chunks` is always empty.
    pub fn for_server(&self, server_id: ModuleId) -> Self {
        Self {
            id: server_id,
            name: self.name.clone(),
            chunks: Vec::new(),
            is_async: self.is_async,
        }
    }
}

/// Export name to entry.
pub type ManifestNode = BTreeMap<String, ManifestEntry>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientReferenceManifest {
    /// Keyed by resource path (and alternate-runtime alias paths).
    #[serde(default)]
    pub client_modules: BTreeMap<String, ManifestEntry>,
    /// Browser module id to default-server record.
    #[serde(default)]
    pub ssr_module_mapping: BTreeMap<String, ManifestNode>,
    /// Browser module id to edge-server record.
    #[serde(rename = "edgeSSRModuleMapping", default)]
    pub edge_ssr_module_mapping: BTreeMap<String, ManifestNode>,
    /// Absolute route entry name to its CSS files.
    #[serde(rename = "entryCSSFiles", default)]
    pub entry_css_files: BTreeMap<String, Vec<String>>,
}

impl ClientReferenceManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server_mapping(&self, runtime: ServerRuntime) -> &BTreeMap<String, ManifestNode> {
        match runtime {
            ServerRuntime::Nodejs => &self.ssr_module_mapping,
            ServerRuntime::Edge => &self.edge_ssr_module_mapping,
        }
    }

    pub fn server_mapping_mut(
        &mut self,
        runtime: ServerRuntime,
    ) -> &mut BTreeMap<String, ManifestNode> {
        match runtime {
            ServerRuntime::Nodejs => &mut self.ssr_module_mapping,
            ServerRuntime::Edge => &mut self.edge_ssr_module_mapping,
        }
    }

    /// The whole-module record `runtime` uses for browser module `id`.
    pub fn server_entry(&self, runtime: ServerRuntime, id: &ModuleId) -> Option<&ManifestEntry> {
        self.server_mapping(runtime)
            .get(&id.to_string())?
            .get(ALL_EXPORTS)
    }

    /// Serialize; indented by two spaces when `pretty`.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        json.map_err(Error::Serialize)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::Deserialize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClientReferenceManifest {
        let mut manifest = ClientReferenceManifest::new();
        let entry = ManifestEntry::all_exports(
            ModuleId::Number(42),
            vec![ChunkReference::new(7u64, "static/chunks/7.js")],
            false,
        );
        manifest.ssr_module_mapping.insert(
            "42".to_string(),
            BTreeMap::from([(ALL_EXPORTS.to_string(), entry.for_server("s1".into()))]),
        );
        manifest
            .client_modules
            .insert("/proj/components/Button.js".to_string(), entry);
        manifest
    }

    #[test]
    fn compact_json_uses_wire_field_names() {
        let json = sample().to_json(false).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"clientModules":{"/proj/components/Button.js":{"id":42,"name":"*","chunks":["7:static/chunks/7.js"],"async":false}},"#,
                r#""ssrModuleMapping":{"42":{"*":{"id":"s1","name":"*","chunks":[],"async":false}}},"#,
                r#""edgeSSRModuleMapping":{},"entryCSSFiles":{}}"#
            )
        );
    }

    #[test]
    fn pretty_json_indents_two_spaces() {
        let json = ClientReferenceManifest::new().to_json(true).unwrap();
        assert!(json.starts_with("{\n  \"clientModules\": {}"));
    }

    #[test]
    fn server_entry_looks_up_by_display_id() {
        let manifest = sample();
        let entry = manifest
            .server_entry(ServerRuntime::Nodejs, &ModuleId::Number(42))
            .unwrap();
        assert_eq!(entry.id, ModuleId::from("s1"));
        assert!(entry.chunks.is_empty());
        assert!(manifest
            .server_entry(ServerRuntime::Edge, &ModuleId::Number(42))
            .is_none());
    }

    #[test]
    fn from_json_reads_what_to_json_wrote() {
        let manifest = sample();
        let json = manifest.to_json(true).unwrap();
        assert_eq!(ClientReferenceManifest::from_json(&json).unwrap(), manifest);
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(matches!(
            ClientReferenceManifest::from_json("{\"clientModules\": 3}"),
            Err(Error::Deserialize(_))
        ));
    }
}
