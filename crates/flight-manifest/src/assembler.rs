use flight_graph::CompilationGraph;
use tracing::debug;

use crate::chunks::{entry_css_files, required_chunks, ChunkReference};
use crate::config::ManifestSettings;
use crate::manifest::{ClientReferenceManifest, ManifestEntry, ALL_EXPORTS};
use crate::registry::{RegistrySnapshot, ServerRuntime};
use crate::resolver::{ClientReference, ReferenceResolver};
use crate::Result;

/// Builds a fresh manifest from one finished compilation.
pub struct ManifestAssembler<'a> {
    settings: &'a ManifestSettings,
    resolver: ReferenceResolver<'a>,
}

impl<'a> ManifestAssembler<'a> {
    pub fn new(settings: &'a ManifestSettings) -> Self {
        Self {
            settings,
            resolver: ReferenceResolver::new(settings),
        }
    }

    /// Walk every chunk group and merge what it contributes.
    ///
    /// A client module reached from several groups ends up with the record of
    /// the last group visited.
    pub fn assemble<G: CompilationGraph>(
        &self,
        graph: &G,
        registry: &RegistrySnapshot,
    ) -> Result<ClientReferenceManifest> {
        let mut manifest = ClientReferenceManifest::new();

        for group in graph.chunk_groups() {
            let chunks = required_chunks(graph, group, &self.settings.chunk_filter)?;

            if let Some(entry_name) = self.settings.route_entry_name(group) {
                let css = entry_css_files(graph, group, &self.settings.excluded_css_prefix)?;
                manifest.entry_css_files.insert(entry_name, css);
            }

            let references = self.resolver.resolve(graph, group, registry)?;
            debug!(
                group = group.name.as_deref().unwrap_or("<unnamed>"),
                chunks = chunks.len(),
                references = references.len(),
                "walked chunk group"
            );

            for reference in references {
                record(&mut manifest, reference, &chunks, registry);
            }
        }

        Ok(manifest)
    }
}

fn record(
    manifest: &mut ClientReferenceManifest,
    reference: ClientReference,
    chunks: &[ChunkReference],
    registry: &RegistrySnapshot,
) {
    let entry = ManifestEntry::all_exports(reference.id.clone(), chunks.to_vec(), reference.is_async);
    let browser_id = reference.id.to_string();

    // Absent server ids stay absent: no entry beats a wrong guess.
    for runtime in ServerRuntime::ALL {
        if let Some(server_id) = registry.lookup(runtime, &reference.ssr_key) {
            manifest
                .server_mapping_mut(runtime)
                .entry(browser_id.clone())
                .or_default()
                .insert(ALL_EXPORTS.to_string(), entry.for_server(server_id.clone()));
        }
    }

    if let Some(alias) = reference.alias {
        manifest.client_modules.insert(alias, entry.clone());
    }
    manifest.client_modules.insert(reference.resource, entry);
}
