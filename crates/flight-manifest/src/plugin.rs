//! The end-of-compilation driver.

use flight_graph::CompilationGraph;
use tracing::{info, info_span};

use crate::assembler::ManifestAssembler;
use crate::config::{ManifestConfig, ManifestSettings};
use crate::emitter::{render_manifest, AssetSink, EmittedManifest};
use crate::manifest::ClientReferenceManifest;
use crate::registry::{ModuleIdRegistry, RegistrySnapshot};
use crate::Result;

pub const PLUGIN_NAME: &str = "ClientReferenceManifestPlugin";

/// Runs the manifest pass once per finished compilation.
///
/// Holds a clone of the session's [`ModuleIdRegistry`]; server compilations
/// populate the same registry through their own clones.
#[derive(Debug, Clone)]
pub struct ClientReferenceManifestPlugin {
    settings: ManifestSettings,
    registry: ModuleIdRegistry,
}

impl ClientReferenceManifestPlugin {
    pub fn new(config: &ManifestConfig, registry: ModuleIdRegistry) -> Result<Self> {
        Ok(Self::with_settings(config.compile()?, registry))
    }

    pub fn with_settings(settings: ManifestSettings, registry: ModuleIdRegistry) -> Self {
        Self { settings, registry }
    }

    pub fn settings(&self) -> &ManifestSettings {
        &self.settings
    }

    pub fn registry(&self) -> &ModuleIdRegistry {
        &self.registry
    }

    /// Build the manifest against a registry snapshot taken now.
    pub fn create_manifest<G: CompilationGraph>(
        &self,
        graph: &G,
    ) -> Result<ClientReferenceManifest> {
        self.assemble(graph, &self.registry.snapshot())
    }

    fn assemble<G: CompilationGraph>(
        &self,
        graph: &G,
        snapshot: &RegistrySnapshot,
    ) -> Result<ClientReferenceManifest> {
        ManifestAssembler::new(&self.settings).assemble(graph, snapshot)
    }

    /// Build, serialize and emit the manifest into `sink`, then forget the
    /// async client modules it consumed. Marks recorded while the pass ran
    /// carry over to the next compilation.
    ///
    /// Nothing is written unless both forms serialized; once writing starts it
    /// runs to completion.
    pub fn process_assets<G: CompilationGraph>(
        &self,
        graph: &G,
        sink: &mut dyn AssetSink,
    ) -> Result<EmittedManifest> {
        let _span = info_span!("client_reference_manifest").entered();

        let snapshot = self.registry.snapshot();
        let manifest = self.assemble(graph, &snapshot)?;
        let emitted = render_manifest(&manifest, &self.settings)?;
        emitted.clone().write_into(sink)?;
        self.registry.release_async_client_modules(&snapshot);

        info!(
            client_modules = manifest.client_modules.len(),
            ssr_modules = manifest.ssr_module_mapping.len(),
            edge_ssr_modules = manifest.edge_ssr_module_mapping.len(),
            entries = manifest.entry_css_files.len(),
            file = %emitted.json.filename,
            "emitted client reference manifest"
        );

        Ok(emitted)
    }
}
