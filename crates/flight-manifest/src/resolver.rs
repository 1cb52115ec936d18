//! Client reference resolution.
//!
//! Every chunk group has synthetic client-entry modules marking where the
//! server component tree crosses into client code. Their outgoing edges point
//! at the real client modules; those are what the manifest describes.

use std::path::Path;

use flight_graph::{ChunkGroup, CompilationGraph, Connection, Module, ModuleId, ModuleKind, ModuleRef};
use regex::{NoExpand, Regex};
use tracing::debug;

use crate::config::ManifestSettings;
use crate::key::ModuleKey;
use crate::registry::RegistrySnapshot;
use crate::Result;

/// Rewrites a library-internal path to the build variant another runtime
/// imports, e.g. a CJS `dist/` file to its ESM twin.
#[derive(Debug, Clone)]
pub struct RuntimeAlias {
    pattern: Regex,
    replacement: String,
}

impl RuntimeAlias {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.into(),
        })
    }

    /// The aliased path, or `None` when `resource` does not match.
    pub fn apply(&self, resource: &str) -> Option<String> {
        self.pattern.is_match(resource).then(|| {
            self.pattern
                .replacen(resource, 1, NoExpand(&self.replacement))
                .into_owned()
        })
    }
}

/// Where a client module's source lives, decided once per module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientModuleSource {
    Regular { resource: String },
    /// Extracted stylesheets carry their resource after the last `!` of the
    /// compound identifier.
    Stylesheet { resource: String },
}

impl ClientModuleSource {
    /// `None` when the module has no usable resource.
    pub fn classify(module: &Module) -> Option<Self> {
        let source = match module.kind {
            ModuleKind::ExtractedCss => {
                let identifier = module.identifier.as_str();
                let resource = identifier
                    .rsplit_once('!')
                    .map_or(identifier, |(_, resource)| resource);
                Self::Stylesheet {
                    resource: resource.to_string(),
                }
            }
            ModuleKind::Normal | ModuleKind::Concatenated => Self::Regular {
                resource: module.resource.clone()?,
            },
        };
        (!source.resource().is_empty()).then_some(source)
    }

    pub fn resource(&self) -> &str {
        match self {
            Self::Regular { resource } | Self::Stylesheet { resource } => resource,
        }
    }

    pub fn into_resource(self) -> String {
        match self {
            Self::Regular { resource } | Self::Stylesheet { resource } => resource,
        }
    }
}

/// A client module reachable from a client-entry boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientReference {
    /// Id in the browser bundle, possibly the enclosing concatenation's.
    pub id: ModuleId,
    pub resource: String,
    /// Join key into the server id tables.
    pub ssr_key: ModuleKey,
    pub is_async: bool,
    /// Alternate-runtime variant of `resource`, if one applies.
    pub alias: Option<String>,
}

pub struct ReferenceResolver<'a> {
    client_layer: &'a str,
    client_entry_marker: &'a str,
    context: &'a Path,
    aliases: &'a [RuntimeAlias],
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(settings: &'a ManifestSettings) -> Self {
        Self {
            client_layer: &settings.client_layer,
            client_entry_marker: &settings.client_entry_marker,
            context: &settings.context,
            aliases: &settings.runtime_aliases,
        }
    }

    /// Whether `module` is a synthetic client-entry boundary module.
    pub fn is_client_entry(&self, module: &Module) -> bool {
        module.is_in_layer(self.client_layer)
            && module
                .request
                .as_deref()
                .is_some_and(|request| request.contains(self.client_entry_marker))
    }

    /// Client references of every boundary module in `group`, in chunk order,
    /// then entry-module order, then edge order.
    pub fn resolve<G: CompilationGraph>(
        &self,
        graph: &G,
        group: &ChunkGroup,
        registry: &RegistrySnapshot,
    ) -> Result<Vec<ClientReference>> {
        let mut references = Vec::new();

        for chunk in &group.chunks {
            graph.expect_chunk(*chunk)?;

            for entry in graph.chunk_entry_modules(*chunk) {
                if !self.is_client_entry(graph.expect_module(entry)?) {
                    continue;
                }

                for connection in graph.outgoing_connections(entry) {
                    let Some(dependency) = connection.dependency else {
                        continue;
                    };
                    let Some(target) = graph.resolved_module(dependency) else {
                        continue;
                    };
                    let Some(id) = self.resolve_id(graph, target, connection)? else {
                        debug!(module = %target, "client module has no id, skipping");
                        continue;
                    };

                    let module = graph.expect_module(target)?;
                    match self.describe(module, id, registry) {
                        Some(reference) => references.push(reference),
                        None => debug!(
                            module = %module.identifier,
                            "not a client reference, skipping"
                        ),
                    }
                }
            }
        }

        Ok(references)
    }

    /// The module's own id, or the id of the concatenation it was merged into.
    fn resolve_id<G: CompilationGraph>(
        &self,
        graph: &G,
        target: ModuleRef,
        connection: Connection,
    ) -> Result<Option<ModuleId>> {
        if let Some(id) = graph.module_id(target) {
            return Ok(Some(id));
        }

        let Some(container) = connection.module else {
            return Ok(None);
        };
        if graph.expect_module(container)?.kind != ModuleKind::Concatenated {
            return Ok(None);
        }
        Ok(graph.module_id(container))
    }

    fn describe(
        &self,
        module: &Module,
        id: ModuleId,
        registry: &RegistrySnapshot,
    ) -> Option<ClientReference> {
        // Modules outside the client layer (pages-only code) stay out.
        if !module.is_in_layer(self.client_layer) {
            return None;
        }

        let resource = ClientModuleSource::classify(module)?.into_resource();
        let ssr_key = ModuleKey::from_resource(
            self.context,
            module.resource_resolve_path.as_deref().unwrap_or(&resource),
        );
        let is_async = module
            .resource
            .as_deref()
            .is_some_and(|path| registry.is_async_client_module(path));
        let alias = self.aliases.iter().find_map(|alias| alias.apply(&resource));

        Some(ClientReference {
            id,
            resource,
            ssr_key,
            is_async,
            alias,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stylesheet_resource_comes_from_identifier_suffix() {
        let module = Module::extracted_css("css/mini-extract|css-loader!postcss!/proj/app/globals.css")
            .layer("app-client")
            .build();

        assert_eq!(
            ClientModuleSource::classify(&module),
            Some(ClientModuleSource::Stylesheet {
                resource: "/proj/app/globals.css".to_string()
            })
        );
    }

    #[test]
    fn stylesheet_without_separator_uses_whole_identifier() {
        let module = Module::extracted_css("/proj/a.css").build();
        assert_eq!(
            ClientModuleSource::classify(&module).map(ClientModuleSource::into_resource),
            Some("/proj/a.css".to_string())
        );
    }

    #[test]
    fn module_without_resource_is_not_classified() {
        let module = Module::builder(ModuleKind::Normal, "virtual:thing").build();
        assert_eq!(ClientModuleSource::classify(&module), None);
    }

    #[test]
    fn alias_substitutes_first_match_only() {
        let alias = RuntimeAlias::new(r"[\\/]next[\\/]dist[\\/]", "/next/dist/esm/").unwrap();

        assert_eq!(
            alias.apply("/proj/node_modules/next/dist/client/link.js"),
            Some("/proj/node_modules/next/dist/esm/client/link.js".to_string())
        );
        assert_eq!(alias.apply("/proj/components/Button.js"), None);
    }

    #[test]
    fn alias_replacement_is_literal() {
        let alias = RuntimeAlias::new("/lib/cjs/", "/lib/$esm/").unwrap();
        assert_eq!(alias.apply("/x/lib/cjs/a.js"), Some("/x/lib/$esm/a.js".to_string()));
    }
}
