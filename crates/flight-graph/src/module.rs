use serde::{Deserialize, Serialize};

/// How the bundler represents a module in its graph.
///
/// The kind decides where a module's source location lives: regular modules
/// carry a `resource`, extracted stylesheets encode it inside their compound
/// `identifier`, concatenated modules are synthetic containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleKind {
    /// A regular JavaScript/TypeScript module.
    Normal,
    /// A stylesheet pulled out of the JS graph by a CSS extraction loader.
    ExtractedCss,
    /// Several source modules merged into one unit with a single id.
    Concatenated,
}

/// Module record as exposed by the bundler after optimization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub kind: ModuleKind,
    /// Compound internal identifier, e.g. `css-loader!mini-css!/proj/a.css`.
    pub identifier: String,
    /// Layer classification assigned earlier in the pipeline.
    #[serde(default)]
    pub layer: Option<String>,
    /// Full request string including loaders and query.
    #[serde(default)]
    pub request: Option<String>,
    /// Absolute resolved source path.
    #[serde(default)]
    pub resource: Option<String>,
    /// Path reported by the resolver, when it differs from `resource`.
    #[serde(default)]
    pub resource_resolve_path: Option<String>,
}

impl Module {
    /// Create a new module builder.
    pub fn builder(kind: ModuleKind, identifier: impl Into<String>) -> ModuleBuilder {
        ModuleBuilder {
            module: Self {
                kind,
                identifier: identifier.into(),
                layer: None,
                request: None,
                resource: None,
                resource_resolve_path: None,
            },
        }
    }

    /// Builder for a regular module whose identifier is its resource path.
    pub fn normal(resource: impl Into<String>) -> ModuleBuilder {
        let resource = resource.into();
        Self::builder(ModuleKind::Normal, resource.clone()).resource(resource)
    }

    /// Builder for an extracted stylesheet module.
    pub fn extracted_css(identifier: impl Into<String>) -> ModuleBuilder {
        Self::builder(ModuleKind::ExtractedCss, identifier)
    }

    /// Builder for a concatenated container module.
    pub fn concatenated(identifier: impl Into<String>) -> ModuleBuilder {
        Self::builder(ModuleKind::Concatenated, identifier)
    }

    /// Whether the module was classified into `layer`.
    pub fn is_in_layer(&self, layer: &str) -> bool {
        self.layer.as_deref() == Some(layer)
    }
}

/// Builder for [`Module`].
#[derive(Debug, Clone)]
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    /// Set the layer the module was classified into.
    pub fn layer(mut self, layer: impl Into<String>) -> Self {
        self.module.layer = Some(layer.into());
        self
    }

    /// Set the full request string, loaders and query included.
    pub fn request(mut self, request: impl Into<String>) -> Self {
        self.module.request = Some(request.into());
        self
    }

    /// Set the absolute source path.
    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.module.resource = Some(resource.into());
        self
    }

    /// Set the path the resolver reported, when it differs from the resource.
    pub fn resource_resolve_path(mut self, path: impl Into<String>) -> Self {
        self.module.resource_resolve_path = Some(path.into());
        self
    }

    /// Finish building the module.
    pub fn build(self) -> Module {
        self.module
    }
}
