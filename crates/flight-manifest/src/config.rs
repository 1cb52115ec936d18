//! Manifest pass configuration.
//!
//! [`ManifestConfig`] is the serializable form, loaded from defaults, an
//! optional `flight.toml` and `FLIGHT_MANIFEST_*` environment variables.
//! [`ManifestConfig::compile`] validates it into the [`ManifestSettings`] a
//! pass runs with.

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use figment::providers::{Env, Format as _, Serialized, Toml};
use figment::Figment;
use flight_graph::ChunkGroup;
use path_clean::PathClean;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::chunks::ChunkFilter;
use crate::resolver::RuntimeAlias;
use crate::{Error, Result};

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "flight.toml";

/// Prefix of environment variable overrides, e.g. `FLIGHT_MANIFEST_DEV=true`.
pub const ENV_PREFIX: &str = "FLIGHT_MANIFEST_";

/// Substitution producing the alternate-runtime variant of a resource path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasConfig {
    /// Regex matched against the resource path.
    pub pattern: String,
    /// Literal text replacing the first match.
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Pretty-print the manifest.
    pub dev: bool,
    /// Routes root; entry names resolve against its parent directory.
    pub app_dir: PathBuf,
    /// Base directory for module keys. Defaults to the parent of `app_dir`.
    pub context: Option<PathBuf>,
    /// Emits `server/<manifest_name>.js` and `server/<manifest_name>.json`.
    pub manifest_name: String,
    pub client_layer: String,
    /// Request substring identifying client-entry boundary modules.
    pub client_entry_marker: String,
    pub system_entrypoints: Vec<String>,
    pub hot_update_suffix: String,
    /// Chunk-group names matching this are application-route entries.
    pub route_pattern: String,
    pub excluded_css_prefix: String,
    /// Tried in order; the first matching rule supplies the alias.
    pub runtime_aliases: Vec<AliasConfig>,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            dev: false,
            app_dir: PathBuf::from("app"),
            context: None,
            manifest_name: "client-reference-manifest".to_string(),
            client_layer: "app-client".to_string(),
            client_entry_marker: "next-flight-client-entry-loader.js?".to_string(),
            system_entrypoints: ["main", "main-app", "react-refresh", "amp", "polyfills"]
                .into_iter()
                .map(String::from)
                .collect(),
            hot_update_suffix: ".hot-update.js".to_string(),
            route_pattern: r"^app[\\/]".to_string(),
            excluded_css_prefix: "static/css/pages/".to_string(),
            runtime_aliases: vec![AliasConfig {
                pattern: r"[\\/]next[\\/]dist[\\/]".to_string(),
                replacement: "/next/dist/esm/".to_string(),
            }],
        }
    }
}

impl ManifestConfig {
    pub fn new(app_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_dir: app_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from multiple sources.
    /// Priority: environment variables > config file > defaults
    ///
    /// An explicit `config_path` must exist; without one, `flight.toml` in
    /// the working directory is used when present.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = match config_path {
            Some(path) if !path.exists() => {
                return Err(Error::ConfigNotFound(path.to_path_buf()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                default_path.exists().then(|| default_path.to_path_buf())
            }
        };

        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    pub fn dev(mut self, dev: bool) -> Self {
        self.dev = dev;
        self
    }

    pub fn context(mut self, context: impl Into<PathBuf>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn manifest_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_name = name.into();
        self
    }

    pub fn runtime_aliases(mut self, aliases: Vec<AliasConfig>) -> Self {
        self.runtime_aliases = aliases;
        self
    }

    /// Validate patterns and derive the settings a pass runs with.
    pub fn compile(&self) -> Result<ManifestSettings> {
        if self.manifest_name.is_empty() || self.manifest_name.contains(['/', '\\']) {
            return Err(Error::InvalidConfig(format!(
                "manifest_name must be a plain file stem, got '{}'",
                self.manifest_name
            )));
        }
        if self.client_entry_marker.is_empty() {
            return Err(Error::InvalidConfig(
                "client_entry_marker must not be empty".to_string(),
            ));
        }

        let route_pattern =
            Regex::new(&self.route_pattern).map_err(|source| Error::InvalidPattern {
                field: "route_pattern",
                source,
            })?;

        let runtime_aliases = self
            .runtime_aliases
            .iter()
            .map(|alias| {
                RuntimeAlias::new(&alias.pattern, alias.replacement.clone()).map_err(|source| {
                    Error::InvalidPattern {
                        field: "runtime_aliases",
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let app_dir = absolutize(&self.app_dir)?;
        let app_dir_base = app_dir
            .parent()
            .map_or_else(|| app_dir.clone(), Path::to_path_buf);
        let context = match &self.context {
            Some(context) => absolutize(context)?,
            None => app_dir_base.clone(),
        };

        Ok(ManifestSettings {
            dev: self.dev,
            app_dir_base,
            context,
            manifest_name: self.manifest_name.clone(),
            client_layer: self.client_layer.clone(),
            client_entry_marker: self.client_entry_marker.clone(),
            chunk_filter: ChunkFilter::new(
                self.system_entrypoints.iter().cloned(),
                self.hot_update_suffix.clone(),
            ),
            route_pattern,
            excluded_css_prefix: self.excluded_css_prefix.clone(),
            runtime_aliases,
        })
    }
}

/// Resolve `path` against the working directory. Rooted paths are only
/// cleaned.
fn absolutize(path: &Path) -> Result<PathBuf> {
    let cleaned = path.clean();
    if cleaned.is_absolute() || cleaned.has_root() {
        return Ok(cleaned);
    }

    let cwd = std::env::current_dir().map_err(|e| {
        Error::InvalidConfig(format!(
            "cannot resolve '{}' without a working directory: {}",
            path.display(),
            e
        ))
    })?;
    Ok(cwd.join(cleaned).clean())
}

/// Validated settings for one manifest pass.
#[derive(Debug, Clone)]
pub struct ManifestSettings {
    pub dev: bool,
    /// Parent directory of the routes root.
    pub app_dir_base: PathBuf,
    pub context: PathBuf,
    pub manifest_name: String,
    pub client_layer: String,
    pub client_entry_marker: String,
    pub chunk_filter: ChunkFilter,
    pub route_pattern: Regex,
    pub excluded_css_prefix: String,
    pub runtime_aliases: Vec<RuntimeAlias>,
}

impl ManifestSettings {
    /// Absolute entry name of an application-route chunk group, e.g.
    /// `/proj/app/page` for group `app/page`. `None` for other groups.
    pub fn route_entry_name(&self, group: &ChunkGroup) -> Option<String> {
        let name = group.name.as_deref()?;
        if !self.route_pattern.is_match(name) {
            return None;
        }

        let base = self.app_dir_base.to_string_lossy();
        let base = base.trim_end_matches(['/', '\\']);
        let entry = format!("{base}{MAIN_SEPARATOR}{name}");
        Some(entry.replace(['/', '\\'], &MAIN_SEPARATOR.to_string()))
    }

    /// Output path of the manifest asset with `extension`.
    pub fn asset_path(&self, extension: &str) -> String {
        format!("server/{}.{extension}", self.manifest_name)
    }
}
