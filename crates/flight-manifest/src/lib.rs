#![cfg_attr(docsrs, feature(doc_cfg))]

//! # flight-manifest
//!
//! Client reference manifest generation for server component builds.
//!
//! After the browser bundling pass finishes, this crate walks its chunk graph
//! and records, for every client module reachable from a client-entry
//! boundary:
//!
//! - the browser module id and the chunk files that load it
//! - the ids the default and edge server runtimes gave the same file, joined
//!   through a path-derived [`ModuleKey`]
//! - the CSS files of every application-route entry
//!
//! The result is emitted as `server/<name>.json` and as a script assigning
//! `self.__RSC_MANIFEST`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use flight_graph::MemoryGraph;
//! use flight_manifest::{
//!     ClientReferenceManifestPlugin, ManifestConfig, ModuleIdRegistry, OutputAssets,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // One registry per build session, shared with the server compilations.
//! let registry = ModuleIdRegistry::new();
//!
//! let config = ManifestConfig::load(None)?;
//! let plugin = ClientReferenceManifestPlugin::new(&config, registry.clone())?;
//!
//! let graph = MemoryGraph::from_json(&std::fs::read_to_string("graph.json")?)?;
//! let mut assets = OutputAssets::new();
//! plugin.process_assets(&graph, &mut assets)?;
//!
//! flight_manifest::write_assets_to(&assets, "dist".as_ref(), true)?;
//! # Ok(()) }
//! ```

pub mod assembler;
pub mod chunks;
pub mod config;
pub mod emitter;
pub mod key;
pub mod manifest;
pub mod plugin;
pub mod registry;
pub mod resolver;
pub mod writer;

// Logging utilities (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub use logging::{LogLevel, init_logging, init_logging_from_env};

pub use assembler::ManifestAssembler;
pub use chunks::{ChunkFilter, ChunkReference, entry_css_files, required_chunks};
pub use config::{AliasConfig, ManifestConfig, ManifestSettings};
pub use emitter::{
    AssetSink, EmittedManifest, MANIFEST_GLOBAL, OutputAsset, OutputAssets, parse_manifest_script,
    render_manifest,
};
pub use key::ModuleKey;
pub use manifest::{ALL_EXPORTS, ClientReferenceManifest, ManifestEntry, ManifestNode};
pub use plugin::{ClientReferenceManifestPlugin, PLUGIN_NAME};
pub use registry::{ModuleIdRegistry, RegistrySnapshot, ServerRuntime};
pub use resolver::{ClientModuleSource, ClientReference, ReferenceResolver, RuntimeAlias};
pub use writer::write_assets_to;

use std::path::PathBuf;

/// Error types for manifest generation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The compilation graph handed a dangling handle.
    #[error("Compilation graph error: {0}")]
    Graph(#[from] flight_graph::GraphError),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Explicit config file does not exist.
    #[error("Config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// A configured regex failed to compile.
    #[error("Invalid pattern in `{field}`: {source}")]
    InvalidPattern {
        field: &'static str,
        #[source]
        source: regex::Error,
    },

    /// The manifest could not be serialized.
    #[error("Failed to serialize client reference manifest: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A manifest file could not be parsed.
    #[error("Failed to parse client reference manifest: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// The script form does not have the expected shape.
    #[error("Invalid manifest script: {0}")]
    InvalidManifestScript(String),

    /// An asset with this file name was already emitted in this compilation.
    #[error("Asset already emitted: {0}")]
    AssetConflict(String),

    /// Invalid output path (e.g., directory traversal attempt).
    #[error("Invalid output path: {0}")]
    InvalidOutputPath(String),

    /// File write operation failed.
    #[error("Write failure: {0}")]
    WriteFailure(String),

    /// Output file already exists and overwrite is disabled.
    #[error("Output exists: {0}")]
    OutputExists(String),
}

/// Result type alias for manifest operations.
pub type Result<T> = std::result::Result<T, Error>;

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Graph(_) => "GRAPH_ERROR",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::ConfigNotFound(_) => "CONFIG_NOT_FOUND",
            Error::InvalidPattern { .. } => "INVALID_PATTERN",
            Error::Serialize(_) => "MANIFEST_SERIALIZE_ERROR",
            Error::Deserialize(_) => "MANIFEST_PARSE_ERROR",
            Error::InvalidManifestScript(_) => "INVALID_MANIFEST_SCRIPT",
            Error::AssetConflict(_) => "ASSET_CONFLICT",
            Error::InvalidOutputPath(_) => "INVALID_OUTPUT_PATH",
            Error::WriteFailure(_) => "WRITE_FAILURE",
            Error::OutputExists(_) => "OUTPUT_EXISTS",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Graph(_) => Some(Box::new(
                "The bundler handed over an inconsistent chunk graph. The manifest was not emitted; rerun the build.",
            )),
            Error::InvalidConfig(msg) => Some(Box::new(format!(
                "Check flight.toml and FLIGHT_MANIFEST_* environment variables.\nError: {}",
                msg
            ))),
            Error::ConfigNotFound(path) => Some(Box::new(format!(
                "No config file at '{}'. Omit the path to fall back to defaults.",
                path.display()
            ))),
            Error::InvalidPattern { field, .. } => Some(Box::new(format!(
                "`{}` must be a valid regular expression.",
                field
            ))),
            Error::Serialize(_) => Some(Box::new(
                "The manifest could not be encoded as JSON and was not emitted. This aborts the compilation to avoid a partial manifest.",
            )),
            Error::AssetConflict(name) => Some(Box::new(format!(
                "'{}' was emitted twice in one compilation. Is the manifest plugin registered more than once?",
                name
            ))),
            Error::InvalidOutputPath(path) => Some(Box::new(format!(
                "The output path '{}' is invalid. Ensure it stays within the output directory.",
                path
            ))),
            Error::WriteFailure(msg) => Some(Box::new(format!(
                "Failed to write file. Check disk space and permissions.\nError: {}",
                msg
            ))),
            Error::OutputExists(path) => Some(Box::new(format!(
                "Output file already exists: {}\nPass overwrite = true to replace it.",
                path
            ))),
            _ => None,
        }
    }
}
