//! Manifest serialization into build output assets.
//!
//! Two assets are produced for the same manifest:
//!
//! - `server/<name>.js`: `self.__RSC_MANIFEST=<JSON string literal>`, the
//!   manifest JSON encoded a second time so a plain script tag can load it
//! - `server/<name>.json`: the manifest JSON itself

use indexmap::IndexMap;

use crate::config::ManifestSettings;
use crate::manifest::ClientReferenceManifest;
use crate::{Error, Result};

/// Global property the script form assigns to.
pub const MANIFEST_GLOBAL: &str = "self.__RSC_MANIFEST";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputAsset {
    /// Path relative to the output directory.
    pub filename: String,
    pub source: String,
}

impl OutputAsset {
    pub fn new(filename: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            source: source.into(),
        }
    }
}

/// Append-only destination for build output.
pub trait AssetSink {
    fn contains(&self, filename: &str) -> bool;

    /// Append `asset`; a file name may only be emitted once per compilation.
    fn emit_asset(&mut self, asset: OutputAsset) -> Result<()>;
}

/// In-memory asset collection of one compilation, in emission order.
#[derive(Debug, Clone, Default)]
pub struct OutputAssets {
    assets: IndexMap<String, String>,
}

impl OutputAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, filename: &str) -> Option<&str> {
        self.assets.get(filename).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.assets
            .iter()
            .map(|(name, source)| (name.as_str(), source.as_str()))
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetSink for OutputAssets {
    fn contains(&self, filename: &str) -> bool {
        self.assets.contains_key(filename)
    }

    fn emit_asset(&mut self, asset: OutputAsset) -> Result<()> {
        if self.contains(&asset.filename) {
            return Err(Error::AssetConflict(asset.filename));
        }
        self.assets.insert(asset.filename, asset.source);
        Ok(())
    }
}

/// Both serialized forms of one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedManifest {
    pub script: OutputAsset,
    pub json: OutputAsset,
}

impl EmittedManifest {
    /// Append both assets, or neither.
    pub fn write_into(self, sink: &mut dyn AssetSink) -> Result<()> {
        for filename in [&self.script.filename, &self.json.filename] {
            if sink.contains(filename) {
                return Err(Error::AssetConflict(filename.clone()));
            }
        }
        sink.emit_asset(self.script)?;
        sink.emit_asset(self.json)
    }
}

/// Serialize `manifest` into its two asset forms. Pretty-printed in dev mode.
pub fn render_manifest(
    manifest: &ClientReferenceManifest,
    settings: &ManifestSettings,
) -> Result<EmittedManifest> {
    let json = manifest.to_json(settings.dev)?;
    let literal = serde_json::to_string(&json).map_err(Error::Serialize)?;

    Ok(EmittedManifest {
        script: OutputAsset::new(
            settings.asset_path("js"),
            format!("{MANIFEST_GLOBAL}={literal}"),
        ),
        json: OutputAsset::new(settings.asset_path("json"), json),
    })
}

/// Decode the script form back into a manifest.
pub fn parse_manifest_script(source: &str) -> Result<ClientReferenceManifest> {
    let literal = source
        .trim()
        .strip_prefix(MANIFEST_GLOBAL)
        .and_then(|rest| rest.trim_start().strip_prefix('='))
        .ok_or_else(|| {
            Error::InvalidManifestScript(format!("expected `{MANIFEST_GLOBAL}=` assignment"))
        })?
        .trim()
        .trim_end_matches(';');

    let json: String = serde_json::from_str(literal)
        .map_err(|e| Error::InvalidManifestScript(format!("not a JSON string literal: {e}")))?;
    ClientReferenceManifest::from_json(&json)
}
