mod helpers;

use std::fs;

use flight_manifest::{
    AssetSink, ClientReferenceManifest, ClientReferenceManifestPlugin, Error, ModuleIdRegistry,
    OutputAsset, OutputAssets, parse_manifest_script, write_assets_to,
};
use helpers::*;
use tempfile::TempDir;

fn emitted_assets() -> OutputAssets {
    let plugin =
        ClientReferenceManifestPlugin::new(&test_config(), ModuleIdRegistry::new()).unwrap();
    let mut assets = OutputAssets::new();
    plugin.process_assets(&page_graph(), &mut assets).unwrap();
    assets
}

fn leftover_temp_files(dir: &std::path::Path) -> Vec<String> {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .filter(|name| name.ends_with(".tmp"))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn writes_manifest_pair_below_output_dir() {
    let temp = TempDir::new().unwrap();
    let assets = emitted_assets();

    write_assets_to(&assets, temp.path(), false).unwrap();

    let server = temp.path().join("server");
    let json = fs::read_to_string(server.join("client-reference-manifest.json")).unwrap();
    let script = fs::read_to_string(server.join("client-reference-manifest.js")).unwrap();

    assert_eq!(
        ClientReferenceManifest::from_json(&json).unwrap(),
        parse_manifest_script(&script).unwrap()
    );
    assert!(leftover_temp_files(&server).is_empty());
}

#[test]
fn existing_files_are_kept_without_overwrite() {
    let temp = TempDir::new().unwrap();
    let server = temp.path().join("server");
    fs::create_dir_all(&server).unwrap();
    fs::write(server.join("client-reference-manifest.json"), "stale").unwrap();

    let err = write_assets_to(&emitted_assets(), temp.path(), false).unwrap_err();

    assert!(matches!(err, Error::OutputExists(_)));
    assert_eq!(
        fs::read_to_string(server.join("client-reference-manifest.json")).unwrap(),
        "stale"
    );
    assert!(!server.join("client-reference-manifest.js").exists());
}

#[test]
fn overwrite_replaces_previous_build() {
    let temp = TempDir::new().unwrap();
    let server = temp.path().join("server");
    fs::create_dir_all(&server).unwrap();
    fs::write(server.join("client-reference-manifest.json"), "stale").unwrap();

    write_assets_to(&emitted_assets(), temp.path(), true).unwrap();

    let json = fs::read_to_string(server.join("client-reference-manifest.json")).unwrap();
    assert!(json.starts_with("{\"clientModules\""));
    assert!(leftover_temp_files(&server).is_empty());
}

#[test]
fn escaping_file_names_write_nothing() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    let mut assets = OutputAssets::new();
    assets
        .emit_asset(OutputAsset::new("server/ok.json", "{}"))
        .unwrap();
    assets
        .emit_asset(OutputAsset::new("../escape.js", "x"))
        .unwrap();

    let err = write_assets_to(&assets, &out, true).unwrap_err();

    assert!(matches!(err, Error::InvalidOutputPath(_)));
    assert!(!out.join("server/ok.json").exists());
    assert!(!temp.path().join("escape.js").exists());
}

#[test]
fn directory_in_place_of_an_asset_leaves_previous_build_alone() {
    let temp = TempDir::new().unwrap();
    let server = temp.path().join("server");
    fs::create_dir_all(server.join("client-reference-manifest.json/nested")).unwrap();
    fs::write(server.join("client-reference-manifest.js"), "OLD").unwrap();

    let err = write_assets_to(&emitted_assets(), temp.path(), true).unwrap_err();

    assert!(matches!(err, Error::InvalidOutputPath(_)));
    assert_eq!(
        fs::read_to_string(server.join("client-reference-manifest.js")).unwrap(),
        "OLD"
    );
    assert!(server.join("client-reference-manifest.json/nested").is_dir());
    assert!(leftover_temp_files(&server).is_empty());
}
