//! Writing emitted assets to disk.
//!
//! Every file name is validated against the output directory before anything
//! is written. All files go to temporary siblings first and are renamed into
//! place only once every write succeeded. Files being replaced are kept as
//! backups until the last rename lands; on failure they are restored and the
//! temporaries removed, so a reader never sees a half-written manifest pair.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use tracing::warn;

use crate::emitter::OutputAssets;
use crate::{Error, Result};

/// Write every asset in `assets` below `dir`.
///
/// With `overwrite == false`, an existing target file is an error and
/// nothing is written.
pub fn write_assets_to(assets: &OutputAssets, dir: &Path, overwrite: bool) -> Result<()> {
    let dir = normalize_dir(dir)?;

    fs::create_dir_all(&dir).map_err(|e| {
        Error::WriteFailure(format!(
            "Failed to create output directory '{}': {}",
            dir.display(),
            e
        ))
    })?;

    let mut operations = Vec::with_capacity(assets.len());
    for (filename, source) in assets.iter() {
        let target = validate_output_path(&dir, filename)?;
        if target.is_dir() {
            return Err(Error::InvalidOutputPath(format!(
                "'{}' is a directory",
                target.display()
            )));
        }
        if !overwrite && target.exists() {
            return Err(Error::OutputExists(target.display().to_string()));
        }
        operations.push((target, source.as_bytes()));
    }

    write_files_atomic(&operations)
}

fn normalize_dir(dir: &Path) -> Result<PathBuf> {
    let cleaned = dir.clean();
    if cleaned.is_absolute() {
        return Ok(cleaned);
    }

    let cwd = std::env::current_dir().map_err(|e| {
        Error::InvalidOutputPath(format!("Failed to get current directory: {}", e))
    })?;
    Ok(cwd.join(cleaned).clean())
}

/// Resolve `filename` below `base_dir`, rejecting anything that escapes it.
fn validate_output_path(base_dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.is_empty() || filename.contains('\0') {
        return Err(Error::InvalidOutputPath(format!(
            "Invalid file name {filename:?}"
        )));
    }

    let full_path = base_dir.join(Path::new(filename).clean()).clean();
    if !full_path.starts_with(base_dir) || full_path == base_dir {
        return Err(Error::InvalidOutputPath(format!(
            "Path '{}' escapes output directory '{}'",
            filename,
            base_dir.display()
        )));
    }

    Ok(full_path)
}

/// `server/m.js` + `.tmp` -> `server/m.js.tmp`; keeps `.js` and `.json`
/// siblings apart.
fn sibling_path(target: &Path, suffix: &str) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn write_files_atomic(operations: &[(PathBuf, &[u8])]) -> Result<()> {
    write_files_atomic_with(operations, &mut |from, to| fs::rename(from, to))
}

/// Stage every file, then swap them in. Existing targets are moved to a
/// backup first so a failed swap can put the previous build back.
fn write_files_atomic_with(
    operations: &[(PathBuf, &[u8])],
    rename: &mut dyn FnMut(&Path, &Path) -> io::Result<()>,
) -> Result<()> {
    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(operations.len());

    for (target, content) in operations {
        if let Some(parent) = target.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                cleanup_temp_files(&staged);
                return Err(Error::WriteFailure(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                )));
            }
        }

        let temp = sibling_path(target, ".tmp");
        if let Err(e) = fs::write(&temp, content) {
            cleanup_temp_files(&staged);
            return Err(Error::WriteFailure(format!(
                "Failed to write temporary file '{}': {}",
                temp.display(),
                e
            )));
        }
        staged.push((temp, target.as_path()));
    }

    let mut committed: Vec<(&Path, Option<PathBuf>)> = Vec::with_capacity(staged.len());
    for (temp, target) in &staged {
        let backup = if target.exists() {
            let backup = sibling_path(target, ".bak");
            if let Err(e) = rename(target, &backup) {
                rollback(&committed);
                cleanup_temp_files(&staged);
                return Err(Error::WriteFailure(format!(
                    "Failed to move '{}' aside: {}",
                    target.display(),
                    e
                )));
            }
            Some(backup)
        } else {
            None
        };

        if let Err(e) = rename(temp, target) {
            committed.push((*target, backup));
            rollback(&committed);
            cleanup_temp_files(&staged);
            return Err(Error::WriteFailure(format!(
                "Failed to rename '{}' to '{}': {}",
                temp.display(),
                target.display(),
                e
            )));
        }
        committed.push((*target, backup));
    }

    for (_, backup) in &committed {
        if let Some(backup) = backup {
            remove_leftover(backup);
        }
    }

    Ok(())
}

/// Put back what `committed` replaced, newest first. A target without a
/// backup did not exist before and is removed.
fn rollback(committed: &[(&Path, Option<PathBuf>)]) {
    for (target, backup) in committed.iter().rev() {
        match backup {
            Some(backup) => {
                if let Err(e) = fs::rename(backup, target) {
                    warn!(
                        file = %target.display(),
                        backup = %backup.display(),
                        error = %e,
                        "failed to restore previous output"
                    );
                }
            }
            None => remove_leftover(target),
        }
    }
}

fn cleanup_temp_files(staged: &[(PathBuf, &Path)]) {
    for (temp, _) in staged {
        remove_leftover(temp);
    }
}

fn remove_leftover(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            warn!(file = %path.display(), error = %e, "failed to remove leftover file");
        }
    }
}
