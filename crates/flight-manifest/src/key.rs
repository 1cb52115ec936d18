//! Path-derived module keys.
//!
//! A [`ModuleKey`] joins the same source file across bundling passes that
//! number modules independently. It is the module's path relative to the
//! compilation context, with forward slashes only and a leading `./` (or
//! `../` for files outside the context).

use std::fmt;
use std::path::{Component, Path, PathBuf};

use path_clean::PathClean;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleKey(String);

impl ModuleKey {
    /// Wrap a key that was already computed relative to some context, e.g.
    /// one recorded by the server bundling pass.
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(prefix_relative(key.as_ref().replace('\\', "/")))
    }

    /// Derive the key of `resource` relative to `context`.
    ///
    /// Both inputs may use either separator; the result does not depend on
    /// which one was used.
    pub fn from_resource(context: impl AsRef<Path>, resource: &str) -> Self {
        let context = clean_portable(&context.as_ref().to_string_lossy());
        let resource = clean_portable(resource);
        let relative = relative_path(&context, &resource);
        Self(prefix_relative(relative.to_string_lossy().replace('\\', "/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModuleKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn clean_portable(path: &str) -> PathBuf {
    Path::new(&path.replace('\\', "/")).clean()
}

/// Absolute keys are left alone: they can only come from a resource on a
/// different root than the context, and must not pass for relative ones.
fn prefix_relative(key: String) -> String {
    if key == "." || key.is_empty() {
        "./".to_string()
    } else if key.starts_with('/')
        || key.starts_with("./")
        || key.starts_with("../")
        || key == ".."
    {
        key
    } else {
        format!("./{key}")
    }
}

/// Component-wise `to` relative to `from`. Paths with different roots are
/// returned unchanged.
fn relative_path(from: &Path, to: &Path) -> PathBuf {
    if from.has_root() != to.has_root() {
        return to.to_path_buf();
    }

    let from: Vec<Component<'_>> = from
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let to: Vec<Component<'_>> = to
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    let common = from
        .iter()
        .zip(&to)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..from.len() {
        relative.push("..");
    }
    for component in &to[common..] {
        relative.push(component.as_os_str());
    }
    relative
}
