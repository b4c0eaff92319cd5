//! Location of resource data files on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::PoolKey;

/// Category directories used when none are configured.
pub const DEFAULT_CATEGORY_DIRS: &[(&str, &str)] =
    &[("wtiv", "vessels"), ("feeder", "vessels"), ("port", "ports")];

fn default_category_dirs() -> BTreeMap<String, String> {
    DEFAULT_CATEGORY_DIRS
        .iter()
        .map(|(category, dir)| ((*category).to_string(), (*dir).to_string()))
        .collect()
}

/// Resolves `(category, name)` to `<root>/<category dir>/<name>.yaml`.
///
/// Categories without a directory mapping resolve directly under the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryPaths {
    /// Library root directory.
    pub root: PathBuf,
    /// Category to subdirectory.
    #[serde(default = "default_category_dirs")]
    pub category_dirs: BTreeMap<String, String>,
}

impl LibraryPaths {
    /// Library at `root` with the default category map.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            category_dirs: default_category_dirs(),
        }
    }

    /// Map a category to a subdirectory, replacing any existing mapping.
    #[must_use]
    pub fn with_category_dir(mut self, category: impl Into<String>, dir: impl Into<String>) -> Self {
        self.category_dirs.insert(category.into(), dir.into());
        self
    }

    /// Library root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Data file for a pool.
    pub fn path_for(&self, key: &PoolKey) -> PathBuf {
        let mut path = self.root.clone();
        if let Some(dir) = self.category_dirs.get(&key.category) {
            path.push(dir);
        }
        path.push(format!("{}.yaml", key.name));
        path
    }
}
