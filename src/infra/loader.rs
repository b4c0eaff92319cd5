//! Resource data loaders.

use std::io::ErrorKind;

use thiserror::Error;

use crate::config::LibraryPaths;
use crate::core::{PoolKey, ResourceData};

/// Failure to produce data for a pool.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// No data exists for the pool. The pool is skipped.
    #[error("no resource data at {location}")]
    NotFound {
        /// Where the loader looked.
        location: String,
    },
    /// Data exists but is unreadable or malformed.
    #[error("resource data at {location} invalid: {reason}")]
    Invalid {
        /// Where the loader looked.
        location: String,
        /// Underlying I/O or parse error.
        reason: String,
    },
}

impl LoadError {
    /// Whether the pool can be skipped and the run continue.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Source of the opaque data attached to each pool.
pub trait ResourceDataLoader: Send + Sync {
    /// Load the data for `key`.
    fn load(&self, key: &PoolKey) -> Result<ResourceData, LoadError>;
}

/// Loads `<root>/<category dir>/<name>.yaml` files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YamlLibraryLoader {
    paths: LibraryPaths,
}

impl YamlLibraryLoader {
    /// Loader over a library layout.
    pub const fn new(paths: LibraryPaths) -> Self {
        Self { paths }
    }

    /// Library layout in use.
    pub const fn paths(&self) -> &LibraryPaths {
        &self.paths
    }
}

impl ResourceDataLoader for YamlLibraryLoader {
    fn load(&self, key: &PoolKey) -> Result<ResourceData, LoadError> {
        let path = self.paths.path_for(key);
        let location = path.display().to_string();
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(LoadError::NotFound { location });
            }
            Err(e) => {
                return Err(LoadError::Invalid {
                    location,
                    reason: e.to_string(),
                })
            }
        };
        serde_yml::from_str::<serde_json::Value>(&text).map_err(|e| LoadError::Invalid {
            location,
            reason: e.to_string(),
        })
    }
}
