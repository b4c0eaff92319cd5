//! In-memory resource data, for tests and embedding.

use std::collections::HashMap;

use crate::core::{PoolKey, ResourceData};
use crate::infra::loader::{LoadError, ResourceDataLoader};

/// Loader backed by a map of pool keys to data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    data: HashMap<PoolKey, ResourceData>,
}

impl InMemoryLoader {
    /// Empty loader; every lookup is `NotFound`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace data for `(category, name)`.
    #[must_use]
    pub fn with(
        mut self,
        category: impl Into<String>,
        name: impl Into<String>,
        data: ResourceData,
    ) -> Self {
        self.insert(PoolKey::new(category, name), data);
        self
    }

    /// Add or replace data for a pool.
    pub fn insert(&mut self, key: PoolKey, data: ResourceData) {
        self.data.insert(key, data);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the loader holds nothing.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl ResourceDataLoader for InMemoryLoader {
    fn load(&self, key: &PoolKey) -> Result<ResourceData, LoadError> {
        self.data.get(key).cloned().ok_or_else(|| LoadError::NotFound {
            location: format!("memory:{key}"),
        })
    }
}
