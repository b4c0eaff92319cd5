//! Builders to construct a resource library from an allocation.

use crate::config::AllocationConfig;
use crate::core::{CoralError, PoolKey, ResourceData, ResourceLibrary, SkippedResource};
use crate::infra::{LoadError, ResourceDataLoader};

/// Build a library with one pool per allocated resource.
///
/// Resources whose data is missing are skipped with a warning and recorded
/// on the library; unreadable data is fatal.
pub fn build_library(
    cfg: &AllocationConfig,
    loader: &dyn ResourceDataLoader,
) -> Result<ResourceLibrary, CoralError> {
    cfg.validate()
        .map_err(|e| CoralError::InvalidConfig(format!("allocation invalid: {e}")))?;

    let mut library = ResourceLibrary::new();
    for (key, capacity) in cfg.pools() {
        match loader.load(&key) {
            Ok(data) => library.add_pool(key, capacity, data)?,
            Err(LoadError::NotFound { location }) => {
                tracing::warn!("resource data for {} not found at {}; skipping", key, location);
                library.record_skipped(SkippedResource { key, location });
            }
            Err(LoadError::Invalid { location, reason }) => {
                return Err(CoralError::ResourceData {
                    key,
                    reason: format!("{location}: {reason}"),
                });
            }
        }
    }
    Ok(library)
}

/// Incremental library construction without a loader.
#[derive(Debug, Default)]
pub struct LibraryBuilder {
    pools: Vec<(PoolKey, u32, ResourceData)>,
}

impl LibraryBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pool.
    #[must_use]
    pub fn pool(
        mut self,
        category: impl Into<String>,
        name: impl Into<String>,
        capacity: u32,
        data: ResourceData,
    ) -> Self {
        self.pools
            .push((PoolKey::new(category, name), capacity, data));
        self
    }

    /// Build the library. Duplicate pools are rejected.
    pub fn build(self) -> Result<ResourceLibrary, CoralError> {
        let mut library = ResourceLibrary::new();
        for (key, capacity, data) in self.pools {
            library.add_pool(key, capacity, data)?;
        }
        Ok(library)
    }
}
