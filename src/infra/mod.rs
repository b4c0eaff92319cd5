//! Infrastructure adapters for resource data sources.

pub mod loader;
pub mod memory;

pub use loader::{LoadError, ResourceDataLoader, YamlLibraryLoader};
pub use memory::InMemoryLoader;
