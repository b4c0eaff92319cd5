//! Configuration models for allocations, projects, libraries, and scenarios.

pub mod allocation;
pub mod library;
pub mod project;
pub mod scenario;

pub use allocation::{AllocationConfig, AllocationEntry};
pub use library::LibraryPaths;
pub use project::{ConfigValue, ProjectConfig, StartTime, SHARED_POOL_MARKER};
pub use scenario::{FutureResource, ScenarioConfig, ScenarioSet};
