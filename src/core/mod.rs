//! Core scheduling abstractions: virtual clock, pools, gangs, and the manager.

pub mod clock;
pub mod error;
pub mod executor;
pub mod gang;
pub mod library;
pub mod manager;
pub mod project;
pub mod resource_pool;

pub use clock::{Environment, ProcessId, SimTime, Timeout};
pub use error::{AppResult, CoralError};
pub use executor::{
    ExecutionReport, ProjectExecutor, ResolvedConfig, WeatherRecord, WeatherSeries, WeatherWindow,
};
pub use gang::{GangRequest, GangWait, GrantedResources};
pub use library::{ResourceLibrary, SkippedResource};
pub use manager::{GlobalManager, ProjectSummary, RunReport};
pub use project::{ProjectFailure, ProjectLog, ProjectState};
pub use resource_pool::{CapacityNotifier, PoolKey, ResourceData, ResourcePool};
