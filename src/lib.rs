//! # Coral
//!
//! A discrete-event scheduler for concurrent project simulations that share
//! capacity-limited resources.
//!
//! Many construction projects (offshore wind farms, for example) each need a
//! set of shared assets at the same time: an installation vessel, a feeder
//! barge, a port berth. Coral models every asset as a [`core::ResourcePool`]
//! and every project as a process on a virtual clock. A project asks for all
//! of its assets at once as a [`core::GangRequest`] and receives them together
//! or not at all.
//!
//! ## Key Features
//!
//! - **Virtual clock**: a single-threaded cooperative event loop with
//!   deterministic ordering of same-time events
//! - **Gang grants**: all-or-nothing acquisition with a scan that lets small
//!   requests overtake large ones
//! - **Future capacity**: pools can grow at scheduled hours or calendar dates
//! - **Pluggable simulator**: project durations come from a
//!   [`core::ProjectExecutor`]
//! - **Scenario batches**: independent what-if runs on tokio's blocking pool
//!
//! ## Running a simulation
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use coral::builders::build_library;
//! use coral::config::{AllocationConfig, ProjectConfig};
//! use coral::core::GlobalManager;
//! use coral::infra::InMemoryLoader;
//!
//! let allocation = AllocationConfig::new().with("port", "new_bedford", 1);
//! let loader = InMemoryLoader::new().with("port", "new_bedford", serde_json::json!({}));
//! let library = build_library(&allocation, &loader)?;
//!
//! let projects = vec![
//!     ProjectConfig::from_json_str(r#"{"project_name": "a", "port": "_shared_pool_:new_bedford"}"#)?,
//!     ProjectConfig::from_json_str(r#"{"project_name": "b", "port": "_shared_pool_:new_bedford"}"#)?,
//! ];
//! let manager = GlobalManager::new(projects, library, Arc::new(my_simulator))?;
//! let report = manager.run();
//! for log in &report.logs {
//!     println!("{} started {} finished {}", log.name, log.started, log.finished);
//! }
//! ```
//!
//! For complete examples, see `tests/gang_scheduling_test.rs`.

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Builders to construct a resource library from configuration.
pub mod builders;
/// Configuration models for allocations, projects, and scenarios.
pub mod config;
/// Virtual clock, pools, gang requests, and the global manager.
pub mod core;
/// Resource data loaders.
pub mod infra;
/// Runtime adapters for running scenarios concurrently.
#[cfg(feature = "tokio-runtime")]
pub mod runtime;
/// Shared utilities.
pub mod util;
