//! Runtime adapters for driving many simulations at once.

pub mod batch;

pub use batch::{ScenarioReport, ScenarioRunner};
