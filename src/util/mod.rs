//! Shared utilities: calendar conversion and tracing setup.

pub mod dates;
pub mod telemetry;

pub use dates::*;
pub use telemetry::*;
