//! Builders that assemble a resource library from configuration.

pub mod library_builder;

pub use library_builder::{build_library, LibraryBuilder};
