//! Error types for scheduler operations.

use thiserror::Error;

use crate::core::PoolKey;

/// Errors produced by scheduler components.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoralError {
    /// A project or future-resource event references a pool that does not exist.
    #[error("unknown shared resource `{category}:{name}`")]
    UnknownResource {
        /// Resource category, e.g. `port`.
        category: String,
        /// Resource name within the category.
        name: String,
    },
    /// Configuration rejected before or during setup.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A future resource was scheduled before the run's reference start.
    #[error("future resource `{category}:{name}` scheduled {delay}h before the run start")]
    NegativeDelay {
        /// Resource category.
        category: String,
        /// Resource name.
        name: String,
        /// Magnitude of the negative delay in hours.
        delay: f64,
    },
    /// Resource data exists but could not be read or parsed.
    #[error("resource data for `{key}` unusable: {reason}")]
    ResourceData {
        /// Pool whose data failed to load.
        key: PoolKey,
        /// Loader-provided reason.
        reason: String,
    },
    /// A gang request signal was fired twice.
    #[error("signal already fired for request `{0}`")]
    SignalAlreadyFired(String),
    /// The external project simulator failed.
    #[error("project `{project}` failed: {message}")]
    Executor {
        /// Display name of the failed project.
        project: String,
        /// Collaborator error rendered with its context chain.
        message: String,
    },
    /// Runtime adapter failure (task join, shutdown).
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl CoralError {
    /// Shorthand for [`CoralError::UnknownResource`] built from a key.
    pub fn unknown(key: &PoolKey) -> Self {
        Self::UnknownResource {
            category: key.category.clone(),
            name: key.name.clone(),
        }
    }

    /// Whether this error belongs to the configuration class (fatal before the run).
    pub const fn is_config(&self) -> bool {
        matches!(
            self,
            Self::UnknownResource { .. } | Self::InvalidConfig(_) | Self::NegativeDelay { .. }
        )
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
