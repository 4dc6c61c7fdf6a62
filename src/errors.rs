// src/errors.rs

// error handling for the admission gate

// dependencies
use thiserror::Error;

/// Error type for admission gate configuration issues.
///
/// Every variant is raised while the gate is being constructed. A gate that
/// was built successfully never returns an error from a decision.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Capacity must be positive")]
    InvalidCapacity,
    #[error("Refill rate must be at least one token per second")]
    InvalidRefillRate,
    #[error("Leak interval must be positive")]
    InvalidLeakInterval,
    #[error("Window size must be positive")]
    InvalidWindow,
    #[error("Cleanup interval must be positive")]
    InvalidCleanupInterval,
    #[error("Idle threshold must be positive")]
    InvalidIdleThreshold,
    #[error("Unknown strategy `{0}`")]
    UnknownStrategy(String),
}

/// Error raised when the background reaper cannot be started.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ReaperError {
    #[error("Failed to spawn reaper thread: {0}")]
    Spawn(#[from] std::io::Error),
}
