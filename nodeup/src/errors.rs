//! Error types for the bootstrap pipeline.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type NodeupResult<T> = Result<T, NodeupError>;

/// Fatal bootstrap errors.
///
/// Every variant aborts the pipeline; nothing is retried. The variants map
/// onto the pipeline stages so a diagnostic always names the stage that
/// failed.
#[derive(Debug, Error)]
pub enum NodeupError {
    /// Configuration could not be resolved (e.g. a required path cannot be
    /// made absolute).
    #[error("config error: {0}")]
    Config(String),

    /// The mount directory could not be brought to a clean state.
    #[error("mount error: {0}")]
    Mount(String),

    /// The build tool failed or exceeded its deadline.
    #[error("build error: {0}")]
    Build(String),

    /// The mount directory could not be created, or the node process could
    /// not be started and confirmed.
    #[error("launch error: {0}")]
    Launch(String),

    /// Pipeline bookkeeping violation. Indicates a bug, not an operator
    /// error.
    #[error("internal error: {0}")]
    Internal(String),
}
