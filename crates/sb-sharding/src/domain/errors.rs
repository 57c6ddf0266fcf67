//! Error types for the partitioning subsystem.
//!
//! Thin by design: insufficient nodes degrade to a single shard rather than
//! erroring, so only genuinely unusable policy parameters are failures.

use thiserror::Error;

/// Partitioning error types.
#[derive(Debug, Error)]
pub enum PartitionError {
    /// Policy parameters that cannot produce any labeling.
    #[error("invalid partition policy: {0}")]
    InvalidPolicy(String),
}

/// Result type for partitioning operations.
pub type PartitionResult<T> = Result<T, PartitionError>;
