//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Commit-broadcast behavior of a replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConsensusMode {
    /// Broadcast COMMIT on every accepted PREPARE. The prepare quorum only
    /// marks readiness and never gates the broadcast.
    ///
    /// Deviates from canonical PBFT, which withholds COMMIT until `2f+1`
    /// PREPAREs are collected.
    #[default]
    EagerCommit,
    /// Canonical PBFT gating: broadcast COMMIT exactly once, when the
    /// prepare quorum is first reached.
    QuorumGated,
}

/// Configuration for a [`crate::ReplicaEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConsensusConfig {
    /// Commit-broadcast behavior.
    pub mode: ConsensusMode,
}

impl ConsensusConfig {
    /// Canonical PBFT commit gating.
    pub fn strict() -> Self {
        Self {
            mode: ConsensusMode::QuorumGated,
        }
    }
}
