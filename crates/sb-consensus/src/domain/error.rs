//! Error types for the consensus subsystem.
//!
//! Every failure in the taxonomy is typed; callers that absorb one locally
//! (reject-and-drop semantics) still match on the variant and emit a tracing
//! event rather than swallowing a string.

use shared_types::{NodeId, RequestDigest};

/// Consensus error types.
#[derive(Debug, thiserror::Error)]
pub enum ConsensusError {
    /// The digest claimed in a PRE-PREPARE disagrees with the digest
    /// recomputed from its carried request.
    #[error("digest mismatch: claimed {claimed}, computed {computed}")]
    DigestMismatch {
        claimed: RequestDigest,
        computed: RequestDigest,
    },

    /// A primary-only operation was invoked by a non-primary validator.
    #[error("node {node} is not the shard primary ({primary:?})")]
    NotPrimary {
        node: NodeId,
        primary: Option<NodeId>,
    },

    /// Message from a sender already flagged as Byzantine.
    #[error("rejected message from flagged Byzantine sender {0}")]
    ByzantineSender(NodeId),

    /// A sender reported a digest conflicting with its own earlier vote.
    #[error("equivocation by {sender}: first voted {recorded}, now {received}")]
    Equivocation {
        sender: NodeId,
        recorded: RequestDigest,
        received: RequestDigest,
    },

    /// A sender's first vote disagrees with a digest other validators
    /// already agree on.
    #[error("{sender} voted {digest} against established majority {majority}")]
    MinorityDigest {
        sender: NodeId,
        digest: RequestDigest,
        majority: RequestDigest,
    },
}

/// Result type for consensus operations.
pub type ConsensusResult<T> = Result<T, ConsensusError>;
