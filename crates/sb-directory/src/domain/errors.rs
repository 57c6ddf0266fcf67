//! Error types for the directory subsystem.
//!
//! The taxonomy is absorbed at the directory boundary: routing and consensus
//! failures are logged and dropped, never propagated past the shard as hard
//! failures — but every one of them is a typed variant, not a bare log line.

use sb_consensus::ConsensusError;
use sb_sharding::PartitionError;
use shared_types::{NodeId, ShardId};
use thiserror::Error;

/// Directory error types.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// A client id that resolves to no shard; the request is dropped and
    /// never retried.
    #[error("unknown client: {0}")]
    UnknownClient(NodeId),

    /// Unknown shard id.
    #[error("unknown shard: {0}")]
    UnknownShard(ShardId),

    /// A node id the directory has never registered.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// Node ids are stable and unique; re-registration is refused.
    #[error("node already registered: {0}")]
    DuplicateNode(NodeId),

    /// A validator-only entry point was handed a client, or vice versa.
    #[error("node {node} does not have role {expected}")]
    WrongRole {
        /// The offending node.
        node: NodeId,
        /// Required role name.
        expected: &'static str,
    },

    /// Primary-only operation attempted by a replica.
    #[error("node {node} is not the primary of shard {shard}")]
    NotPrimary {
        /// The offending node.
        node: NodeId,
        /// The shard whose primary it is not.
        shard: ShardId,
    },

    /// The current primary sits in the Byzantine set; the request was
    /// refused and a view change was triggered proactively.
    #[error("primary {flagged} of shard {shard} is flagged; view rotated to {successor:?}")]
    PrimaryFlagged {
        /// The shard concerned.
        shard: ShardId,
        /// The refused, flagged primary.
        flagged: NodeId,
        /// The primary after the triggered view change.
        successor: Option<NodeId>,
    },

    /// Partitioner failure.
    #[error(transparent)]
    Partition(#[from] PartitionError),

    /// Consensus-engine failure surfaced through a directory entry point.
    #[error(transparent)]
    Consensus(#[from] ConsensusError),
}

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;
