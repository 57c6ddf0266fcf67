//! # Consensus Messages
//!
//! The tagged message variants exchanged between validators, plus the log
//! entry types exposed on the observability surface.
//!
//! Messages are immutable once constructed. Every variant carries at minimum
//! the request digest it refers to and the id of its sender.

use crate::entities::ClientRequest;
use crate::ids::{NodeId, RequestDigest, ShardId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome reported to a client in a REPLY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyOutcome {
    /// The request's digest entered the shard's finalized set.
    Committed,
}

/// A consensus protocol message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING-KEBAB-CASE")]
pub enum ConsensusMessage {
    /// Primary's proposal carrying the original client request.
    PrePrepare {
        /// Digest the primary claims for `request`.
        digest: RequestDigest,
        /// The proposing primary.
        primary: NodeId,
        /// The original client request payload.
        request: ClientRequest,
    },
    /// A replica's prepare vote.
    Prepare {
        /// Digest being voted on.
        digest: RequestDigest,
        /// Voting validator.
        sender: NodeId,
    },
    /// A replica's commit vote.
    Commit {
        /// Digest being voted on.
        digest: RequestDigest,
        /// Voting validator.
        sender: NodeId,
    },
    /// Finalization notice addressed back to clients.
    Reply {
        /// Finalized digest.
        digest: RequestDigest,
        /// Reporting validator.
        sender: NodeId,
        /// Outcome of the request.
        outcome: ReplyOutcome,
    },
    /// Primary rotation trigger.
    ChangeView {
        /// Digest of the request that exposed the primary, if any.
        digest: RequestDigest,
        /// Validator requesting the rotation.
        sender: NodeId,
    },
}

impl ConsensusMessage {
    /// The digest this message refers to.
    pub fn digest(&self) -> RequestDigest {
        match self {
            Self::PrePrepare { digest, .. }
            | Self::Prepare { digest, .. }
            | Self::Commit { digest, .. }
            | Self::Reply { digest, .. }
            | Self::ChangeView { digest, .. } => *digest,
        }
    }

    /// The node that produced this message.
    pub fn sender(&self) -> NodeId {
        match self {
            Self::PrePrepare { primary, .. } => *primary,
            Self::Prepare { sender, .. }
            | Self::Commit { sender, .. }
            | Self::Reply { sender, .. }
            | Self::ChangeView { sender, .. } => *sender,
        }
    }

    /// Short label for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PrePrepare { .. } => "PRE-PREPARE",
            Self::Prepare { .. } => "PREPARE",
            Self::Commit { .. } => "COMMIT",
            Self::Reply { .. } => "REPLY",
            Self::ChangeView { .. } => "CHANGE-VIEW",
        }
    }
}

/// A request waiting in a shard's log for its primary to pick up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestLogEntry {
    /// Submitting client.
    pub sender: NodeId,
    /// Addressed client.
    pub receiver: NodeId,
    /// The request itself.
    pub request: ClientRequest,
    /// Unix timestamp at logging time.
    pub logged_at: u64,
}

/// One broadcast recorded on the global message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageLogEntry {
    /// Correlation id for tracing a broadcast across log consumers.
    pub correlation_id: Uuid,
    /// Shard the broadcast was addressed to.
    pub shard: ShardId,
    /// The message broadcast.
    pub message: ConsensusMessage,
    /// Unix timestamp at logging time.
    pub logged_at: u64,
}
