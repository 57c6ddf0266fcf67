//! # Core Domain Entities
//!
//! Node records and client requests.
//!
//! ## Clusters
//!
//! - **Membership**: `NodeRole`, `ResourceProfile`, `NodeRecord`
//! - **Requests**: `ClientRequest` and its canonical digest

use crate::ids::{NodeId, RequestDigest};
use serde::{Deserialize, Serialize};

/// Capability tag for a node.
///
/// Role-specific behavior (consensus participation, request submission) is
/// dispatched on this tag rather than through an inheritance chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    /// Runs the three-phase consensus protocol for its shard.
    Validator,
    /// Submits requests; never votes.
    Client,
}

/// Resource features of a validator.
///
/// Meaningful for validators only; clients carry the default profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceProfile {
    /// Relative CPU capability.
    pub cpu_rating: f64,
    /// Current RAM usage.
    pub ram_usage: f64,
    /// Trustworthiness score accumulated by the node.
    pub reputation_score: f64,
}

impl Default for ResourceProfile {
    fn default() -> Self {
        Self {
            cpu_rating: 1.0,
            ram_usage: 1.0,
            reputation_score: 1.0,
        }
    }
}

/// Registration record for a node joining the network.
///
/// The record carries no shard reference: the directory owns the
/// `NodeId -> ShardId` relation and rewrites it on every repartition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Unique, stable identifier.
    pub id: NodeId,
    /// Capability tag.
    pub role: NodeRole,
    /// Resource features (default for clients).
    pub profile: ResourceProfile,
}

impl NodeRecord {
    /// Create a validator record.
    pub fn validator(id: impl Into<NodeId>, profile: ResourceProfile) -> Self {
        Self {
            id: id.into(),
            role: NodeRole::Validator,
            profile,
        }
    }

    /// Create a client record.
    pub fn client(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            role: NodeRole::Client,
            profile: ResourceProfile::default(),
        }
    }
}

/// A client-submitted request.
///
/// The digest of its canonical encoding is the correctness anchor for every
/// later consensus phase: any recomputed digest that disagrees with a claimed
/// digest is evidence of tampering or equivocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRequest {
    /// Submitting client.
    pub sender: NodeId,
    /// Addressed client.
    pub receiver: NodeId,
    /// Opaque request payload.
    pub payload: String,
}

impl ClientRequest {
    /// Create a new request.
    pub fn new(sender: NodeId, receiver: NodeId, payload: impl Into<String>) -> Self {
        Self {
            sender,
            receiver,
            payload: payload.into(),
        }
    }

    /// Canonical encoding: fixed field order, length-prefixed payload.
    ///
    /// Two requests agree on their digest iff they agree on every field.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let payload = self.payload.as_bytes();
        let mut bytes = Vec::with_capacity(24 + payload.len());
        bytes.extend_from_slice(&self.sender.0.to_be_bytes());
        bytes.extend_from_slice(&self.receiver.0.to_be_bytes());
        bytes.extend_from_slice(&(payload.len() as u64).to_be_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    /// Compute the request digest.
    pub fn digest(&self) -> RequestDigest {
        RequestDigest::of(&self.canonical_bytes())
    }
}
