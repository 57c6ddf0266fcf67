//! Driving port (inbound API).
//!
//! The transport-agnostic contract exposed to clients, deployment tooling,
//! and inbound message adapters. The loopback simulation and any external
//! HTTP/process-per-node adapter drive exactly this surface.

use crate::domain::DirectoryResult;
use async_trait::async_trait;
use sb_sharding::PartitionPolicy;
use shared_types::{
    ConsensusMessage, MessageLogEntry, NodeId, NodeRecord, RequestDigest, RequestLogEntry, ShardId,
};
use std::collections::HashSet;

/// Directory API - inbound port.
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    /// Entry point for clients: route a request to the responsible shard's
    /// log and return its digest.
    async fn submit_request(
        &self,
        sender: NodeId,
        receiver: NodeId,
        payload: String,
    ) -> DirectoryResult<RequestDigest>;

    /// Entry point for the transport layer: hand an inbound protocol message
    /// to the addressed shard.
    async fn deliver(&self, shard: ShardId, message: ConsensusMessage) -> DirectoryResult<()>;

    /// Register a validator; single joins place incrementally by nearest
    /// centroid.
    async fn add_validator(&self, record: NodeRecord) -> DirectoryResult<ShardId>;

    /// Register a client; homed in the least-populated shard, or parked
    /// unassigned until shards exist.
    async fn add_client(&self, record: NodeRecord) -> DirectoryResult<Option<ShardId>>;

    /// Recompute the full partition (barrier operation). `None` keeps the
    /// current policy.
    async fn recompute_shards(&self, policy: Option<PartitionPolicy>) -> DirectoryResult<usize>;

    /// Read-only: a shard's pending request log.
    fn requests(&self, shard: ShardId) -> DirectoryResult<Vec<RequestLogEntry>>;

    /// Read-only: a shard's finalized digests.
    fn completed_requests(&self, shard: ShardId) -> DirectoryResult<HashSet<RequestDigest>>;

    /// Read-only: the global message log.
    fn message_log(&self) -> Vec<MessageLogEntry>;
}
