//! Shared mutable state of the directory.
//!
//! Every structure that concurrent actors mutate — the shard registry, the
//! node → shard lookup, the global message log — sits behind its own lock
//! here. The shard registry lock also covers the per-shard finalization
//! tracker and equivocation monitor, so vote insertion and
//! finalize-on-threshold share one exclusive section.

use crate::domain::Shard;
use parking_lot::RwLock;
use sb_consensus::TimeSource;
use shared_types::{ConsensusMessage, MessageLogEntry, NodeId, NodeRecord, ShardId};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

pub(crate) struct DirectoryState {
    /// Shard registry; owns every shard and, through it, all membership.
    pub shards: RwLock<BTreeMap<ShardId, Shard>>,
    /// Arena lookup: node id -> owning shard id.
    pub assignments: RwLock<HashMap<NodeId, ShardId>>,
    /// Registration records for every known node.
    pub profiles: RwLock<HashMap<NodeId, NodeRecord>>,
    /// Clients waiting for the first shard to exist.
    pub unassigned_clients: RwLock<Vec<NodeId>>,
    /// Global observability log of broadcast and delivered messages.
    pub message_log: RwLock<Vec<MessageLogEntry>>,
    /// Timestamp source for log entries.
    pub time: Arc<dyn TimeSource>,
}

impl DirectoryState {
    pub fn new(time: Arc<dyn TimeSource>) -> Self {
        Self {
            shards: RwLock::new(BTreeMap::new()),
            assignments: RwLock::new(HashMap::new()),
            profiles: RwLock::new(HashMap::new()),
            unassigned_clients: RwLock::new(Vec::new()),
            message_log: RwLock::new(Vec::new()),
            time,
        }
    }

    /// The shard a node currently belongs to.
    pub fn shard_of(&self, node: NodeId) -> Option<ShardId> {
        self.assignments.read().get(&node).copied()
    }

    pub fn now(&self) -> u64 {
        self.time.now()
    }

    /// Record a message on the global log.
    pub fn log_message(&self, shard: ShardId, message: ConsensusMessage) {
        self.message_log.write().push(MessageLogEntry {
            correlation_id: Uuid::new_v4(),
            shard,
            message,
            logged_at: self.now(),
        });
    }
}
