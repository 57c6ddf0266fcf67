//! Loopback transport.
//!
//! Implements the consensus [`ShardLink`] port over the directory's shared
//! state. Broadcast is fire-and-forget: messages are pushed onto one bounded
//! queue with `try_send`, a full queue warns and drops, and nothing ever
//! blocks a sender. The directory's pump drains the queue and dispatches
//! each envelope to the owning replica engine.
//!
//! An external process-per-node transport would implement the same port;
//! nothing in the consensus crate knows which one is wired in.

use crate::state::DirectoryState;
use sb_consensus::{quorum, Finalization, Screening, ShardLink};
use shared_types::{ConsensusMessage, NodeId, ReplyOutcome, RequestDigest};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One queued delivery: the addressed validator and the message.
pub(crate) type Envelope = (NodeId, ConsensusMessage);

/// A replica's link to its shard, backed by the directory state.
pub(crate) struct NodeLink {
    node: NodeId,
    state: Arc<DirectoryState>,
    outbox: mpsc::Sender<Envelope>,
}

impl NodeLink {
    pub fn new(node: NodeId, state: Arc<DirectoryState>, outbox: mpsc::Sender<Envelope>) -> Self {
        Self {
            node,
            state,
            outbox,
        }
    }

    fn members(&self) -> Vec<NodeId> {
        let Some(shard) = self.state.shard_of(self.node) else {
            return Vec::new();
        };
        self.state
            .shards
            .read()
            .get(&shard)
            .map(|shard| shard.validators().to_vec())
            .unwrap_or_default()
    }

    fn enqueue(&self, target: NodeId, message: ConsensusMessage) {
        if self.outbox.try_send((target, message)).is_err() {
            warn!(recipient = %target, "loopback queue full, dropping message");
        }
    }
}

impl ShardLink for NodeLink {
    fn broadcast(&self, message: ConsensusMessage, exclude: &[NodeId]) {
        let Some(shard) = self.state.shard_of(self.node) else {
            warn!(node = %self.node, "broadcast from unassigned node dropped");
            return;
        };
        self.state.log_message(shard, message.clone());
        for member in self.members() {
            if !exclude.contains(&member) {
                self.enqueue(member, message.clone());
            }
        }
    }

    fn prepare_quorum(&self) -> usize {
        quorum(self.members().len())
    }

    fn commit_quorum(&self) -> usize {
        quorum(self.members().len())
    }

    fn current_primary(&self) -> Option<NodeId> {
        let shard = self.state.shard_of(self.node)?;
        self.state.shards.read().get(&shard)?.primary()
    }

    fn is_flagged(&self, node: NodeId) -> bool {
        let Some(shard) = self.state.shard_of(self.node) else {
            return false;
        };
        self.state
            .shards
            .read()
            .get(&shard)
            .is_some_and(|shard| shard.equivocation.is_flagged(node))
    }

    fn screen_prepare(&self, sender: NodeId, digest: RequestDigest) -> Screening {
        let Some(shard) = self.state.shard_of(self.node) else {
            return Screening::Accept;
        };
        let mut shards = self.state.shards.write();
        match shards.get_mut(&shard) {
            Some(shard) => shard.equivocation.screen_prepare(sender, digest),
            None => Screening::Accept,
        }
    }

    fn report_commit_vote(&self, digest: RequestDigest, node: NodeId) -> Finalization {
        let Some(shard_id) = self.state.shard_of(self.node) else {
            warn!(node = %self.node, "commit vote from unassigned node dropped");
            return Finalization::Pending { votes: 0, quorum: usize::MAX };
        };

        // Vote insertion and finalize-on-threshold inside one write guard.
        let outcome = {
            let mut shards = self.state.shards.write();
            match shards.get_mut(&shard_id) {
                Some(shard) => {
                    let quorum = shard.commit_quorum();
                    shard.finalization.track_commit_vote(digest, node, quorum)
                }
                None => Finalization::Pending { votes: 0, quorum: usize::MAX },
            }
        };

        if outcome == Finalization::Finalized {
            debug!(shard = shard_id, %digest, "finalized, logging REPLY");
            self.state.log_message(
                shard_id,
                ConsensusMessage::Reply {
                    digest,
                    sender: node,
                    outcome: ReplyOutcome::Committed,
                },
            );
        }
        outcome
    }
}
