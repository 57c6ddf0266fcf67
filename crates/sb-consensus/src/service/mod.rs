//! Replica engine — the per-validator protocol state machine.
//!
//! One engine exists per validator and mutates only that validator's local
//! vote-tracking state; everything shard-wide (quorums, the equivocation
//! monitor, the finalization tracker) is reached through the [`ShardLink`]
//! port. Phase transitions are driven purely by message arrival.

use crate::domain::{
    ConsensusConfig, ConsensusError, ConsensusMode, ConsensusResult, Screening,
};
use crate::ports::{ConsensusApi, ShardLink};
use async_trait::async_trait;
use shared_types::{ClientRequest, ConsensusMessage, NodeId, RequestDigest};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-validator consensus engine.
pub struct ReplicaEngine {
    node: NodeId,
    config: ConsensusConfig,
    link: Arc<dyn ShardLink>,
    /// Integrity-checked PRE-PREPAREs awaiting the prepare fan-out.
    pending_preprepares: Vec<(RequestDigest, ClientRequest)>,
    prepare_votes: HashMap<RequestDigest, HashSet<NodeId>>,
    commit_votes: HashMap<RequestDigest, HashSet<NodeId>>,
    /// Digests whose prepare quorum has been observed (readiness marker).
    prepared: HashSet<RequestDigest>,
    /// Digests this replica has committed to, for strict-mode gating.
    commit_sent: HashSet<RequestDigest>,
}

impl ReplicaEngine {
    /// Create an engine for `node`, bound to its shard through `link`.
    pub fn new(node: NodeId, config: ConsensusConfig, link: Arc<dyn ShardLink>) -> Self {
        Self {
            node,
            config,
            link,
            pending_preprepares: Vec::new(),
            prepare_votes: HashMap::new(),
            commit_votes: HashMap::new(),
            prepared: HashSet::new(),
            commit_sent: HashSet::new(),
        }
    }

    /// The validator this engine belongs to.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Whether this replica has observed a prepare quorum for `digest`.
    pub fn is_prepared(&self, digest: RequestDigest) -> bool {
        self.prepared.contains(&digest)
    }

    /// Primary-only: compute the digest, build the PRE-PREPARE carrying the
    /// original request, and fan it out to every *other* validator.
    ///
    /// No local state changes beyond the broadcast: the primary does not
    /// self-process its own proposal.
    pub fn propose(&self, request: ClientRequest) -> ConsensusResult<RequestDigest> {
        let primary = self.link.current_primary();
        if primary != Some(self.node) {
            warn!(node = %self.node, ?primary, "non-primary attempted to propose");
            return Err(ConsensusError::NotPrimary {
                node: self.node,
                primary,
            });
        }

        let digest = request.digest();
        info!(node = %self.node, %digest, "primary broadcasting PRE-PREPARE");
        self.link.broadcast(
            ConsensusMessage::PrePrepare {
                digest,
                primary: self.node,
                request,
            },
            &[self.node],
        );
        Ok(digest)
    }

    /// Receive a PRE-PREPARE: recompute the digest of the carried request and
    /// queue the proposal if it matches.
    ///
    /// The recomputation is the sole per-message integrity check. There are
    /// no sequence numbers: a second PRE-PREPARE carrying a different digest
    /// is accepted as an independent proposal.
    pub fn receive_preprepare(
        &mut self,
        claimed: RequestDigest,
        primary: NodeId,
        request: ClientRequest,
    ) -> ConsensusResult<()> {
        if self.link.is_flagged(primary) {
            return Err(ConsensusError::ByzantineSender(primary));
        }

        let computed = request.digest();
        if computed != claimed {
            warn!(
                node = %self.node,
                %claimed,
                %computed,
                "invalid digest in PRE-PREPARE, rejecting message"
            );
            return Err(ConsensusError::DigestMismatch { claimed, computed });
        }

        debug!(node = %self.node, digest = %claimed, primary = %primary, "received PRE-PREPARE");
        self.pending_preprepares.push((claimed, request));
        Ok(())
    }

    /// Drain queued PRE-PREPAREs into PREPARE broadcasts and clear the queue.
    pub fn process_prepare(&mut self) -> Vec<RequestDigest> {
        let drained: Vec<_> = self.pending_preprepares.drain(..).collect();
        let mut digests = Vec::with_capacity(drained.len());
        for (digest, _request) in drained {
            debug!(node = %self.node, %digest, "processing PRE-PREPARE, sending PREPARE");
            self.link.broadcast(
                ConsensusMessage::Prepare {
                    digest,
                    sender: self.node,
                },
                &[],
            );
            digests.push(digest);
        }
        digests
    }

    /// Receive a PREPARE vote.
    ///
    /// The sender is screened through the shard's equivocation monitor; an
    /// accepted vote is accumulated, and reaching `2f+1` marks readiness. In
    /// [`ConsensusMode::EagerCommit`] every accepted PREPARE triggers a
    /// COMMIT broadcast regardless of quorum; [`ConsensusMode::QuorumGated`]
    /// broadcasts COMMIT exactly once, when the quorum is first reached.
    pub fn receive_prepare(
        &mut self,
        digest: RequestDigest,
        sender: NodeId,
    ) -> ConsensusResult<()> {
        match self.link.screen_prepare(sender, digest) {
            Screening::Accept => {}
            Screening::AlreadyFlagged => {
                return Err(ConsensusError::ByzantineSender(sender));
            }
            Screening::ConflictingDigest { recorded } => {
                warn!(node = %self.node, sender = %sender, "conflicting PREPARE digests");
                return Err(ConsensusError::Equivocation {
                    sender,
                    recorded,
                    received: digest,
                });
            }
            Screening::MinorityDigest { majority } => {
                warn!(node = %self.node, sender = %sender, "PREPARE against majority digest");
                return Err(ConsensusError::MinorityDigest {
                    sender,
                    digest,
                    majority,
                });
            }
        }

        let votes = self.prepare_votes.entry(digest).or_default();
        votes.insert(sender);
        let reached = votes.len() >= self.link.prepare_quorum();
        if reached && self.prepared.insert(digest) {
            info!(node = %self.node, %digest, "reached 2f+1 PREPAREs");
        }

        let should_commit = match self.config.mode {
            ConsensusMode::EagerCommit => true,
            ConsensusMode::QuorumGated => reached && self.commit_sent.insert(digest),
        };
        if should_commit {
            self.link.broadcast(
                ConsensusMessage::Commit {
                    digest,
                    sender: self.node,
                },
                &[],
            );
        }
        Ok(())
    }

    /// Receive a COMMIT vote; on collecting `2f+1`, report a commit vote to
    /// the shard-level tracker (idempotent there).
    pub fn receive_commit(&mut self, digest: RequestDigest, sender: NodeId) -> ConsensusResult<()> {
        if self.link.is_flagged(sender) {
            return Err(ConsensusError::ByzantineSender(sender));
        }

        let votes = self.commit_votes.entry(digest).or_default();
        votes.insert(sender);
        debug!(node = %self.node, %digest, sender = %sender, votes = votes.len(), "received COMMIT");

        if votes.len() >= self.link.commit_quorum() {
            let outcome = self.link.report_commit_vote(digest, self.node);
            debug!(node = %self.node, %digest, ?outcome, "reported shard-level commit vote");
        }
        Ok(())
    }

    /// Dispatch an inbound message to its phase handler.
    ///
    /// REPLY and CHANGE-VIEW are shard-level concerns; a replica records
    /// nothing for them.
    pub fn receive(&mut self, message: ConsensusMessage) -> ConsensusResult<()> {
        match message {
            ConsensusMessage::PrePrepare {
                digest,
                primary,
                request,
            } => self.receive_preprepare(digest, primary, request),
            ConsensusMessage::Prepare { digest, sender } => self.receive_prepare(digest, sender),
            ConsensusMessage::Commit { digest, sender } => self.receive_commit(digest, sender),
            ConsensusMessage::Reply { .. } | ConsensusMessage::ChangeView { .. } => Ok(()),
        }
    }
}

#[async_trait]
impl ConsensusApi for ReplicaEngine {
    async fn handle_request(&mut self, request: ClientRequest) -> ConsensusResult<RequestDigest> {
        self.propose(request)
    }

    async fn deliver(&mut self, message: ConsensusMessage) -> ConsensusResult<()> {
        self.receive(message)
    }

    async fn process_prepare(&mut self) -> ConsensusResult<Vec<RequestDigest>> {
        Ok(ReplicaEngine::process_prepare(self))
    }
}
