//! Shard-level finalization state.
//!
//! A node that has collected `2f+1` COMMITs for a digest reports one commit
//! vote here. The digest finalizes when `2f+1` *distinct* nodes have each
//! reported — the shard, not any single node, decides finality. Finalization
//! must happen in the same exclusive section as the vote insertion that
//! crosses the threshold; `confirm` stays idempotent regardless as
//! defense in depth.

use shared_types::{NodeId, RequestDigest};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Outcome of recording a shard-level commit vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finalization {
    /// This vote crossed the threshold and finalized the digest.
    Finalized,
    /// The digest was already in the finalized set; logged no-op.
    AlreadyFinalized,
    /// Below threshold; waiting for more distinct nodes.
    Pending {
        /// Distinct nodes that have reported so far.
        votes: usize,
        /// Threshold to finalize.
        quorum: usize,
    },
}

/// Accumulates shard-level commit votes and the finalized set.
#[derive(Debug, Default)]
pub struct FinalizationTracker {
    commit_votes: HashMap<RequestDigest, HashSet<NodeId>>,
    finalized: HashSet<RequestDigest>,
}

impl FinalizationTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `node` has itself collected a commit quorum for `digest`.
    pub fn track_commit_vote(
        &mut self,
        digest: RequestDigest,
        node: NodeId,
        quorum: usize,
    ) -> Finalization {
        let votes = self.commit_votes.entry(digest).or_default();
        votes.insert(node);
        let count = votes.len();
        debug!(%digest, node = %node, votes = count, quorum, "shard-level commit vote");

        if count >= quorum {
            self.confirm(digest)
        } else {
            Finalization::Pending {
                votes: count,
                quorum,
            }
        }
    }

    /// Finalize a digest. Idempotent: re-confirming an already-finalized
    /// digest changes nothing and is only logged.
    pub fn confirm(&mut self, digest: RequestDigest) -> Finalization {
        if !self.finalized.insert(digest) {
            debug!(%digest, "request was already finalized");
            return Finalization::AlreadyFinalized;
        }
        info!(%digest, "request finalized");
        Finalization::Finalized
    }

    /// Whether a digest has been finalized.
    pub fn is_finalized(&self, digest: RequestDigest) -> bool {
        self.finalized.contains(&digest)
    }

    /// The finalized set.
    pub fn finalized(&self) -> &HashSet<RequestDigest> {
        &self.finalized
    }

    /// Distinct shard-level votes recorded for a digest.
    pub fn votes_for(&self, digest: RequestDigest) -> usize {
        self.commit_votes.get(&digest).map_or(0, HashSet::len)
    }
}
