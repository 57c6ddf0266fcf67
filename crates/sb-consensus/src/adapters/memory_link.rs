//! In-memory shard link.
//!
//! Implements the [`ShardLink`] port for a single free-standing shard:
//! broadcasts are recorded rather than delivered, and the shard-wide state
//! (equivocation monitor, finalization tracker, view) lives behind local
//! locks. Used by engine tests and by anyone driving a shard without a
//! directory.

use crate::domain::{quorum, EquivocationMonitor, Finalization, FinalizationTracker, Screening};
use crate::ports::ShardLink;
use parking_lot::{Mutex, RwLock};
use shared_types::{ConsensusMessage, NodeId, RequestDigest, ViewNumber};
use std::collections::HashSet;

/// Free-standing in-memory shard state.
pub struct MemoryShardLink {
    validators: RwLock<Vec<NodeId>>,
    view: RwLock<ViewNumber>,
    monitor: Mutex<EquivocationMonitor>,
    tracker: Mutex<FinalizationTracker>,
    sent: Mutex<Vec<(ConsensusMessage, Vec<NodeId>)>>,
}

impl MemoryShardLink {
    /// Create a link over a fixed validator set; the first validator is the
    /// view-0 primary.
    pub fn new(validators: Vec<NodeId>) -> Self {
        Self {
            validators: RwLock::new(validators),
            view: RwLock::new(0),
            monitor: Mutex::new(EquivocationMonitor::new()),
            tracker: Mutex::new(FinalizationTracker::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// All messages broadcast so far.
    pub fn sent(&self) -> Vec<ConsensusMessage> {
        self.sent.lock().iter().map(|(m, _)| m.clone()).collect()
    }

    /// Count of broadcast messages matching a kind label.
    pub fn sent_of_kind(&self, kind: &str) -> usize {
        self.sent.lock().iter().filter(|(m, _)| m.kind() == kind).count()
    }

    /// The shard's finalized digests.
    pub fn finalized(&self) -> HashSet<RequestDigest> {
        self.tracker.lock().finalized().clone()
    }

    /// Flag a validator as Byzantine.
    pub fn flag(&self, node: NodeId) {
        self.monitor.lock().flag(node);
    }

    /// Rotate the primary.
    pub fn change_view(&self) -> ViewNumber {
        let mut view = self.view.write();
        *view += 1;
        *view
    }
}

impl ShardLink for MemoryShardLink {
    fn broadcast(&self, message: ConsensusMessage, exclude: &[NodeId]) {
        self.sent.lock().push((message, exclude.to_vec()));
    }

    fn prepare_quorum(&self) -> usize {
        quorum(self.validators.read().len())
    }

    fn commit_quorum(&self) -> usize {
        quorum(self.validators.read().len())
    }

    fn current_primary(&self) -> Option<NodeId> {
        let validators = self.validators.read();
        if validators.is_empty() {
            return None;
        }
        let index = (*self.view.read() as usize) % validators.len();
        Some(validators[index])
    }

    fn is_flagged(&self, node: NodeId) -> bool {
        self.monitor.lock().is_flagged(node)
    }

    fn screen_prepare(&self, sender: NodeId, digest: RequestDigest) -> Screening {
        self.monitor.lock().screen_prepare(sender, digest)
    }

    fn report_commit_vote(&self, digest: RequestDigest, node: NodeId) -> Finalization {
        // Vote insertion and finalize-on-threshold share the lock scope.
        self.tracker.lock().track_commit_vote(digest, node, self.commit_quorum())
    }
}
