//! The shard entity.
//!
//! A shard exclusively owns its membership lists: validators (in stable join
//! order, which the view rotation indexes into), clients, the request log
//! its primary drains, the shard-level finalization tracker, and the
//! equivocation monitor. Nodes hold no back-references; the directory
//! resolves node → shard through its own lookup.

use sb_consensus::{quorum, EquivocationMonitor, FinalizationTracker};
use sb_sharding::FeatureVector;
use shared_types::{NodeId, RequestLogEntry, ShardId, ViewNumber};
use std::collections::HashSet;
use tracing::{debug, info};

/// One shard: membership, primary view, request log, consensus accumulators.
pub struct Shard {
    id: ShardId,
    validators: Vec<NodeId>,
    clients: HashSet<NodeId>,
    view: ViewNumber,
    centroid: Option<FeatureVector>,
    request_log: Vec<RequestLogEntry>,
    /// Shard-level commit-vote accumulator and finalized set.
    pub finalization: FinalizationTracker,
    /// Shard-level Byzantine-sender state.
    pub equivocation: EquivocationMonitor,
}

impl Shard {
    /// Create an empty shard.
    pub fn new(id: ShardId) -> Self {
        Self {
            id,
            validators: Vec::new(),
            clients: HashSet::new(),
            view: 0,
            centroid: None,
            request_log: Vec::new(),
            finalization: FinalizationTracker::new(),
            equivocation: EquivocationMonitor::new(),
        }
    }

    /// Shard identifier.
    pub fn id(&self) -> ShardId {
        self.id
    }

    /// Validators in stable join order.
    pub fn validators(&self) -> &[NodeId] {
        &self.validators
    }

    /// Clients homed in this shard.
    pub fn clients(&self) -> &HashSet<NodeId> {
        &self.clients
    }

    /// Current view number.
    pub fn view(&self) -> ViewNumber {
        self.view
    }

    /// Feature-space mean of the shard's validators.
    pub fn centroid(&self) -> Option<FeatureVector> {
        self.centroid
    }

    /// The primary for the current view: `validators[view mod n]`.
    /// `None` before the first validator joins.
    pub fn primary(&self) -> Option<NodeId> {
        if self.validators.is_empty() {
            return None;
        }
        let index = (self.view as usize) % self.validators.len();
        Some(self.validators[index])
    }

    /// Every validator except the current primary.
    pub fn replicas(&self) -> Vec<NodeId> {
        let primary = self.primary();
        self.validators
            .iter()
            .copied()
            .filter(|validator| Some(*validator) != primary)
            .collect()
    }

    /// `2f+1` for the PREPARE phase.
    pub fn prepare_quorum(&self) -> usize {
        quorum(self.validators.len())
    }

    /// `2f+1` for the COMMIT phase.
    pub fn commit_quorum(&self) -> usize {
        quorum(self.validators.len())
    }

    /// Add a validator. The first validator of a shard becomes its primary
    /// by way of the view-0 rotation.
    pub fn add_validator(&mut self, node: NodeId) {
        if !self.validators.contains(&node) {
            self.validators.push(node);
        }
    }

    /// Add a client.
    pub fn add_client(&mut self, node: NodeId) {
        self.clients.insert(node);
    }

    /// Replace the stored centroid after a membership change.
    pub fn set_centroid(&mut self, centroid: Option<FeatureVector>) {
        self.centroid = centroid;
    }

    /// Append a request for the primary to pick up.
    pub fn log_request(&mut self, entry: RequestLogEntry) {
        debug!(shard = self.id, sender = %entry.sender, receiver = %entry.receiver, "request logged");
        self.request_log.push(entry);
    }

    /// The pending request log.
    pub fn requests(&self) -> &[RequestLogEntry] {
        &self.request_log
    }

    /// Increment the view and re-designate the primary.
    pub fn change_view(&mut self) -> ViewNumber {
        self.view += 1;
        info!(shard = self.id, view = self.view, primary = ?self.primary(), "view changed");
        self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::ClientRequest;

    fn shard_of(count: u64) -> Shard {
        let mut shard = Shard::new(0);
        for id in 0..count {
            shard.add_validator(NodeId(id));
        }
        shard
    }

    #[test]
    fn test_empty_shard_has_no_primary() {
        let shard = Shard::new(0);
        assert_eq!(shard.primary(), None);
        assert!(shard.replicas().is_empty());
    }

    #[test]
    fn test_first_validator_becomes_primary() {
        let shard = shard_of(4);
        assert_eq!(shard.primary(), Some(NodeId(0)));
        assert_eq!(shard.replicas(), vec![NodeId(1), NodeId(2), NodeId(3)]);
    }

    #[test]
    fn test_duplicate_validator_ignored() {
        let mut shard = shard_of(2);
        shard.add_validator(NodeId(0));
        assert_eq!(shard.validators().len(), 2);
    }

    #[test]
    fn test_quorums_follow_membership() {
        assert_eq!(shard_of(4).prepare_quorum(), 3);
        assert_eq!(shard_of(10).commit_quorum(), 7);
    }

    #[test]
    fn test_view_rotation_wraps() {
        let mut shard = shard_of(3);
        assert_eq!(shard.change_view(), 1);
        assert_eq!(shard.primary(), Some(NodeId(1)));
        shard.change_view();
        shard.change_view();
        assert_eq!(shard.view(), 3);
        assert_eq!(shard.primary(), Some(NodeId(0)));
    }

    #[test]
    fn test_request_log_append() {
        let mut shard = shard_of(1);
        let request = ClientRequest::new(NodeId(10), NodeId(11), "pay");
        shard.log_request(RequestLogEntry {
            sender: NodeId(10),
            receiver: NodeId(11),
            request,
            logged_at: 0,
        });
        assert_eq!(shard.requests().len(), 1);
    }
}
