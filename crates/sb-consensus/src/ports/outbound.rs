//! Driven ports (outbound dependencies).
//!
//! A [`ShardLink`] binds a replica engine to its shard: membership-derived
//! quorums, the shared equivocation monitor, the shard-level finalization
//! tracker, and the broadcast fan-out. The directory provides the
//! implementation; a transport adapter (loopback, HTTP, ...) sits behind it.

use crate::domain::{Finalization, Screening};
use shared_types::{ConsensusMessage, NodeId, RequestDigest};

/// A replica's view of its shard.
///
/// All methods are synchronous and lock-backed: broadcast is fire-and-forget
/// (bounded queues, never blocking), and the vote/screening calls run inside
/// the shard's exclusive section on the implementor's side.
pub trait ShardLink: Send + Sync {
    /// Fan a message out to every validator of the shard except `exclude`.
    fn broadcast(&self, message: ConsensusMessage, exclude: &[NodeId]);

    /// `2f+1` over the shard's current validator count (prepare phase).
    fn prepare_quorum(&self) -> usize;

    /// `2f+1` over the shard's current validator count (commit phase).
    fn commit_quorum(&self) -> usize;

    /// The shard's current primary, if the shard has any validators.
    fn current_primary(&self) -> Option<NodeId>;

    /// Whether a sender is in the shard's Byzantine set.
    fn is_flagged(&self, node: NodeId) -> bool;

    /// Screen a prepare vote through the shard's equivocation monitor.
    fn screen_prepare(&self, sender: NodeId, digest: RequestDigest) -> Screening;

    /// Report that `node` has collected its own commit quorum for `digest`.
    ///
    /// Finalize-on-threshold is atomic with the insertion on the
    /// implementor's side.
    fn report_commit_vote(&self, digest: RequestDigest, node: NodeId) -> Finalization;
}

/// Time source for log timestamps.
pub trait TimeSource: Send + Sync {
    /// Current unix timestamp in seconds.
    fn now(&self) -> u64;
}

/// Default time source using system time.
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
