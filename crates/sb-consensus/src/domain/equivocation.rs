//! Byzantine-sender detection over prepare votes.
//!
//! One monitor exists per shard. It keeps the first digest each sender voted
//! for, a per-digest agreement count over those first votes, and the
//! permanent flagged set. A sender is flagged the moment it either
//! contradicts its own recorded vote or casts its first vote against a
//! digest that at least two validators already agree on.
//!
//! There is no un-flagging or rehabilitation path: a flag lasts for the
//! shard's lifetime.

use shared_types::{NodeId, RequestDigest};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Verdict of screening one prepare vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screening {
    /// Vote is consistent; count it.
    Accept,
    /// Sender was flagged earlier; reject unconditionally.
    AlreadyFlagged,
    /// Sender contradicted its own earlier digest; now flagged.
    ConflictingDigest {
        /// The digest the sender first voted for.
        recorded: RequestDigest,
    },
    /// Sender's first vote opposes an established majority digest; now
    /// flagged.
    MinorityDigest {
        /// The digest holding the highest agreement count.
        majority: RequestDigest,
    },
}

/// Per-shard equivocation state.
#[derive(Debug, Default)]
pub struct EquivocationMonitor {
    first_digest: HashMap<NodeId, RequestDigest>,
    agreement: HashMap<RequestDigest, usize>,
    flagged: HashSet<NodeId>,
}

impl EquivocationMonitor {
    /// Create an empty monitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a sender has been flagged as Byzantine.
    pub fn is_flagged(&self, node: NodeId) -> bool {
        self.flagged.contains(&node)
    }

    /// The flagged senders.
    pub fn flagged(&self) -> &HashSet<NodeId> {
        &self.flagged
    }

    /// Flag a sender outright (e.g. an operator-reported fault).
    pub fn flag(&mut self, node: NodeId) {
        if self.flagged.insert(node) {
            warn!(node = %node, "flagged Byzantine sender");
        }
    }

    /// Screen one prepare vote, updating detection state.
    pub fn screen_prepare(&mut self, sender: NodeId, digest: RequestDigest) -> Screening {
        if self.flagged.contains(&sender) {
            return Screening::AlreadyFlagged;
        }

        match self.first_digest.get(&sender) {
            None => {
                self.first_digest.insert(sender, digest);
                *self.agreement.entry(digest).or_insert(0) += 1;

                // Majority floor for small samples: two agreeing senders
                // establish a majority digest; a first vote against it is
                // treated as Byzantine.
                let (majority, max_count) = self
                    .agreement
                    .iter()
                    .max_by_key(|(_, count)| **count)
                    .map(|(d, count)| (*d, *count))
                    .unwrap_or((digest, 0));
                let own_count = self.agreement.get(&digest).copied().unwrap_or(0);
                if max_count >= 2 && own_count < max_count {
                    self.flag(sender);
                    return Screening::MinorityDigest { majority };
                }
                Screening::Accept
            }
            Some(&recorded) if recorded == digest => Screening::Accept,
            Some(&recorded) => {
                self.flag(sender);
                Screening::ConflictingDigest { recorded }
            }
        }
    }
}
