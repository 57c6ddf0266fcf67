//! Partition output.

use super::feature::FeatureVector;
use serde::{Deserialize, Serialize};
use shared_types::{NodeId, ShardId};
use std::collections::BTreeMap;

/// One shard's membership and centroid as produced by the partitioner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardSeed {
    /// Validators assigned to this shard.
    pub members: Vec<NodeId>,
    /// Feature-space mean of the members.
    pub centroid: FeatureVector,
}

/// A complete shard labeling: `shard id -> { members, centroid }`.
///
/// The directory owns applying a plan (creating shards, re-homing nodes);
/// the plan itself is plain data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionPlan {
    groups: BTreeMap<ShardId, ShardSeed>,
}

impl PartitionPlan {
    /// Add a group to the plan.
    pub fn insert(&mut self, shard: ShardId, seed: ShardSeed) {
        self.groups.insert(shard, seed);
    }

    /// Number of shards in the plan.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the plan assigns anything at all.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterate groups in shard-id order.
    pub fn iter(&self) -> impl Iterator<Item = (&ShardId, &ShardSeed)> {
        self.groups.iter()
    }

    /// Total members across all groups.
    pub fn total_members(&self) -> usize {
        self.groups.values().map(|seed| seed.members.len()).sum()
    }

    /// The group for one shard.
    pub fn group(&self, shard: ShardId) -> Option<&ShardSeed> {
        self.groups.get(&shard)
    }
}
