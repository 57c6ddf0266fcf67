//! Partitioning policies.

use serde::{Deserialize, Serialize};

/// Which clustering strategy to run, with its parameters.
///
/// Both strategies are pluggable through the same entry point,
/// [`crate::partition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PartitionPolicy {
    /// Search candidate shard counts `s` in `[shard_count_min,
    /// shard_count_max]`, clustering the `(cpu_rating, ram_usage)` plane with
    /// k-means and scoring each candidate as
    ///
    /// `-silhouette(s) + lambda * byzantine_risk(s) * (s - shard_count_min)^2`
    ///
    /// where the risk term is the hypergeometric-tail probability that a
    /// shard of `ceil(N/s)` holds at least `ceil(size * byzantine_tolerance)`
    /// of the globally estimated malicious nodes. The minimizing `s` wins.
    RiskPenalizedKMeans {
        /// Smallest candidate shard count.
        shard_count_min: u16,
        /// Largest candidate shard count.
        shard_count_max: u16,
        /// Weight of the risk penalty.
        lambda: f64,
        /// Per-shard malicious fraction a shard must stay below.
        byzantine_tolerance: f64,
        /// Estimated global fraction of malicious validators.
        malicious_fraction: f64,
        /// Seed for k-means++ initialization; part of the policy so the
        /// partition stays a pure function of its inputs.
        seed: u64,
        /// Lloyd iteration cap.
        max_iterations: usize,
    },
    /// Hierarchical Ward clustering over all three feature axes into
    /// `clamp(ceil(N / max_nodes_per_shard), 1, N / min_nodes_per_shard)`
    /// groups, followed by a size-repair pass keeping every shard inside
    /// `[min_nodes_per_shard, max_nodes_per_shard]` whenever `N` allows.
    BoundedWard {
        /// Smallest acceptable shard size.
        min_nodes_per_shard: usize,
        /// Largest acceptable shard size.
        max_nodes_per_shard: usize,
    },
}

impl Default for PartitionPolicy {
    fn default() -> Self {
        Self::RiskPenalizedKMeans {
            shard_count_min: 3,
            shard_count_max: 20,
            lambda: 0.4,
            byzantine_tolerance: 0.3,
            malicious_fraction: 0.2,
            seed: 42,
            max_iterations: 100,
        }
    }
}

impl PartitionPolicy {
    /// Bounded-size Ward clustering.
    pub fn bounded_ward(min_nodes_per_shard: usize, max_nodes_per_shard: usize) -> Self {
        Self::BoundedWard {
            min_nodes_per_shard,
            max_nodes_per_shard,
        }
    }
}
