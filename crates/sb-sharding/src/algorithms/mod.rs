//! Partitioning algorithms.

mod kmeans;
mod placement;
mod risk;
mod ward;

pub use kmeans::{kmeans, silhouette};
pub use placement::nearest_shard;
pub use risk::byzantine_risk;
pub use ward::{enforce_size_bounds, ward};

use crate::domain::{
    FeatureVector, PartitionError, PartitionPlan, PartitionPolicy, PartitionResult, ShardSeed,
};
use rayon::prelude::*;
use shared_types::{NodeId, ShardId};
use tracing::{debug, info, warn};

/// Partition a validator set under a policy.
///
/// Pure: same `(nodes, policy)` always yields the same plan. Zero nodes is a
/// diagnostic no-op (empty plan), and populations too small for the policy's
/// lower bound degrade to a single shard rather than failing.
pub fn partition(
    nodes: &[(NodeId, FeatureVector)],
    policy: &PartitionPolicy,
) -> PartitionResult<PartitionPlan> {
    validate(policy)?;

    if nodes.is_empty() {
        warn!("no validator nodes available, nothing to partition");
        return Ok(PartitionPlan::default());
    }

    match policy {
        PartitionPolicy::RiskPenalizedKMeans {
            shard_count_min,
            shard_count_max,
            lambda,
            byzantine_tolerance,
            malicious_fraction,
            seed,
            max_iterations,
        } => {
            let population = nodes.len();
            let lower = *shard_count_min as usize;
            let upper = (*shard_count_max as usize).min(population);
            if population < lower || lower > upper {
                warn!(
                    population,
                    shard_count_min = lower,
                    "fewer validators than the shard-count bound, using a single shard"
                );
                return Ok(single_shard(nodes));
            }

            let points: Vec<[f64; 2]> = nodes.iter().map(|(_, f)| f.cpu_ram()).collect();
            let malicious = (malicious_fraction * population as f64).round() as usize;

            // Independent candidates; searched in parallel.
            let scored: Vec<(usize, f64, Vec<usize>)> = (lower..=upper)
                .into_par_iter()
                .map(|candidate| {
                    let labels = kmeans(&points, candidate, *seed, *max_iterations);
                    let quality = silhouette(&points, &labels, candidate);
                    let shard_size = population.div_ceil(candidate);
                    let risk =
                        byzantine_risk(population, malicious, shard_size, *byzantine_tolerance);
                    let spread = (candidate - lower) as f64;
                    let score = -quality + lambda * risk * spread * spread;
                    debug!(candidate, quality, risk, score, "scored shard count");
                    (candidate, score, labels)
                })
                .collect();

            let (chosen, score, labels) = scored
                .into_iter()
                .min_by(|(sa, a, _), (sb, b, _)| a.total_cmp(b).then(sa.cmp(sb)))
                .ok_or_else(|| PartitionError::InvalidPolicy("empty candidate range".into()))?;
            info!(shard_count = chosen, score, "risk-penalized search settled");
            Ok(plan_from_labels(nodes, &labels))
        }

        PartitionPolicy::BoundedWard {
            min_nodes_per_shard,
            max_nodes_per_shard,
        } => {
            let population = nodes.len();
            if population < *min_nodes_per_shard {
                warn!(
                    population,
                    min_nodes_per_shard = *min_nodes_per_shard,
                    "not enough nodes to satisfy shard bounds, using a single shard"
                );
                return Ok(single_shard(nodes));
            }

            let groups = population
                .div_ceil(*max_nodes_per_shard)
                .clamp(1, population / *min_nodes_per_shard);
            let points: Vec<[f64; 3]> = nodes.iter().map(|(_, f)| f.0).collect();
            let mut labels = ward(&points, groups);
            enforce_size_bounds(&points, &mut labels, groups, *min_nodes_per_shard, *max_nodes_per_shard);
            info!(population, groups, "bounded Ward clustering settled");
            Ok(plan_from_labels(nodes, &labels))
        }
    }
}

fn validate(policy: &PartitionPolicy) -> PartitionResult<()> {
    match policy {
        PartitionPolicy::RiskPenalizedKMeans {
            shard_count_min,
            shard_count_max,
            lambda,
            byzantine_tolerance,
            malicious_fraction,
            ..
        } => {
            if shard_count_min > shard_count_max || *shard_count_min == 0 {
                return Err(PartitionError::InvalidPolicy(format!(
                    "shard count bounds [{shard_count_min}, {shard_count_max}]"
                )));
            }
            if *lambda < 0.0 {
                return Err(PartitionError::InvalidPolicy("negative lambda".into()));
            }
            if !(0.0..=1.0).contains(byzantine_tolerance)
                || !(0.0..=1.0).contains(malicious_fraction)
            {
                return Err(PartitionError::InvalidPolicy(
                    "fractions must lie in [0, 1]".into(),
                ));
            }
            Ok(())
        }
        PartitionPolicy::BoundedWard {
            min_nodes_per_shard,
            max_nodes_per_shard,
        } => {
            if *min_nodes_per_shard == 0 || min_nodes_per_shard > max_nodes_per_shard {
                return Err(PartitionError::InvalidPolicy(format!(
                    "shard size bounds [{min_nodes_per_shard}, {max_nodes_per_shard}]"
                )));
            }
            Ok(())
        }
    }
}

fn single_shard(nodes: &[(NodeId, FeatureVector)]) -> PartitionPlan {
    let features: Vec<FeatureVector> = nodes.iter().map(|(_, f)| *f).collect();
    let mut plan = PartitionPlan::default();
    plan.insert(
        0,
        ShardSeed {
            members: nodes.iter().map(|(id, _)| *id).collect(),
            centroid: FeatureVector::centroid(&features).unwrap_or_default(),
        },
    );
    plan
}

fn plan_from_labels(nodes: &[(NodeId, FeatureVector)], labels: &[usize]) -> PartitionPlan {
    let mut plan = PartitionPlan::default();
    let groups = labels.iter().copied().max().map_or(0, |max| max + 1);
    for group in 0..groups {
        let members: Vec<NodeId> = nodes
            .iter()
            .zip(labels.iter())
            .filter(|(_, &label)| label == group)
            .map(|((id, _), _)| *id)
            .collect();
        if members.is_empty() {
            continue;
        }
        let features: Vec<FeatureVector> = nodes
            .iter()
            .zip(labels.iter())
            .filter(|(_, &label)| label == group)
            .map(|((_, f), _)| *f)
            .collect();
        plan.insert(
            group as ShardId,
            ShardSeed {
                members,
                centroid: FeatureVector::centroid(&features).unwrap_or_default(),
            },
        );
    }
    plan
}
