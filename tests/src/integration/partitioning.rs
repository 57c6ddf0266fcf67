//! Clustering and placement scenarios.

use super::{drive_round, node, validator};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sb_directory::Directory;
use sb_sharding::{byzantine_risk, partition, FeatureVector, PartitionPolicy};
use shared_types::{NodeId, NodeRecord};

fn random_population(count: usize, seed: u64) -> Vec<(NodeId, FeatureVector)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|id| {
            (
                NodeId(id as u64),
                FeatureVector([
                    rng.gen_range(1.0..10.0),
                    rng.gen_range(0.0..1.0),
                    rng.gen_range(1.0..16.0),
                ]),
            )
        })
        .collect()
}

#[test]
fn test_partition_validity_across_populations() {
    let policy = PartitionPolicy::bounded_ward(3, 10);
    for (count, seed) in [(9usize, 1u64), (16, 2), (32, 3), (50, 4)] {
        let nodes = random_population(count, seed);
        let plan = partition(&nodes, &policy).unwrap();

        // Every node in exactly one shard.
        assert_eq!(plan.total_members(), count);
        let mut seen: Vec<NodeId> = plan
            .iter()
            .flat_map(|(_, s)| s.members.iter().copied())
            .collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), count);

        // Every shard within the size bounds.
        for (shard, seed) in plan.iter() {
            assert!(
                (3..=10).contains(&seed.members.len()),
                "population {count}: shard {shard} has {} members",
                seed.members.len()
            );
        }
    }
}

#[test]
fn test_single_shard_fallback_below_bounds() {
    let nodes = random_population(2, 9);
    let plan = partition(&nodes, &PartitionPolicy::bounded_ward(3, 10)).unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.total_members(), 2);
}

#[test]
fn test_risk_penalty_shapes_the_search() {
    // With every validator honest the risk term vanishes; with a heavily
    // compromised population the penalty must not be smaller.
    let honest = byzantine_risk(60, 0, 12, 0.3);
    let compromised = byzantine_risk(60, 30, 12, 0.3);
    assert_eq!(honest, 0.0);
    assert!(compromised > 0.5);
}

#[test]
fn test_kmeans_search_through_directory_recompute() {
    let directory = Directory::new(PartitionPolicy::default());
    let records: Vec<NodeRecord> = random_population(60, 11)
        .into_iter()
        .map(|(id, feature)| {
            NodeRecord::validator(
                id,
                shared_types::ResourceProfile {
                    cpu_rating: feature.0[0],
                    ram_usage: feature.0[2],
                    reputation_score: feature.0[1],
                },
            )
        })
        .collect();
    directory.add_validators(records).unwrap();

    let overview = directory.shard_overview();
    assert!(
        overview.len() >= 2 && overview.len() <= 20,
        "{} shards",
        overview.len()
    );
    assert_eq!(overview.iter().map(|s| s.validators).sum::<usize>(), 60);
    for summary in &overview {
        assert!(summary.primary.is_some());
        assert!(summary.centroid.is_some());
    }
}

#[test]
fn test_join_atop_centroid_lands_in_that_shard() {
    let directory = Directory::new(PartitionPolicy::bounded_ward(2, 4));
    let mut records: Vec<NodeRecord> = (0..4).map(|id| validator(id, 1.0, 1.0)).collect();
    records.extend((4..8).map(|id| validator(id, 9.0, 15.0)));
    directory.add_validators(records).unwrap();

    let target = directory.shard_of(node(0)).unwrap();
    let centroid = directory
        .shard_overview()
        .into_iter()
        .find(|s| s.id == target)
        .and_then(|s| s.centroid)
        .unwrap();

    // A validator sitting exactly on the centroid joins that shard.
    let record = NodeRecord::validator(
        77u64,
        shared_types::ResourceProfile {
            cpu_rating: centroid.0[0],
            reputation_score: centroid.0[1],
            ram_usage: centroid.0[2],
        },
    );
    assert_eq!(directory.add_validator(record).unwrap(), target);
}

#[test]
fn test_consensus_works_after_reshard() {
    let directory = Directory::new(PartitionPolicy::bounded_ward(3, 6));
    directory
        .add_validators((0..8).map(|id| validator(id, 1.0 + id as f64, 2.0)).collect())
        .unwrap();
    directory.add_client(NodeRecord::client(100u64)).unwrap();
    directory.add_client(NodeRecord::client(101u64)).unwrap();

    // Explicit recluster with a different policy is a barrier, then a round
    // runs cleanly on the new layout.
    directory
        .recompute_shards(Some(PartitionPolicy::bounded_ward(4, 8)))
        .unwrap();

    let receiver_shard = directory.shard_of(node(101)).unwrap();
    let sender_shard = directory.shard_of(node(100)).unwrap();
    let digest = directory
        .submit_request(node(100), node(101), "post-reshard transfer")
        .unwrap();

    let target = if sender_shard == receiver_shard {
        sender_shard
    } else {
        receiver_shard
    };
    drive_round(&directory, target);
    assert!(directory.completed_requests(target).unwrap().contains(&digest));
}
