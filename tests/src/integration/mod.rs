//! Cross-subsystem integration scenarios.

mod byzantine;
mod consensus_round;
mod cross_shard;
mod partitioning;

use sb_directory::Directory;
use sb_sharding::PartitionPolicy;
use shared_types::{NodeId, NodeRecord, ResourceProfile, ShardId};

/// A validator record with explicit resource features.
pub(crate) fn validator(id: u64, cpu: f64, ram: f64) -> NodeRecord {
    NodeRecord::validator(
        id,
        ResourceProfile {
            cpu_rating: cpu,
            ram_usage: ram,
            reputation_score: 0.9,
        },
    )
}

/// One shard of `count` validators (ids `0..count`) under a bounded-Ward
/// policy wide enough to keep them together.
pub(crate) fn single_shard_network(count: u64) -> Directory {
    let directory = Directory::new(PartitionPolicy::bounded_ward(3, count.max(4) as usize));
    for id in 0..count {
        directory
            .add_validator(validator(id, 2.0 + 0.01 * id as f64, 4.0))
            .unwrap();
    }
    directory
}

/// Drive one full consensus round over every pending request of a shard.
pub(crate) fn drive_round(directory: &Directory, shard: ShardId) {
    let primary = directory.primary_of(shard).unwrap().expect("shard has a primary");
    let entries = directory.check_requests(primary).unwrap();
    for entry in &entries {
        directory.handle_request(primary, entry).unwrap();
    }
    directory.run_until_idle();
    directory.process_prepares(shard).unwrap();
    directory.run_until_idle();
}

/// Shorthand for ids in assertions.
pub(crate) fn node(id: u64) -> NodeId {
    NodeId(id)
}
