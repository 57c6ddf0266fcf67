//! Cross-shard request routing.
//!
//! A request between clients of different shards lands in the receiver's
//! shard log only — routing, not atomic commit: the receiver shard's primary
//! picks it up exactly as a local request.

use super::{drive_round, node, validator};
use sb_directory::Directory;
use sb_sharding::PartitionPolicy;
use shared_types::NodeRecord;

/// Two shards of four validators each, one client homed in each shard.
fn two_shard_network() -> (Directory, u16, u16) {
    let directory = Directory::new(PartitionPolicy::bounded_ward(3, 4));
    let mut records: Vec<NodeRecord> = (0..4).map(|id| validator(id, 1.0, 1.0)).collect();
    records.extend((4..8).map(|id| validator(id, 9.0, 15.0)));
    directory.add_validators(records).unwrap();
    assert_eq!(directory.shard_overview().len(), 2);

    directory.add_client(NodeRecord::client(100u64)).unwrap();
    directory.add_client(NodeRecord::client(101u64)).unwrap();
    let sender_shard = directory.shard_of(node(100)).unwrap();
    let receiver_shard = directory.shard_of(node(101)).unwrap();
    assert_ne!(sender_shard, receiver_shard, "clients balanced across shards");
    (directory, sender_shard, receiver_shard)
}

#[test]
fn test_request_logged_in_receiver_shard_only() {
    let (directory, sender_shard, receiver_shard) = two_shard_network();

    directory
        .submit_request(node(100), node(101), "cross-shard transfer")
        .unwrap();

    assert!(
        directory.requests(sender_shard).unwrap().is_empty(),
        "no entry in the sender's shard"
    );
    let receiver_log = directory.requests(receiver_shard).unwrap();
    assert_eq!(receiver_log.len(), 1);
    assert_eq!(receiver_log[0].sender, node(100));
    assert_eq!(receiver_log[0].receiver, node(101));
}

#[test]
fn test_same_shard_request_stays_local() {
    let directory = Directory::new(PartitionPolicy::bounded_ward(3, 4));
    directory
        .add_validators((0..4).map(|id| validator(id, 1.0, 1.0)).collect())
        .unwrap();
    directory.add_client(NodeRecord::client(100u64)).unwrap();
    directory.add_client(NodeRecord::client(101u64)).unwrap();

    directory.submit_request(node(100), node(101), "local").unwrap();
    assert_eq!(directory.requests(0).unwrap().len(), 1);
}

#[test]
fn test_receiver_shard_finalizes_routed_request() {
    let (directory, sender_shard, receiver_shard) = two_shard_network();

    let digest = directory
        .submit_request(node(100), node(101), "cross-shard transfer")
        .unwrap();
    drive_round(&directory, receiver_shard);

    assert!(directory
        .completed_requests(receiver_shard)
        .unwrap()
        .contains(&digest));
    // The sender's shard never saw the request, let alone finalized it.
    assert!(directory.completed_requests(sender_shard).unwrap().is_empty());
}

#[test]
fn test_unresolvable_receiver_drops_request_everywhere() {
    let (directory, sender_shard, receiver_shard) = two_shard_network();

    assert!(directory
        .submit_request(node(100), node(999), "to nowhere")
        .is_err());
    assert!(directory.requests(sender_shard).unwrap().is_empty());
    assert!(directory.requests(receiver_shard).unwrap().is_empty());
}
