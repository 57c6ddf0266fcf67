//! End-to-end three-phase consensus rounds.

use super::{drive_round, node, single_shard_network};
use crate::init_tracing;
use sb_consensus::{quorum, ConsensusConfig};
use sb_directory::{Directory, DirectoryApi};
use sb_sharding::PartitionPolicy;
use shared_types::{ClientRequest, NodeRecord};

#[test]
fn test_quorum_thresholds_match_shard_sizes() {
    let four = single_shard_network(4);
    let ten = single_shard_network(10);
    let overview_four = four.shard_overview();
    let overview_ten = ten.shard_overview();
    assert_eq!(quorum(overview_four[0].validators), 3);
    assert_eq!(quorum(overview_ten[0].validators), 7);
}

#[test]
fn test_one_primary_three_replicas_finalizes_exactly_one_digest() {
    init_tracing();
    let directory = single_shard_network(4);
    directory.add_client(NodeRecord::client(100u64)).unwrap();
    directory.add_client(NodeRecord::client(101u64)).unwrap();

    let digest = directory
        .submit_request(node(100), node(101), "Ahmad has sent 5 supercoins to Naseem.")
        .unwrap();
    assert_eq!(
        digest,
        ClientRequest::new(node(100), node(101), "Ahmad has sent 5 supercoins to Naseem.").digest()
    );

    drive_round(&directory, 0);

    let completed = directory.completed_requests(0).unwrap();
    assert_eq!(completed.len(), 1, "exactly one digest finalized");
    assert!(completed.contains(&digest));
}

#[test]
fn test_repeat_finalization_is_a_noop() {
    let directory = single_shard_network(4);
    directory.add_client(NodeRecord::client(100u64)).unwrap();
    directory.add_client(NodeRecord::client(101u64)).unwrap();
    let digest = directory.submit_request(node(100), node(101), "pay").unwrap();
    drive_round(&directory, 0);
    assert_eq!(directory.completed_requests(0).unwrap().len(), 1);

    // Re-deliver a full commit wave for the same digest.
    for sender in 0..4 {
        directory
            .deliver(
                0,
                shared_types::ConsensusMessage::Commit {
                    digest,
                    sender: node(sender),
                },
            )
            .unwrap();
    }
    directory.run_until_idle();
    assert_eq!(directory.completed_requests(0).unwrap().len(), 1);
}

#[test]
fn test_eager_commit_broadcast_below_quorum() {
    let directory = single_shard_network(4);
    directory.add_client(NodeRecord::client(100u64)).unwrap();
    directory.add_client(NodeRecord::client(101u64)).unwrap();
    let digest = directory.submit_request(node(100), node(101), "pay").unwrap();

    // One single PREPARE delivered to one replica: below the quorum of 3,
    // yet the replica already answers with a COMMIT broadcast.
    directory
        .deliver_to(
            node(1),
            shared_types::ConsensusMessage::Prepare {
                digest,
                sender: node(2),
            },
        )
        .unwrap();
    directory.run_until_idle();

    let commits = directory
        .message_log()
        .iter()
        .filter(|entry| entry.message.kind() == "COMMIT")
        .count();
    assert_eq!(commits, 1, "non-gated commit broadcast");
}

#[test]
fn test_strict_mode_round_still_finalizes() {
    let directory = Directory::with_config(
        PartitionPolicy::bounded_ward(3, 10),
        ConsensusConfig::strict(),
        4096,
    );
    for id in 0..4 {
        directory.add_validator(super::validator(id, 2.0, 4.0)).unwrap();
    }
    directory.add_client(NodeRecord::client(100u64)).unwrap();
    directory.add_client(NodeRecord::client(101u64)).unwrap();

    let digest = directory.submit_request(node(100), node(101), "pay").unwrap();
    drive_round(&directory, 0);

    assert!(directory.completed_requests(0).unwrap().contains(&digest));

    // Strict gating: each of the four validators committed exactly once.
    let commits = directory
        .message_log()
        .iter()
        .filter(|entry| entry.message.kind() == "COMMIT")
        .count();
    assert_eq!(commits, 4);
}

#[tokio::test]
async fn test_transport_facing_api_drives_a_round() {
    let directory = single_shard_network(4);
    let api: &dyn DirectoryApi = &directory;

    api.add_client(NodeRecord::client(100u64)).await.unwrap();
    api.add_client(NodeRecord::client(101u64)).await.unwrap();
    let digest = api
        .submit_request(node(100), node(101), "via the inbound port".to_string())
        .await
        .unwrap();

    drive_round(&directory, 0);
    assert!(api.completed_requests(0).unwrap().contains(&digest));
    assert!(!api.message_log().is_empty());
}

#[test]
fn test_two_requests_finalize_independently() {
    let directory = single_shard_network(4);
    directory.add_client(NodeRecord::client(100u64)).unwrap();
    directory.add_client(NodeRecord::client(101u64)).unwrap();

    let first = directory.submit_request(node(100), node(101), "first").unwrap();
    let second = directory.submit_request(node(101), node(100), "second").unwrap();
    assert_ne!(first, second);

    drive_round(&directory, 0);

    let completed = directory.completed_requests(0).unwrap();
    assert_eq!(completed.len(), 2);
    assert!(completed.contains(&first) && completed.contains(&second));
}
