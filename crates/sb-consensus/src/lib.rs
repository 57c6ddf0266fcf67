//! # sb-consensus
//!
//! Per-shard consensus subsystem for ShardBFT.
//!
//! ## Architecture
//!
//! Each validator runs a [`ReplicaEngine`] that progresses a request through
//! the three-phase protocol — PRE-PREPARE, PREPARE, COMMIT — keyed purely by
//! the request's content digest. Quorum is `2f+1` with
//! `f = floor((n-1)/3)` over the shard's validator count.
//!
//! Finalization is a two-level aggregation: a node reports a *commit vote*
//! to its shard once its own commit set reaches `2f+1`, and the shard
//! finalizes once `2f+1` distinct nodes have each reported one. No single
//! node finalizes on its own.
//!
//! ```text
//! client ──request──→ primary ──PRE-PREPARE──→ replicas
//!                                  │ process_prepare()
//!                                  ↓
//!                              PREPARE ⇄ all validators
//!                                  ↓
//!                               COMMIT ⇄ all validators
//!                                  ↓ 2f+1 commits at a node
//!                        shard-level commit vote ──2f+1 nodes──→ FINALIZED
//! ```
//!
//! ## Known deviation
//!
//! In the default [`ConsensusMode::EagerCommit`], a replica broadcasts
//! COMMIT on *every* accepted PREPARE rather than gating on the prepare
//! quorum; the quorum only marks readiness. Canonical PBFT gating is
//! available as [`ConsensusMode::QuorumGated`].
//!
//! ## Security
//!
//! - Digest recomputation on every PRE-PREPARE receipt (sole integrity check)
//! - Equivocation detection over prepare votes, with permanent sender flags
//! - No sequence numbers: replay of an old PRE-PREPARE is not detected

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export main types
pub use adapters::MemoryShardLink;
pub use domain::{
    max_faulty, quorum, ConsensusConfig, ConsensusError, ConsensusMode, ConsensusResult,
    EquivocationMonitor, Finalization, FinalizationTracker, Screening,
};
pub use ports::{ConsensusApi, ShardLink, SystemTimeSource, TimeSource};
pub use service::ReplicaEngine;
