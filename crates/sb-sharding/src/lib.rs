//! # sb-sharding
//!
//! Shard-partitioning subsystem for ShardBFT.
//!
//! ## Purpose
//!
//! Decide which validators co-locate in a shard:
//! - Risk-penalized k-means search over candidate shard counts, trading
//!   cluster quality against the hypergeometric Byzantine-concentration risk
//! - Bounded-size Ward (agglomerative) clustering over the full resource
//!   feature space
//! - Incremental nearest-centroid placement for single joining validators
//!
//! ## Module Structure
//!
//! ```text
//! sb-sharding/
//! ├── domain/          # FeatureVector, PartitionPolicy, PartitionPlan
//! └── algorithms/      # k-means, Ward linkage, risk model, placement
//! ```
//!
//! Both policies are callable through one pure entry point,
//! [`partition`]: same nodes + same policy = same plan.

#![warn(clippy::all)]

pub mod algorithms;
pub mod domain;

// Re-exports
pub use algorithms::{
    byzantine_risk, kmeans, nearest_shard, partition, silhouette, ward,
};
pub use domain::{
    FeatureVector, PartitionError, PartitionPlan, PartitionPolicy, PartitionResult, ShardSeed,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
