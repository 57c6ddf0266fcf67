//! # ShardBFT Test Suite
//!
//! Unified test crate for cross-subsystem scenarios:
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── consensus_round.rs   # end-to-end three-phase rounds
//!     ├── cross_shard.rs       # request routing between shards
//!     ├── byzantine.rs         # equivocation, quarantine, view change
//!     └── partitioning.rs      # clustering and placement scenarios
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sb-tests
//! cargo test -p sb-tests integration::byzantine
//! ```

#[cfg(test)]
mod integration;

#[cfg(test)]
pub(crate) fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
