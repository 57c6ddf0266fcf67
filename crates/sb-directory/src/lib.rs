//! # sb-directory
//!
//! Shard directory and network façade for ShardBFT.
//!
//! ## Purpose
//!
//! The [`Directory`] is the top-level registry client code talks to:
//! - owns every [`Shard`] by id and the node → shard arena lookup
//! - places joining validators (nearest centroid) and clients
//!   (least-populated shard), parks clients until shards exist
//! - rebuilds the whole partition as a barrier operation
//! - routes a client request to exactly one shard's log — the receiver's
//!   shard when sender and receiver differ (routing only, never
//!   cross-shard atomic commit)
//! - pumps the bounded loopback transport that drives the per-validator
//!   consensus engines
//!
//! ## Module Structure
//!
//! ```text
//! sb-directory/
//! ├── domain/          # Shard entity, error taxonomy
//! ├── ports/           # DirectoryApi inbound trait
//! ├── service/         # Directory façade
//! └── adapters/        # loopback ShardLink transport
//! ```

pub mod domain;
pub mod ports;
pub mod service;

mod adapters;
mod state;

// Re-exports
pub use domain::{DirectoryError, DirectoryResult, Shard};
pub use ports::DirectoryApi;
pub use service::{Directory, ShardSummary};
