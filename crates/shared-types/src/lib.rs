//! # Shared Types Crate
//!
//! This crate contains the domain entities, identifiers, and consensus
//! message types shared across every ShardBFT subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Digest Anchor**: A request's content digest is computed once, from its
//!   canonical encoding, and is the identity every consensus phase keys on.
//! - **No Back-Pointers**: Nodes never hold owning references to shards; the
//!   directory resolves `NodeId -> ShardId` through its own lookup.

pub mod entities;
pub mod ids;
pub mod messages;

pub use entities::*;
pub use ids::*;
pub use messages::*;
