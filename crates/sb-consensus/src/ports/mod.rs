//! Ports for the consensus subsystem.

mod inbound;
mod outbound;

pub use inbound::ConsensusApi;
pub use outbound::{ShardLink, SystemTimeSource, TimeSource};
