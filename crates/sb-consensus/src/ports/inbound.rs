//! Driving port (inbound API).
//!
//! The transport-agnostic contract a delivery adapter drives a replica
//! through. The loopback simulation transport and any external
//! process-per-node transport both speak exactly this interface.

use crate::domain::ConsensusResult;
use async_trait::async_trait;
use shared_types::{ClientRequest, ConsensusMessage, RequestDigest};

/// Consensus API — inbound port.
#[async_trait]
pub trait ConsensusApi: Send {
    /// Primary-only: wrap a client request in a PRE-PREPARE and fan it out.
    /// Returns the request digest. The primary does not self-process its own
    /// proposal.
    async fn handle_request(&mut self, request: ClientRequest) -> ConsensusResult<RequestDigest>;

    /// Hand an inbound protocol message to this replica.
    async fn deliver(&mut self, message: ConsensusMessage) -> ConsensusResult<()>;

    /// Drain queued PRE-PREPAREs into PREPARE broadcasts. This single call is
    /// the prepare-phase fan-out point for all currently queued digests.
    async fn process_prepare(&mut self) -> ConsensusResult<Vec<RequestDigest>>;
}
