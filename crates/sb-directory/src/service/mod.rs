//! Directory service - the top-level network façade.
//!
//! Owns the shard registry, the node → shard arena lookup, the replica
//! engines, and the loopback transport queue. Client code submits requests
//! and triggers membership changes here; everything else is message-driven.
//!
//! Locking discipline: the engines mutex is never acquired while a state
//! lock is held (engine calls take state locks internally), and
//! `recompute_shards` is a barrier — it rebuilds membership wholesale and
//! discards in-flight queue contents, so resharding never interleaves with a
//! consensus round.

use crate::adapters::{Envelope, NodeLink};
use crate::domain::{DirectoryError, DirectoryResult, Shard};
use crate::ports::DirectoryApi;
use crate::state::DirectoryState;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use sb_consensus::{ConsensusConfig, ReplicaEngine, SystemTimeSource, TimeSource};
use sb_sharding::{nearest_shard, partition, FeatureVector, PartitionPolicy};
use serde::{Deserialize, Serialize};
use shared_types::{
    ClientRequest, ConsensusMessage, MessageLogEntry, NodeId, NodeRecord, NodeRole, RequestDigest,
    RequestLogEntry, ShardId, ViewNumber,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Default bound on the loopback delivery queue.
const DEFAULT_QUEUE_CAPACITY: usize = 4096;

/// Read-only snapshot of one shard for inspection tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardSummary {
    /// Shard id.
    pub id: ShardId,
    /// Validator count.
    pub validators: usize,
    /// Client count.
    pub clients: usize,
    /// Current primary.
    pub primary: Option<NodeId>,
    /// Current view number.
    pub view: ViewNumber,
    /// Validator centroid in feature space.
    pub centroid: Option<FeatureVector>,
}

/// The top-level registry of shards and nodes.
pub struct Directory {
    state: Arc<DirectoryState>,
    engines: Mutex<HashMap<NodeId, ReplicaEngine>>,
    policy: RwLock<PartitionPolicy>,
    config: ConsensusConfig,
    outbox: mpsc::Sender<Envelope>,
    inbox: Mutex<mpsc::Receiver<Envelope>>,
}

impl Directory {
    /// Create a directory with the given partitioning policy and default
    /// consensus configuration.
    pub fn new(policy: PartitionPolicy) -> Self {
        Self::with_config(policy, ConsensusConfig::default(), DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a directory with explicit consensus configuration and queue
    /// capacity.
    pub fn with_config(
        policy: PartitionPolicy,
        config: ConsensusConfig,
        queue_capacity: usize,
    ) -> Self {
        let (outbox, inbox) = mpsc::channel(queue_capacity.max(1));
        Self {
            state: Arc::new(DirectoryState::new(Arc::new(SystemTimeSource))),
            engines: Mutex::new(HashMap::new()),
            policy: RwLock::new(policy),
            config,
            outbox,
            inbox: Mutex::new(inbox),
        }
    }

    /// Replace the time source (for testing).
    pub fn with_time_source(mut self, time: Arc<dyn TimeSource>) -> Self {
        self.state = Arc::new(DirectoryState::new(time));
        self
    }

    fn spawn_engine(&self, node: NodeId) -> ReplicaEngine {
        let link = NodeLink::new(node, self.state.clone(), self.outbox.clone());
        ReplicaEngine::new(node, self.config, Arc::new(link))
    }

    fn register(&self, record: &NodeRecord, expected: NodeRole) -> DirectoryResult<()> {
        if record.role != expected {
            return Err(DirectoryError::WrongRole {
                node: record.id,
                expected: match expected {
                    NodeRole::Validator => "validator",
                    NodeRole::Client => "client",
                },
            });
        }
        let mut profiles = self.state.profiles.write();
        if profiles.contains_key(&record.id) {
            return Err(DirectoryError::DuplicateNode(record.id));
        }
        profiles.insert(record.id, record.clone());
        Ok(())
    }

    /// Recompute a shard's centroid from its members' registered profiles.
    /// Caller holds the shards write lock.
    fn refresh_centroid(&self, shard: &mut Shard) {
        let profiles = self.state.profiles.read();
        let features: Vec<FeatureVector> = shard
            .validators()
            .iter()
            .filter_map(|validator| profiles.get(validator))
            .map(|record| FeatureVector::from_profile(&record.profile))
            .collect();
        shard.set_centroid(FeatureVector::centroid(&features));
    }

    /// Register one validator and place it incrementally: the first
    /// validator bootstraps shard 0 (and becomes its primary); later single
    /// joins land in the shard with the nearest centroid. Full recomputation
    /// is reserved for bulk joins and explicit recluster calls.
    pub fn add_validator(&self, record: NodeRecord) -> DirectoryResult<ShardId> {
        self.register(&record, NodeRole::Validator)?;
        let feature = FeatureVector::from_profile(&record.profile);

        let shard_id = {
            let mut shards = self.state.shards.write();
            let target = if shards.is_empty() {
                0
            } else {
                let centroids: Vec<(ShardId, FeatureVector)> = shards
                    .iter()
                    .filter_map(|(id, shard)| shard.centroid().map(|centroid| (*id, centroid)))
                    .collect();
                match nearest_shard(&feature, &centroids) {
                    Some(nearest) => nearest,
                    // Shards without centroids hold no validators yet.
                    None => shards.keys().next().copied().unwrap_or(0),
                }
            };
            let shard = shards.entry(target).or_insert_with(|| Shard::new(target));
            shard.add_validator(record.id);
            self.refresh_centroid(shard);
            target
        };

        self.state.assignments.write().insert(record.id, shard_id);
        self.engines.lock().insert(record.id, self.spawn_engine(record.id));
        info!(node = %record.id, shard = shard_id, "validator placed");
        Ok(shard_id)
    }

    /// Register a batch of validators and recompute the full partition.
    pub fn add_validators(&self, records: Vec<NodeRecord>) -> DirectoryResult<usize> {
        for record in &records {
            self.register(record, NodeRole::Validator)?;
        }
        self.recompute_shards(None)
    }

    /// Register a client. Clients always go to the shard currently holding
    /// the fewest clients - a load-balancing rule, not a clustering
    /// decision. With no shards yet, the client parks unassigned.
    pub fn add_client(&self, record: NodeRecord) -> DirectoryResult<Option<ShardId>> {
        self.register(&record, NodeRole::Client)?;

        let placed = {
            let mut shards = self.state.shards.write();
            let target = shards
                .values()
                .min_by_key(|shard| shard.clients().len())
                .map(Shard::id);
            if let Some(target) = target {
                if let Some(shard) = shards.get_mut(&target) {
                    shard.add_client(record.id);
                }
            }
            target
        };

        match placed {
            Some(shard) => {
                self.state.assignments.write().insert(record.id, shard);
                info!(node = %record.id, shard, "client placed");
                Ok(Some(shard))
            }
            None => {
                info!(node = %record.id, "no shards yet, client parked unassigned");
                self.state.unassigned_clients.write().push(record.id);
                Ok(None)
            }
        }
    }

    /// Rebuild every shard from a fresh partition of the registered
    /// validators. Barrier operation: in-flight queue contents and per-shard
    /// consensus state are discarded, views reset, and each shard's primary
    /// becomes its first assigned validator. Returns the shard count.
    pub fn recompute_shards(&self, policy: Option<PartitionPolicy>) -> DirectoryResult<usize> {
        if let Some(policy) = policy {
            *self.policy.write() = policy;
        }
        let policy = self.policy.read().clone();

        let mut validators: Vec<(NodeId, FeatureVector)> = {
            let profiles = self.state.profiles.read();
            profiles
                .values()
                .filter(|record| record.role == NodeRole::Validator)
                .map(|record| (record.id, FeatureVector::from_profile(&record.profile)))
                .collect()
        };
        validators.sort_by_key(|(id, _)| *id);

        let plan = partition(&validators, &policy)?;

        let mut clients: Vec<NodeId> = {
            let profiles = self.state.profiles.read();
            profiles
                .values()
                .filter(|record| record.role == NodeRole::Client)
                .map(|record| record.id)
                .collect()
        };
        clients.sort_unstable();

        // Resharding is a barrier: drop whatever the transport still holds.
        {
            let mut inbox = self.inbox.lock();
            let mut dropped = 0usize;
            while inbox.try_recv().is_ok() {
                dropped += 1;
            }
            if dropped > 0 {
                warn!(dropped, "reshard barrier discarded in-flight messages");
            }
        }

        let mut new_shards: BTreeMap<ShardId, Shard> = BTreeMap::new();
        let mut new_assignments: HashMap<NodeId, ShardId> = HashMap::new();
        for (&shard_id, seed) in plan.iter() {
            let mut shard = Shard::new(shard_id);
            for &member in &seed.members {
                shard.add_validator(member);
                new_assignments.insert(member, shard_id);
            }
            shard.set_centroid(Some(seed.centroid));
            new_shards.insert(shard_id, shard);
        }

        let mut parked = Vec::new();
        if new_shards.is_empty() {
            parked = clients;
        } else {
            for client in clients {
                let target = new_shards
                    .values()
                    .min_by_key(|shard| shard.clients().len())
                    .map(Shard::id);
                if let Some(target) = target {
                    if let Some(shard) = new_shards.get_mut(&target) {
                        shard.add_client(client);
                    }
                    new_assignments.insert(client, target);
                }
            }
        }

        let shard_count = new_shards.len();
        *self.state.shards.write() = new_shards;
        *self.state.assignments.write() = new_assignments;
        *self.state.unassigned_clients.write() = parked;

        {
            let mut engines = self.engines.lock();
            engines.clear();
            for (validator, _) in &validators {
                engines.insert(*validator, self.spawn_engine(*validator));
            }
        }

        info!(shard_count, validators = validators.len(), "shards recomputed");
        Ok(shard_count)
    }

    fn client_shard(&self, client: NodeId) -> DirectoryResult<ShardId> {
        match self.state.shard_of(client) {
            Some(shard) => Ok(shard),
            None => {
                warn!(client = %client, "request references an unresolvable client, dropping");
                Err(DirectoryError::UnknownClient(client))
            }
        }
    }

    /// Route a client request to exactly one shard's log: the shared shard
    /// when sender and receiver co-reside, otherwise the receiver's shard
    /// only (no sender-side entry, no cross-shard coordination). Returns the
    /// request digest.
    pub fn submit_request(
        &self,
        sender: NodeId,
        receiver: NodeId,
        payload: impl Into<String>,
    ) -> DirectoryResult<RequestDigest> {
        let sender_shard = self.client_shard(sender)?;
        let receiver_shard = self.client_shard(receiver)?;

        let request = ClientRequest::new(sender, receiver, payload);
        let digest = request.digest();
        let entry = RequestLogEntry {
            sender,
            receiver,
            request,
            logged_at: self.state.now(),
        };

        let target = if sender_shard == receiver_shard {
            debug!(shard = sender_shard, "sender and receiver co-reside");
            sender_shard
        } else {
            info!(
                from = sender_shard,
                to = receiver_shard,
                "cross-shard request routed to receiver shard"
            );
            receiver_shard
        };

        let mut shards = self.state.shards.write();
        shards
            .get_mut(&target)
            .ok_or(DirectoryError::UnknownShard(target))?
            .log_request(entry);
        Ok(digest)
    }

    /// Refuse-and-rotate guard: if the shard's current primary is flagged
    /// Byzantine, trigger a view change and report the refusal.
    fn guard_primary(&self, shard_id: ShardId) -> DirectoryResult<()> {
        let mut shards = self.state.shards.write();
        let shard = shards
            .get_mut(&shard_id)
            .ok_or(DirectoryError::UnknownShard(shard_id))?;
        if let Some(primary) = shard.primary() {
            if shard.equivocation.is_flagged(primary) {
                warn!(shard = shard_id, primary = %primary, "flagged primary refused, rotating view");
                shard.change_view();
                return Err(DirectoryError::PrimaryFlagged {
                    shard: shard_id,
                    flagged: primary,
                    successor: shard.primary(),
                });
            }
        }
        Ok(())
    }

    /// Primary-only read of the shard's pending request log.
    pub fn check_requests(&self, node: NodeId) -> DirectoryResult<Vec<RequestLogEntry>> {
        let shard_id = self
            .state
            .shard_of(node)
            .ok_or(DirectoryError::UnknownNode(node))?;
        self.guard_primary(shard_id)?;

        let shards = self.state.shards.read();
        let shard = shards
            .get(&shard_id)
            .ok_or(DirectoryError::UnknownShard(shard_id))?;
        if shard.primary() != Some(node) {
            warn!(node = %node, shard = shard_id, "only the primary is authorized to check requests");
            return Err(DirectoryError::NotPrimary {
                node,
                shard: shard_id,
            });
        }
        Ok(shard.requests().to_vec())
    }

    /// Drive the named primary's engine over one logged request: wraps it in
    /// a PRE-PREPARE and fans it out to the replicas.
    pub fn handle_request(
        &self,
        node: NodeId,
        entry: &RequestLogEntry,
    ) -> DirectoryResult<RequestDigest> {
        let shard_id = self
            .state
            .shard_of(node)
            .ok_or(DirectoryError::UnknownNode(node))?;
        self.guard_primary(shard_id)?;

        let mut engines = self.engines.lock();
        let engine = engines
            .get_mut(&node)
            .ok_or(DirectoryError::UnknownNode(node))?;
        Ok(engine.propose(entry.request.clone())?)
    }

    /// Transport entry point: hand an inbound message to the addressed
    /// shard. PRE-PREPARE/PREPARE/COMMIT fan out to the shard's validators
    /// (minus the sender); CHANGE-VIEW rotates the primary; REPLY is logged
    /// for observability only.
    pub fn deliver(&self, shard_id: ShardId, message: ConsensusMessage) -> DirectoryResult<()> {
        match &message {
            ConsensusMessage::ChangeView { sender, .. } => {
                {
                    let mut shards = self.state.shards.write();
                    let shard = shards
                        .get_mut(&shard_id)
                        .ok_or(DirectoryError::UnknownShard(shard_id))?;
                    debug!(shard = shard_id, sender = %sender, "CHANGE-VIEW delivered");
                    shard.change_view();
                }
                self.state.log_message(shard_id, message);
                Ok(())
            }
            ConsensusMessage::Reply { .. } => {
                self.state.log_message(shard_id, message);
                Ok(())
            }
            _ => {
                let members = {
                    let shards = self.state.shards.read();
                    shards
                        .get(&shard_id)
                        .ok_or(DirectoryError::UnknownShard(shard_id))?
                        .validators()
                        .to_vec()
                };
                let sender = message.sender();
                self.state.log_message(shard_id, message.clone());
                for member in members {
                    if member != sender {
                        self.enqueue(member, message.clone());
                    }
                }
                Ok(())
            }
        }
    }

    /// Targeted delivery to a single validator's engine (a per-node
    /// transport inbox).
    pub fn deliver_to(&self, node: NodeId, message: ConsensusMessage) -> DirectoryResult<()> {
        let shard_id = self
            .state
            .shard_of(node)
            .ok_or(DirectoryError::UnknownNode(node))?;
        self.state.log_message(shard_id, message.clone());
        self.enqueue(node, message);
        Ok(())
    }

    fn enqueue(&self, target: NodeId, message: ConsensusMessage) {
        if self.outbox.try_send((target, message)).is_err() {
            warn!(recipient = %target, "loopback queue full, dropping message");
        }
    }

    /// The prepare-phase fan-out point: every replica (non-primary
    /// validator) of the shard drains its queued PRE-PREPAREs into PREPARE
    /// broadcasts.
    pub fn process_prepares(&self, shard_id: ShardId) -> DirectoryResult<Vec<RequestDigest>> {
        let replicas = {
            let shards = self.state.shards.read();
            shards
                .get(&shard_id)
                .ok_or(DirectoryError::UnknownShard(shard_id))?
                .replicas()
        };

        let mut engines = self.engines.lock();
        let mut digests = Vec::new();
        for replica in replicas {
            if let Some(engine) = engines.get_mut(&replica) {
                digests.extend(engine.process_prepare());
            }
        }
        Ok(digests)
    }

    /// Drain the loopback queue, dispatching each envelope to the owning
    /// engine. Rejected messages (integrity, authorization, Byzantine) are
    /// absorbed here with a log line, exactly once. Returns the number of
    /// messages processed.
    pub fn run_until_idle(&self) -> usize {
        let mut processed = 0usize;
        loop {
            let envelope = self.inbox.lock().try_recv();
            let Ok((target, message)) = envelope else {
                break;
            };
            processed += 1;

            let mut engines = self.engines.lock();
            match engines.get_mut(&target) {
                Some(engine) => {
                    if let Err(error) = engine.receive(message) {
                        debug!(recipient = %target, %error, "message rejected");
                    }
                }
                None => warn!(recipient = %target, "message for unknown engine dropped"),
            }
        }
        processed
    }

    /// Flag a validator as Byzantine in its shard's monitor (detection hook
    /// for tooling and tests).
    pub fn flag_byzantine(&self, node: NodeId) -> DirectoryResult<()> {
        let shard_id = self
            .state
            .shard_of(node)
            .ok_or(DirectoryError::UnknownNode(node))?;
        let mut shards = self.state.shards.write();
        shards
            .get_mut(&shard_id)
            .ok_or(DirectoryError::UnknownShard(shard_id))?
            .equivocation
            .flag(node);
        Ok(())
    }

    /// Rotate a shard's primary.
    pub fn change_view(&self, shard_id: ShardId) -> DirectoryResult<ViewNumber> {
        let mut shards = self.state.shards.write();
        Ok(shards
            .get_mut(&shard_id)
            .ok_or(DirectoryError::UnknownShard(shard_id))?
            .change_view())
    }

    // === Observability surface (read-only) ===

    /// A shard's pending request log.
    pub fn requests(&self, shard_id: ShardId) -> DirectoryResult<Vec<RequestLogEntry>> {
        let shards = self.state.shards.read();
        Ok(shards
            .get(&shard_id)
            .ok_or(DirectoryError::UnknownShard(shard_id))?
            .requests()
            .to_vec())
    }

    /// A shard's finalized digests.
    pub fn completed_requests(&self, shard_id: ShardId) -> DirectoryResult<HashSet<RequestDigest>> {
        let shards = self.state.shards.read();
        Ok(shards
            .get(&shard_id)
            .ok_or(DirectoryError::UnknownShard(shard_id))?
            .finalization
            .finalized()
            .clone())
    }

    /// The global message log.
    pub fn message_log(&self) -> Vec<MessageLogEntry> {
        self.state.message_log.read().clone()
    }

    /// The shard a node currently belongs to.
    pub fn shard_of(&self, node: NodeId) -> Option<ShardId> {
        self.state.shard_of(node)
    }

    /// Current primary of a shard.
    pub fn primary_of(&self, shard_id: ShardId) -> DirectoryResult<Option<NodeId>> {
        let shards = self.state.shards.read();
        Ok(shards
            .get(&shard_id)
            .ok_or(DirectoryError::UnknownShard(shard_id))?
            .primary())
    }

    /// Clients parked before any shard existed.
    pub fn unassigned_clients(&self) -> Vec<NodeId> {
        self.state.unassigned_clients.read().clone()
    }

    /// Snapshot of every shard.
    pub fn shard_overview(&self) -> Vec<ShardSummary> {
        self.state
            .shards
            .read()
            .values()
            .map(|shard| ShardSummary {
                id: shard.id(),
                validators: shard.validators().len(),
                clients: shard.clients().len(),
                primary: shard.primary(),
                view: shard.view(),
                centroid: shard.centroid(),
            })
            .collect()
    }
}

#[async_trait]
impl DirectoryApi for Directory {
    async fn submit_request(
        &self,
        sender: NodeId,
        receiver: NodeId,
        payload: String,
    ) -> DirectoryResult<RequestDigest> {
        Directory::submit_request(self, sender, receiver, payload)
    }

    async fn deliver(&self, shard: ShardId, message: ConsensusMessage) -> DirectoryResult<()> {
        Directory::deliver(self, shard, message)
    }

    async fn add_validator(&self, record: NodeRecord) -> DirectoryResult<ShardId> {
        Directory::add_validator(self, record)
    }

    async fn add_client(&self, record: NodeRecord) -> DirectoryResult<Option<ShardId>> {
        Directory::add_client(self, record)
    }

    async fn recompute_shards(&self, policy: Option<PartitionPolicy>) -> DirectoryResult<usize> {
        Directory::recompute_shards(self, policy)
    }

    fn requests(&self, shard: ShardId) -> DirectoryResult<Vec<RequestLogEntry>> {
        Directory::requests(self, shard)
    }

    fn completed_requests(&self, shard: ShardId) -> DirectoryResult<HashSet<RequestDigest>> {
        Directory::completed_requests(self, shard)
    }

    fn message_log(&self) -> Vec<MessageLogEntry> {
        Directory::message_log(self)
    }
}
