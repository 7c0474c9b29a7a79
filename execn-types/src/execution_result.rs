// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{
    identifier::Identifier,
    state::{RegisterDelta, RegisterProofs, StateCommitment},
};
use serde::{Deserialize, Serialize};

/// An opaque event emitted by a transaction's execution.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: String,
    pub payload: Vec<u8>,
}

/// Per-transaction execution outcome, opaque beyond success/failure.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub transaction_id: Identifier,
    pub error_message: Option<String>,
    pub computation_used: u64,
}

/// A service event surfaced by the VM (e.g. an epoch transition trigger).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ServiceEvent {
    pub event_type: String,
    pub payload: Vec<u8>,
}

/// One chunk's worth of computation: the register delta to commit, the
/// SPoCK secret derived from the post-chunk state snapshot, and the events it
/// emitted.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub delta: RegisterDelta,
    pub spock_secret: Vec<u8>,
    pub events: Vec<Event>,
}

/// The computation manager's output for one block: one [`StateSnapshot`] per
/// chunk, plus the per-transaction results and service events for the block
/// as a whole.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ComputationResult {
    pub state_snapshots: Vec<StateSnapshot>,
    pub transaction_results: Vec<TransactionResult>,
    pub service_events: Vec<ServiceEvent>,
}

/// The unit of verifiable work within a block: one per state-transition
/// snapshot. `index` and `collection_index` are set at construction and are
/// invariant thereafter.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub block_id: Identifier,
    pub collection_index: usize,
    pub index: usize,
    pub start_state: StateCommitment,
    pub event_collection: Identifier,
    pub total_computation_used: u64,
    pub number_of_transactions: usize,
}

impl Chunk {
    pub fn id(&self) -> anyhow::Result<Identifier> {
        Identifier::hash_of("execn.chunk.v1", self)
    }
}

/// A chunk plus the register proofs a verifier needs to replay it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChunkDataPack {
    pub chunk_id: Identifier,
    pub start_state: StateCommitment,
    pub proofs: RegisterProofs,
    pub collection_id: Identifier,
}

/// A signed, chunk-decomposed commitment to a block's execution. Forms a hash
/// chain with its parent's result via `previous_result_id`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub previous_result_id: Identifier,
    pub block_id: Identifier,
    pub chunks: Vec<Chunk>,
    pub service_events: Vec<ServiceEvent>,
}

impl ExecutionResult {
    pub fn id(&self) -> anyhow::Result<Identifier> {
        Identifier::hash_of("execn.executionresult.v1", self)
    }
}
