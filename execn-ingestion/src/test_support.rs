// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

//! In-memory mock collaborators used by this crate's own tests. Production
//! wiring supplies real implementations of every trait in
//! [`crate::traits`]; these mocks exist so the engine, scheduler, and
//! recovery scanner can be exercised without a real protocol state, ledger,
//! or network.

#![allow(dead_code)]

use crate::traits::{
    ComputationManager, ExecutionStateStore, Ledger, Provider, ProtocolState, StakingSigner,
    StateSyncSource,
};
use async_trait::async_trait;
use execn_types::{
    Block, ComputationResult, EpochPhase, ExecutionReceipt, Identifier, RegisterDelta,
    RegisterProofs, Signature, Spock, StateCommitment,
};
use parking_lot::Mutex;
use std::collections::HashMap;

/// A protocol state backed by an in-memory block arena. `extend` appends a
/// block (its parent must already be present); `finalize`/`seal` move the
/// named pointers forward.
#[derive(Default)]
pub struct MockProtocolState {
    inner: Mutex<MockProtocolStateInner>,
}

#[derive(Default)]
struct MockProtocolStateInner {
    blocks: HashMap<Identifier, Block>,
    children: HashMap<Identifier, Vec<Identifier>>,
    final_block: Identifier,
    sealed_block: Identifier,
    epoch_counter: u64,
    epoch_phase: EpochPhase,
}

impl MockProtocolState {
    pub fn bootstrap(genesis: Block) -> Self {
        let id = genesis.id().unwrap();
        let mut inner = MockProtocolStateInner {
            epoch_phase: EpochPhase::Staking,
            ..Default::default()
        };
        inner.blocks.insert(id, genesis);
        inner.final_block = id;
        inner.sealed_block = id;
        MockProtocolState {
            inner: Mutex::new(inner),
        }
    }

    pub fn extend(&self, block: Block) {
        let id = block.id().unwrap();
        let parent_id = block.parent_id();
        let mut inner = self.inner.lock();
        assert!(
            inner.blocks.contains_key(&parent_id),
            "cannot extend with a block whose parent is unknown"
        );
        inner.children.entry(parent_id).or_default().push(id);
        inner.blocks.insert(id, block);
    }

    pub fn finalize(&self, id: Identifier) {
        self.inner.lock().final_block = id;
    }

    pub fn seal(&self, id: Identifier) {
        self.inner.lock().sealed_block = id;
    }

    pub fn set_epoch(&self, counter: u64, phase: EpochPhase) {
        let mut inner = self.inner.lock();
        inner.epoch_counter = counter;
        inner.epoch_phase = phase;
    }
}

#[async_trait]
impl ProtocolState for MockProtocolState {
    fn block(&self, id: Identifier) -> Option<Block> {
        self.inner.lock().blocks.get(&id).cloned()
    }

    fn parent_id(&self, id: Identifier) -> Option<Identifier> {
        self.block(id).map(|b| b.parent_id())
    }

    fn children(&self, id: Identifier) -> Vec<Identifier> {
        self.inner.lock().children.get(&id).cloned().unwrap_or_default()
    }

    fn final_block(&self) -> Identifier {
        self.inner.lock().final_block
    }

    fn sealed_block(&self) -> Identifier {
        self.inner.lock().sealed_block
    }

    fn height(&self, id: Identifier) -> Option<u64> {
        self.block(id).map(|b| b.height())
    }

    fn epoch_counter(&self) -> u64 {
        self.inner.lock().epoch_counter
    }

    fn epoch_phase(&self) -> EpochPhase {
        self.inner.lock().epoch_phase
    }
}

/// A ledger whose `commit_delta` deterministically hashes the prior state
/// together with the delta, so distinct deltas always yield distinct
/// commitments without needing a real register store.
pub struct MockLedger;

impl Ledger for MockLedger {
    type View = StateCommitment;

    fn new_view(&self, start: StateCommitment) -> Self::View {
        start
    }

    fn commit_delta(
        &self,
        _view: &Self::View,
        delta: &RegisterDelta,
        start: StateCommitment,
    ) -> anyhow::Result<StateCommitment> {
        #[derive(serde::Serialize)]
        struct Seed<'a> {
            start: StateCommitment,
            delta: &'a RegisterDelta,
        }
        Ok(StateCommitment(
            *Identifier::hash_of("execn.test.commitdelta.v1", &Seed { start, delta })?.as_bytes(),
        ))
    }

    fn get_registers_with_proofs(
        &self,
        _view: &Self::View,
        _delta: &RegisterDelta,
    ) -> anyhow::Result<RegisterProofs> {
        Ok(RegisterProofs::default())
    }
}

/// A computation manager with a canned result per block id, so tests can
/// script exactly how many chunks a block produces.
#[derive(Default)]
pub struct ScriptedComputationManager {
    results: Mutex<HashMap<Identifier, ComputationResult>>,
}

impl ScriptedComputationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_result(&self, block_id: Identifier, result: ComputationResult) {
        self.results.lock().insert(block_id, result);
    }
}

#[async_trait]
impl ComputationManager for ScriptedComputationManager {
    async fn compute_block(
        &self,
        executable_block: &execn_types::ExecutableBlock,
    ) -> anyhow::Result<ComputationResult> {
        let block_id = executable_block.block.id()?;
        Ok(self
            .results
            .lock()
            .get(&block_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn execute_script(
        &self,
        script: &[u8],
        _arguments: &[Vec<u8>],
        _header: &execn_types::Header,
    ) -> anyhow::Result<Vec<u8>> {
        Ok(script.to_vec())
    }
}

/// A provider that records every receipt handed to it.
#[derive(Default)]
pub struct RecordingProvider {
    pub broadcast: Mutex<Vec<ExecutionReceipt>>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Provider for RecordingProvider {
    async fn broadcast_receipt(&self, receipt: &ExecutionReceipt) -> anyhow::Result<()> {
        self.broadcast.lock().push(receipt.clone());
        Ok(())
    }
}

/// A staking signer with a fixed node id whose "signature" and "SPoCK" are
/// just tagged copies of the input, so tests can assert on them directly
/// without a real signature scheme.
pub struct StaticSigner {
    node_id: Identifier,
}

impl StaticSigner {
    pub fn new() -> Self {
        StaticSigner {
            node_id: Identifier::random(),
        }
    }
}

impl Default for StaticSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl StakingSigner for StaticSigner {
    fn node_id(&self) -> Identifier {
        self.node_id
    }

    fn sign(&self, message: &[u8]) -> Signature {
        let mut bytes = b"sig:".to_vec();
        bytes.extend_from_slice(message);
        Signature(bytes)
    }

    fn spock_prove(&self, secret: &[u8]) -> Spock {
        let mut bytes = b"spock:".to_vec();
        bytes.extend_from_slice(secret);
        Spock(bytes)
    }
}

/// An in-memory execution state store: `HashMap<block_id, (commitment,
/// result_id)>`, matching the real store's read-through contract closely
/// enough to drive the scheduler and recovery scanner end to end. Also keeps
/// the chunk data packs handed to `persist_execution_state` so tests can
/// assert on them directly.
#[derive(Default)]
pub struct InMemoryExecutionState {
    inner: Mutex<HashMap<Identifier, (StateCommitment, Identifier)>>,
    chunk_data_packs: Mutex<HashMap<Identifier, Vec<execn_types::ChunkDataPack>>>,
}

impl InMemoryExecutionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store as if `block_id` was executed with the zero result id
    /// chained to nothing — used to seed genesis in tests.
    pub fn seed_genesis(&self, block_id: Identifier, post_state: StateCommitment) {
        self.inner
            .lock()
            .insert(block_id, (post_state, Identifier::ZERO));
    }

    pub fn mark_executed(&self, block_id: Identifier, post_state: StateCommitment) {
        self.inner
            .lock()
            .insert(block_id, (post_state, Identifier::random()));
    }

    pub fn chunk_data_packs_for(&self, block_id: Identifier) -> Vec<execn_types::ChunkDataPack> {
        self.chunk_data_packs
            .lock()
            .get(&block_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl ExecutionStateStore for InMemoryExecutionState {
    fn state_commitment_by_block_id(&self, block_id: Identifier) -> Option<StateCommitment> {
        self.inner.lock().get(&block_id).map(|(c, _)| *c)
    }

    fn execution_result_id(&self, block_id: Identifier) -> Option<Identifier> {
        self.inner.lock().get(&block_id).map(|(_, r)| *r)
    }

    fn persist_execution_state(
        &self,
        block_id: Identifier,
        post_state: StateCommitment,
        result_id: Identifier,
        chunk_data_packs: Vec<execn_types::ChunkDataPack>,
        _events: Vec<execn_types::Event>,
        _service_events: Vec<execn_types::ServiceEvent>,
        _transaction_results: Vec<execn_types::TransactionResult>,
        _receipt: ExecutionReceipt,
    ) -> anyhow::Result<()> {
        self.inner.lock().insert(block_id, (post_state, result_id));
        self.chunk_data_packs.lock().insert(block_id, chunk_data_packs);
        Ok(())
    }

    fn mark_synced(&self, block_id: Identifier, post_state: StateCommitment) -> anyhow::Result<()> {
        self.inner
            .lock()
            .insert(block_id, (post_state, Identifier::random()));
        Ok(())
    }
}

/// A state-sync source that never has anything, forcing tests down the
/// local-execution path unless they explicitly seed it.
#[derive(Default)]
pub struct MockStateSyncSource {
    available: Mutex<HashMap<Identifier, StateCommitment>>,
}

impl MockStateSyncSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make_available(&self, block_id: Identifier, post_state: StateCommitment) {
        self.available.lock().insert(block_id, post_state);
    }
}

#[async_trait]
impl StateSyncSource for MockStateSyncSource {
    async fn fetch_post_state(&self, block_id: Identifier) -> anyhow::Result<Option<StateCommitment>> {
        Ok(self.available.lock().get(&block_id).copied())
    }
}
