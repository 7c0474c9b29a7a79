// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

//! Collaborator traits for every component this crate treats as external:
//! the protocol state, the register-store ledger, the computation manager,
//! the provider engine, and the collection requester. Production wiring
//! supplies real implementations; [`crate::test_support`] supplies mocks.

use async_trait::async_trait;
use execn_types::{
    Block, ChunkDataPack, Collection, ComputationResult, EpochPhase, Event, Identifier,
    RegisterProofs, ServiceEvent, StateCommitment, TransactionResult,
};

/// The consensus view of the chain: which blocks exist, which are finalized,
/// which are sealed, and the current committee epoch/phase.
#[async_trait]
pub trait ProtocolState: Send + Sync {
    fn block(&self, id: Identifier) -> Option<Block>;
    fn parent_id(&self, id: Identifier) -> Option<Identifier>;
    /// Direct children of `id` known to the protocol state, in no particular order.
    fn children(&self, id: Identifier) -> Vec<Identifier>;
    fn final_block(&self) -> Identifier;
    fn sealed_block(&self) -> Identifier;
    fn height(&self, id: Identifier) -> Option<u64>;
    fn epoch_counter(&self) -> u64;
    fn epoch_phase(&self) -> EpochPhase;
}

/// The register store / ledger: opens read/write views over a state
/// commitment and commits deltas to produce a new one.
pub trait Ledger: Send + Sync {
    /// Opaque view handle; the caller never inspects it, only threads it
    /// through `commit_delta` and `get_registers_with_proofs`.
    type View: Send;

    fn new_view(&self, start: StateCommitment) -> Self::View;

    fn commit_delta(
        &self,
        view: &Self::View,
        delta: &execn_types::RegisterDelta,
        start: StateCommitment,
    ) -> anyhow::Result<StateCommitment>;

    fn get_registers_with_proofs(
        &self,
        view: &Self::View,
        delta: &execn_types::RegisterDelta,
    ) -> anyhow::Result<RegisterProofs>;
}

/// The deterministic state-machine replay component.
#[async_trait]
pub trait ComputationManager: Send + Sync {
    async fn compute_block(
        &self,
        executable_block: &execn_types::ExecutableBlock,
    ) -> anyhow::Result<ComputationResult>;

    async fn execute_script(
        &self,
        script: &[u8],
        arguments: &[Vec<u8>],
        header: &execn_types::Header,
    ) -> anyhow::Result<Vec<u8>>;
}

/// Broadcasts finished receipts to verification nodes.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn broadcast_receipt(&self, receipt: &execn_types::ExecutionReceipt) -> anyhow::Result<()>;
}

/// Fetches the transaction bundle a [`execn_types::CollectionGuarantee`] refers to.
#[async_trait]
pub trait CollectionRequester: Send + Sync {
    async fn request(&self, collection_id: Identifier) -> anyhow::Result<Collection>;
}

/// Signs with, and exposes the public half of, this node's staking key.
/// Signature and SPoCK algorithms are black boxes per this crate's scope:
/// implementations may wrap any concrete signature scheme.
pub trait StakingSigner: Send + Sync {
    fn node_id(&self) -> Identifier;
    fn sign(&self, message: &[u8]) -> execn_types::Signature;
    fn spock_prove(&self, secret: &[u8]) -> execn_types::Spock;
}

/// Read-through access to the execution state: which blocks have been
/// executed, and under what result id.
pub trait ExecutionStateStore: Send + Sync {
    fn state_commitment_by_block_id(&self, block_id: Identifier) -> Option<StateCommitment>;
    fn execution_result_id(&self, block_id: Identifier) -> Option<Identifier>;

    /// Persists every artifact of a block's execution atomically: once this
    /// returns `Ok`, the block is considered executed by every other method
    /// on this trait. `chunk_data_packs` are aligned with `receipt`'s chunks
    /// and carry the register proofs a verifier needs to replay them.
    #[allow(clippy::too_many_arguments)]
    fn persist_execution_state(
        &self,
        block_id: Identifier,
        post_state: StateCommitment,
        result_id: Identifier,
        chunk_data_packs: Vec<ChunkDataPack>,
        events: Vec<Event>,
        service_events: Vec<ServiceEvent>,
        transaction_results: Vec<TransactionResult>,
        receipt: execn_types::ExecutionReceipt,
    ) -> anyhow::Result<()>;

    /// Records a post-state obtained via state sync rather than local
    /// recomputation. Narrower than [`Self::persist_execution_state`]: no
    /// receipt is produced locally because none was computed locally.
    fn mark_synced(&self, block_id: Identifier, post_state: StateCommitment) -> anyhow::Result<()>;
}

/// Supplies post-state commitments for finalized-but-unexecuted blocks from
/// peers, short-circuiting local recomputation when the node has fallen far
/// enough behind. Consulted only when the sealed/executed height gap exceeds
/// [`crate::config::IngestionConfig::state_sync_threshold`].
#[async_trait]
pub trait StateSyncSource: Send + Sync {
    /// Returns `Some(post_state)` if a peer could supply it, `None` if no
    /// peer had it yet (the caller should fall back to local execution).
    async fn fetch_post_state(&self, block_id: Identifier) -> anyhow::Result<Option<StateCommitment>>;
}
