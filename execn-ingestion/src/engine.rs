// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

//! Coordinates the assembler, scheduler, and recovery scanner under one
//! worker pool: accepts inbound blocks and collections, seeds the assembler
//! from the recovery scan at startup, and drives graceful shutdown.

use crate::assembler::Assembler;
use crate::config::IngestionConfig;
use crate::error::IngestionError;
use crate::metrics::IngestionMetrics;
use crate::recovery;
use crate::scheduler::Scheduler;
use crate::traits::{
    CollectionRequester, ComputationManager, ExecutionStateStore, Ledger, ProtocolState,
    StateSyncSource,
};
use execn_notifier::Notifier;
use execn_types::{Block, Collection, Identifier, StateCommitment};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

pub struct Engine<P, L, C, E> {
    protocol: Arc<P>,
    execution_state: Arc<E>,
    ledger: Arc<L>,
    computation: Arc<C>,
    assembler: Assembler,
    scheduler: Arc<Scheduler<L, C, E>>,
    collection_requester: Arc<dyn CollectionRequester>,
    state_sync: Arc<dyn StateSyncSource>,
    config: IngestionConfig,
    metrics: Arc<IngestionMetrics>,
    ready_notifier: Notifier,
    tasks: TaskTracker,
    shutdown: CancellationToken,
    accepting: Arc<AtomicBool>,
}

impl<P, L, C, E> Engine<P, L, C, E>
where
    P: ProtocolState + 'static,
    L: Ledger + Send + Sync + 'static,
    C: ComputationManager + Send + Sync + 'static,
    E: ExecutionStateStore + Send + Sync + 'static,
{
    /// `assembler` must be the exact instance given to `scheduler` at its
    /// construction: the two share the ready queue only because `Assembler`
    /// clones are backed by the same `Arc`s, and this constructor does not
    /// build its own. `ledger` and `computation` must likewise be the same
    /// instances given to `scheduler`, so that a script executed here sees
    /// the same register store and replay engine blocks are executed with.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        protocol: Arc<P>,
        execution_state: Arc<E>,
        ledger: Arc<L>,
        computation: Arc<C>,
        assembler: Assembler,
        scheduler: Arc<Scheduler<L, C, E>>,
        ready_notifier: Notifier,
        collection_requester: Arc<dyn CollectionRequester>,
        state_sync: Arc<dyn StateSyncSource>,
        config: IngestionConfig,
        metrics: Arc<IngestionMetrics>,
    ) -> Arc<Self> {
        Arc::new(Engine {
            protocol,
            execution_state,
            ledger,
            computation,
            assembler,
            scheduler,
            collection_requester,
            state_sync,
            config,
            metrics,
            ready_notifier,
            tasks: TaskTracker::new(),
            shutdown: CancellationToken::new(),
            accepting: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Runs the startup recovery scan, seeds the assembler with everything
    /// unexecuted, then spawns the scheduler's worker loop. Returns once the
    /// scheduler loop is running; it keeps running in the background until
    /// [`Self::shutdown`] is called.
    pub async fn start(self: &Arc<Self>) -> Result<(), IngestionError> {
        self.run_recovery().await?;

        let scheduler = self.scheduler.clone();
        let ready_notifier = self.ready_notifier.clone();
        let tasks = self.tasks.clone();
        let shutdown = self.shutdown.clone();
        self.tasks
            .spawn(async move { scheduler.run(ready_notifier, tasks, shutdown).await });

        Ok(())
    }

    async fn run_recovery(self: &Arc<Self>) -> Result<(), IngestionError> {
        let (finalized_unexecuted, pending_unexecuted) =
            recovery::unexecuted_blocks(self.protocol.as_ref(), self.execution_state.as_ref())?;

        self.maybe_trigger_state_sync(&finalized_unexecuted).await;

        for block_id in finalized_unexecuted.into_iter().chain(pending_unexecuted) {
            if self
                .execution_state
                .state_commitment_by_block_id(block_id)
                .is_some()
            {
                continue;
            }
            let Some(block) = self.protocol.block(block_id) else {
                continue;
            };
            self.admit(block);
        }

        Ok(())
    }

    /// If the node has fallen more than `state_sync_threshold` blocks behind
    /// the sealed tip, consults the state-sync collaborator for each
    /// finalized-unexecuted block (in ascending height order, stopping at
    /// the first it cannot supply) rather than recomputing it locally.
    async fn maybe_trigger_state_sync(self: &Arc<Self>, finalized_unexecuted: &[Identifier]) {
        let Some(sealed_height) = self.protocol.height(self.protocol.sealed_block()) else {
            return;
        };
        let Some(executed_height) = finalized_unexecuted
            .first()
            .and_then(|id| self.protocol.height(*id))
            .map(|h| h.saturating_sub(1))
        else {
            return;
        };

        if sealed_height.saturating_sub(executed_height) < self.config.state_sync_threshold {
            return;
        }

        tracing::info!(
            sealed_height,
            executed_height,
            "sealed/executed gap exceeds state-sync threshold, consulting state sync"
        );

        for &block_id in finalized_unexecuted {
            match self.state_sync.fetch_post_state(block_id).await {
                Ok(Some(post_state)) => {
                    if let Err(error) = self.execution_state.mark_synced(block_id, post_state) {
                        tracing::warn!(%block_id, %error, "failed to record synced state");
                        break;
                    }
                    self.assembler.on_parent_executed(block_id, post_state);
                }
                Ok(None) => break,
                Err(error) => {
                    tracing::warn!(%block_id, %error, "state sync source failed");
                    break;
                }
            }
        }
    }

    fn admit(self: &Arc<Self>, block: Block) {
        let block_id = block.id().expect("block id hashing cannot fail");
        let parent_id = block.parent_id();
        let parent_start_state = self.execution_state.state_commitment_by_block_id(parent_id);
        let guarantees: Vec<Identifier> = block
            .payload
            .collection_guarantees
            .iter()
            .map(|g| g.collection_id)
            .collect();

        if let Err(error) = self.assembler.handle_block(block, parent_start_state) {
            tracing::warn!(%block_id, %error, "failed to admit recovered block");
            return;
        }

        for collection_id in guarantees {
            self.request_collection(collection_id);
        }
    }

    fn request_collection(self: &Arc<Self>, collection_id: Identifier) {
        let requester = self.collection_requester.clone();
        let this = self.clone();
        self.tasks.spawn(async move {
            match requester.request(collection_id).await {
                Ok(collection) => this.on_collection_received(collection_id, collection),
                Err(error) => {
                    tracing::warn!(%collection_id, %error, "collection request failed")
                }
            }
        });
    }

    /// Accepts an inbound block from the network. Rejected once
    /// [`Self::shutdown`] has been called, or if the ready queue is already
    /// at capacity (backpressure: the block is dropped rather than queued
    /// unboundedly, since it remains discoverable via the protocol state and
    /// will be retried by the next recovery scan).
    pub fn handle_block(self: &Arc<Self>, block: Block) -> Result<(), IngestionError> {
        if !self.accepting.load(Ordering::Acquire) {
            let block_id = block.id().unwrap_or(Identifier::ZERO);
            return Err(IngestionError::Dropped(block_id));
        }

        if self.assembler.ready_len() >= self.config.ready_queue_capacity {
            let block_id = block.id().unwrap_or(Identifier::ZERO);
            tracing::warn!(%block_id, "ready queue at capacity, dropping block under backpressure");
            return Err(IngestionError::Dropped(block_id));
        }

        let parent_id = block.parent_id();
        let parent_start_state = self.execution_state.state_commitment_by_block_id(parent_id);
        let guarantees: Vec<Identifier> = block
            .payload
            .collection_guarantees
            .iter()
            .map(|g| g.collection_id)
            .collect();
        self.assembler.handle_block(block, parent_start_state)?;

        for collection_id in guarantees {
            self.request_collection(collection_id);
        }
        Ok(())
    }

    pub fn on_collection_received(&self, collection_id: Identifier, collection: Collection) {
        self.assembler.on_collection_received(collection_id, collection);
    }

    /// Runs a read-only script against the post-state of `block_id`, the way
    /// a client queries account state at a historical block without
    /// submitting a transaction. Opens a ledger view over the block's
    /// already-committed post-state rather than re-executing anything, so
    /// this never blocks on the scheduler and never mutates execution state.
    #[tracing::instrument(skip(self, script, arguments), fields(%block_id))]
    pub async fn execute_script_at_block_id(
        &self,
        block_id: Identifier,
        script: &[u8],
        arguments: &[Vec<u8>],
    ) -> Result<Vec<u8>, IngestionError> {
        let post_state = self
            .execution_state
            .state_commitment_by_block_id(block_id)
            .ok_or(IngestionError::BlockNotExecuted(block_id))?;
        let header = self
            .protocol
            .block(block_id)
            .ok_or(IngestionError::UnknownBlock(block_id))?
            .header;

        // Opening the view pins the register store to this state commitment
        // for the lifetime of the call, even though `execute_script` reaches
        // the registers through the computation manager rather than `view`
        // directly.
        let _view = self.ledger.new_view(post_state);
        let result = self
            .computation
            .execute_script(script, arguments, &header)
            .await?;
        Ok(result)
    }

    /// Resolves once the scheduler's worker pool has drained every in-flight
    /// execute-and-persist operation. After calling this, `handle_block`
    /// always returns [`IngestionError::Dropped`].
    pub async fn shutdown(&self) {
        self.accepting.store(false, Ordering::Release);
        self.shutdown.cancel();
        self.tasks.close();
        self.tasks.wait().await;
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<IngestionMetrics> {
        &self.metrics
    }
}
