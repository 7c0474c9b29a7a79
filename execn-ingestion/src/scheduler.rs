// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

//! The dispatch core: pulls executable blocks off the assembler's ready
//! queue, runs them through the computation manager and ledger, builds and
//! broadcasts the receipt, and persists the result atomically. Owns a
//! bounded pool of concurrent workers so sibling forks can execute in
//! parallel while a parent strictly precedes its children.

use crate::assembler::Assembler;
use crate::error::SchedulerError;
use crate::metrics::IngestionMetrics;
use crate::receipt::ReceiptBuilder;
use crate::traits::{ComputationManager, ExecutionStateStore, Ledger, Provider};
use execn_notifier::Notifier;
use execn_types::{
    Chunk, ChunkDataPack, ExecutableBlock, ExecutionResult, Identifier, StateCommitment,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Tunables for the computation-manager retry loop; distinct from
/// [`crate::config::IngestionConfig`] so the scheduler can be constructed in
/// tests without pulling in the whole config type.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub base: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            base: Duration::from_secs(1),
            max_attempts: 5,
        }
    }
}

pub struct Scheduler<L, C, E> {
    ledger: Arc<L>,
    computation: Arc<C>,
    execution_state: Arc<E>,
    receipt_builder: ReceiptBuilder,
    provider: Arc<dyn Provider>,
    assembler: Assembler,
    metrics: Arc<IngestionMetrics>,
    retry: RetryPolicy,
    permits: Arc<Semaphore>,
}

impl<L, C, E> Scheduler<L, C, E>
where
    L: Ledger + Send + Sync + 'static,
    C: ComputationManager + Send + Sync + 'static,
    E: ExecutionStateStore + Send + Sync + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ledger: Arc<L>,
        computation: Arc<C>,
        execution_state: Arc<E>,
        receipt_builder: ReceiptBuilder,
        provider: Arc<dyn Provider>,
        assembler: Assembler,
        metrics: Arc<IngestionMetrics>,
        worker_pool_size: usize,
        retry: RetryPolicy,
    ) -> Arc<Self> {
        Arc::new(Scheduler {
            ledger,
            computation,
            execution_state,
            receipt_builder,
            provider,
            assembler,
            metrics,
            retry,
            permits: Arc::new(Semaphore::new(worker_pool_size.max(1))),
        })
    }

    /// Drives the scheduler until `shutdown` is cancelled. Every dispatched
    /// block is tracked by `tasks`, so the caller can await `tasks.wait()`
    /// after closing it to know every in-flight execute-and-persist has
    /// finished or been cancelled.
    pub async fn run(
        self: Arc<Self>,
        ready_notifier: Notifier,
        tasks: TaskTracker,
        shutdown: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = ready_notifier.notified() => {}
            }

            let drained = self.assembler.drain_ready();
            self.metrics
                .scheduler_ready_queue_depth
                .set(self.assembler.ready_len() as i64);
            for executable in drained {
                let this = self.clone();
                let shutdown = shutdown.clone();
                tasks.spawn(async move {
                    tokio::select! {
                        _ = shutdown.cancelled() => {}
                        _ = this.dispatch(executable) => {}
                    }
                });
            }
        }
    }

    /// Acquires a worker permit and executes one block, end to end.
    async fn dispatch(self: Arc<Self>, executable: ExecutableBlock) {
        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore is never closed");

        let block_id = match executable.block.id() {
            Ok(id) => id,
            Err(error) => {
                tracing::error!(%error, "failed to hash block id before execution");
                return;
            }
        };

        if let Some(existing) = self.execution_state.state_commitment_by_block_id(block_id) {
            tracing::debug!(block_id = %block_id, "block already executed, skipping recomputation");
            self.assembler.on_parent_executed(block_id, existing);
            return;
        }

        match self.execute(executable).await {
            Ok(post_state) => {
                self.metrics.blocks_executed_total.inc();
                self.assembler.on_parent_executed(block_id, post_state);
            }
            Err(error) => {
                tracing::error!(block_id = %block_id, %error, "block execution failed, will not be marked executed");
            }
        }
    }

    #[tracing::instrument(skip_all, fields(block_id = %executable.block.id().unwrap_or(Identifier::ZERO), height = executable.block.height()))]
    async fn execute(&self, executable: ExecutableBlock) -> Result<StateCommitment, SchedulerError> {
        let block_id = executable.block.id().expect("block id hashing cannot fail");
        let parent_id = executable.block.parent_id();
        let start_state = executable
            .start_state
            .expect("scheduler only dispatches blocks the assembler marked executable");

        let computation_result = self.compute_with_retry(block_id, &executable).await?;

        let view = self.ledger.new_view(start_state);
        let mut post_state = start_state;
        let mut chunks = Vec::with_capacity(computation_result.state_snapshots.len());
        let mut chunk_data_packs = Vec::with_capacity(computation_result.state_snapshots.len());

        for (index, snapshot) in computation_result.state_snapshots.iter().enumerate() {
            post_state = self
                .ledger
                .commit_delta(&view, &snapshot.delta, start_state)
                .map_err(|source| SchedulerError::LedgerCommitFailed { block_id, source })?;

            let collection_id = executable
                .block
                .payload
                .collection_guarantees
                .get(index)
                .map(|g| g.collection_id)
                .unwrap_or(Identifier::ZERO);
            let number_of_transactions = executable
                .complete_collections
                .get(&collection_id)
                .map(|c| c.transactions.len())
                .unwrap_or(0);
            let event_collection = Identifier::hash_of("execn.eventcollection.v1", &snapshot.events)
                .map_err(|source| SchedulerError::LedgerCommitFailed { block_id, source })?;

            let chunk = Chunk {
                block_id,
                collection_index: index,
                index,
                start_state,
                event_collection,
                total_computation_used: computation_result
                    .transaction_results
                    .iter()
                    .map(|r| r.computation_used)
                    .sum::<u64>()
                    / computation_result.state_snapshots.len().max(1) as u64,
                number_of_transactions,
            };
            let chunk_id = chunk
                .id()
                .map_err(|source| SchedulerError::LedgerCommitFailed { block_id, source })?;

            let proofs = self
                .ledger
                .get_registers_with_proofs(&view, &snapshot.delta)
                .map_err(|source| SchedulerError::LedgerCommitFailed { block_id, source })?;

            chunks.push(chunk);
            chunk_data_packs.push(ChunkDataPack {
                chunk_id,
                start_state,
                proofs,
                collection_id,
            });
        }

        let previous_result_id = self
            .execution_state
            .execution_result_id(parent_id)
            .unwrap_or(Identifier::ZERO);

        let service_events = computation_result.service_events.clone();
        let events: Vec<execn_types::Event> = computation_result
            .state_snapshots
            .iter()
            .flat_map(|snapshot| snapshot.events.clone())
            .collect();
        let result = ExecutionResult {
            previous_result_id,
            block_id,
            chunks,
            service_events: service_events.clone(),
        };

        let receipt = self
            .receipt_builder
            .build(result, &computation_result.state_snapshots)
            .map_err(|e| SchedulerError::PersistFailed {
                block_id,
                source: e.into(),
            })?;

        let result_id = receipt
            .execution_result
            .id()
            .map_err(|source| SchedulerError::PersistFailed { block_id, source })?;

        self.execution_state
            .persist_execution_state(
                block_id,
                post_state,
                result_id,
                chunk_data_packs,
                events,
                service_events,
                computation_result.transaction_results.clone(),
                receipt.clone(),
            )
            .map_err(|source| SchedulerError::PersistFailed { block_id, source })?;

        if let Err(error) = self.provider.broadcast_receipt(&receipt).await {
            tracing::warn!(block_id = %block_id, %error, "receipt broadcast failed; block remains executed locally");
        }

        Ok(post_state)
    }

    async fn compute_with_retry(
        &self,
        block_id: Identifier,
        executable: &ExecutableBlock,
    ) -> Result<execn_types::ComputationResult, SchedulerError> {
        let attempts = AtomicU32::new(0);
        loop {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            match self.computation.compute_block(executable).await {
                Ok(result) => return Ok(result),
                Err(source) if attempt < self.retry.max_attempts => {
                    let backoff = self.retry.base * 2u32.pow(attempt.saturating_sub(1));
                    tracing::warn!(
                        block_id = %block_id,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        %source,
                        "computation manager call failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(source) => {
                    return Err(SchedulerError::Retryable {
                        block_id,
                        attempt,
                        source,
                    })
                }
            }
        }
    }
}
