// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

//! Turns an [`ExecutionResult`] plus the computation manager's state
//! snapshots into a signed [`ExecutionReceipt`]: one SPoCK per chunk, and a
//! staking-key signature over the whole receipt.

use crate::error::ReceiptError;
use crate::traits::StakingSigner;
use execn_types::{ExecutionReceipt, ExecutionResult, StateSnapshot};
use std::sync::Arc;

/// Builds receipts on behalf of this node's staking identity.
#[derive(Clone)]
pub struct ReceiptBuilder {
    signer: Arc<dyn StakingSigner>,
}

impl ReceiptBuilder {
    pub fn new(signer: Arc<dyn StakingSigner>) -> Self {
        ReceiptBuilder { signer }
    }

    /// Builds and signs a receipt for `result`, given the state snapshots the
    /// computation manager produced for the same block. Fails if the chunk
    /// and snapshot counts disagree, which would indicate the caller built
    /// `result` from a different computation than `snapshots`.
    pub fn build(
        &self,
        result: ExecutionResult,
        snapshots: &[StateSnapshot],
    ) -> Result<ExecutionReceipt, ReceiptError> {
        if result.chunks.len() != snapshots.len() {
            return Err(ReceiptError::SnapshotChunkMismatch {
                chunks: result.chunks.len(),
                snapshots: snapshots.len(),
            });
        }

        let spocks = snapshots
            .iter()
            .map(|snapshot| self.signer.spock_prove(&snapshot.spock_secret))
            .collect::<Vec<_>>();

        let executor_id = self.signer.node_id();
        let receipt_id = ExecutionReceipt::receipt_id(&result, executor_id, &spocks)
            .map_err(ReceiptError::HashingFailed)?;
        let executor_signature = self.signer.sign(receipt_id.as_bytes());

        Ok(ExecutionReceipt {
            execution_result: result,
            executor_id,
            spocks,
            executor_signature,
        })
    }
}
