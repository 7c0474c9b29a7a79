// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

use execn_types::{Identifier, SignerIndicesError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssemblerError {
    #[error("parent {parent_id} of block {block_id} is unknown")]
    ParentUnknown {
        block_id: Identifier,
        parent_id: Identifier,
    },
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("computation manager failed for block {block_id}, retry {attempt}: {source}")]
    Retryable {
        block_id: Identifier,
        attempt: u32,
        #[source]
        source: anyhow::Error,
    },
    #[error("ledger commit failed for block {block_id}: {source}")]
    LedgerCommitFailed {
        block_id: Identifier,
        #[source]
        source: anyhow::Error,
    },
    #[error("persisting execution state for block {block_id} failed: {source}")]
    PersistFailed {
        block_id: Identifier,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("execution result has {chunks} chunks but {snapshots} state snapshots were produced")]
    SnapshotChunkMismatch { chunks: usize, snapshots: usize },
    #[error("hashing receipt id failed: {0}")]
    HashingFailed(#[source] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("block {0} is finalized but missing from the protocol state")]
    MissingFinalizedBlock(Identifier),
}

#[derive(Debug, Error)]
pub enum ContractStoreError {
    #[error("contract {name} at {address} is not authorized for this signer set")]
    Unauthorized { address: String, name: String },
    #[error("gzip decompression failed: {0}")]
    DecompressionFailed(#[source] std::io::Error),
    #[error("gzip compression failed: {0}")]
    CompressionFailed(#[source] std::io::Error),
}

/// The engine's outer error surface: every component error folds into this
/// via `#[from]`, plus a `Dropped` variant for work discarded under
/// backpressure rather than failed outright.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error(transparent)]
    Assembler(#[from] AssemblerError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Receipt(#[from] ReceiptError),
    #[error(transparent)]
    Recovery(#[from] RecoveryError),
    #[error(transparent)]
    ContractStore(#[from] ContractStoreError),
    #[error(transparent)]
    SignerIndices(#[from] SignerIndicesError),
    #[error("block {0} dropped under backpressure; it remains in the protocol state and will be rediscovered at the next recovery scan")]
    Dropped(Identifier),
    #[error("block {0} has not been executed, no post-state commitment is available")]
    BlockNotExecuted(Identifier),
    #[error("block {0} is unknown to the protocol state")]
    UnknownBlock(Identifier),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
