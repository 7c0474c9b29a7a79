// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core data model shared by the ingestion engine, notifier, and TTL-cache
//! crates: identifiers, headers, blocks, collections, execution results and
//! receipts, and the signer-index bit-vector codec.

pub mod block;
pub mod collection;
pub mod epoch;
pub mod executable_block;
pub mod execution_result;
pub mod header;
pub mod identifier;
pub mod receipt;
pub mod signer_indices;
pub mod state;

pub use block::{Block, ExecutionReceiptMeta, Payload, Seal};
pub use collection::{Collection, CollectionGuarantee, Transaction};
pub use epoch::{EncodableSnapshot, EpochInfo, EpochPhase, EpochWindow, Identity};
pub use executable_block::ExecutableBlock;
pub use execution_result::{
    Chunk, ChunkDataPack, ComputationResult, Event, ExecutionResult, ServiceEvent, StateSnapshot,
    TransactionResult,
};
pub use header::Header;
pub use identifier::Identifier;
pub use receipt::{ExecutionReceipt, Signature, Spock};
pub use signer_indices::{decode_signer_indices, encode_signer_indices, SignerIndicesError};
pub use state::{RegisterDelta, RegisterProofs, StateCommitment};
