// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{execution_result::ExecutionResult, identifier::Identifier};
use serde::{Deserialize, Serialize};

/// A proof-of-confidential-knowledge: a signature over a secret derived from a
/// chunk's state snapshot, opaque beyond its bytes — the signing/verifying
/// algorithm is a black box per this crate's scope.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Spock(pub Vec<u8>);

/// A staking-key signature, opaque beyond its bytes.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Signature(pub Vec<u8>);

/// A signed, chunk-decomposed commitment to a block's execution.
///
/// Invariants: `spocks.len() == execution_result.chunks.len()`;
/// `executor_signature` is the staking-key signature over
/// `hash(execution_result, executor_id, spocks)`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReceipt {
    pub execution_result: ExecutionResult,
    pub executor_id: Identifier,
    pub spocks: Vec<Spock>,
    pub executor_signature: Signature,
}

impl ExecutionReceipt {
    /// The identifier recipients verify the `executor_signature` against.
    pub fn receipt_id(
        result: &ExecutionResult,
        executor_id: Identifier,
        spocks: &[Spock],
    ) -> anyhow::Result<Identifier> {
        #[derive(Serialize)]
        struct Signed<'a> {
            result: &'a ExecutionResult,
            executor_id: Identifier,
            spocks: &'a [Spock],
        }
        Identifier::hash_of(
            "execn.executionreceipt.v1",
            &Signed {
                result,
                executor_id,
                spocks,
            },
        )
    }

    pub fn id(&self) -> anyhow::Result<Identifier> {
        Self::receipt_id(&self.execution_result, self.executor_id, &self.spocks)
    }
}
