// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::identifier::Identifier;
use serde::{Deserialize, Serialize};

/// A single transaction. Transaction-level semantics are out of scope; this is
/// an opaque envelope the computation manager interprets.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub script: Vec<u8>,
    pub arguments: Vec<Vec<u8>>,
    pub proposal_key: Identifier,
    pub payer: Identifier,
    pub authorizers: Vec<Identifier>,
}

/// A bag of transactions referenced by a [`CollectionGuarantee`]. May be absent
/// locally and must be fetched from the collection requester.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub transactions: Vec<Transaction>,
}

impl Collection {
    pub fn id(&self) -> anyhow::Result<Identifier> {
        Identifier::hash_of("execn.collection.v1", self)
    }

    pub fn empty() -> Self {
        Collection {
            transactions: vec![],
        }
    }
}

/// A reference to a [`Collection`] by id, with the bit vector of committee
/// members that signed for it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CollectionGuarantee {
    pub collection_id: Identifier,
    pub signer_indices: Vec<u8>,
    pub signer_count: usize,
}
