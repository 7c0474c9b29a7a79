// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{collection::CollectionGuarantee, header::Header, identifier::Identifier};
use serde::{Deserialize, Serialize};

/// A finalized or unfinalized seal attesting that an ancestor's result is
/// agreed upon. Opaque beyond the identifiers it binds.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Seal {
    pub block_id: Identifier,
    pub result_id: Identifier,
}

/// A receipt summary carried inside a block's payload (as opposed to the full
/// [`crate::receipt::ExecutionReceipt`] broadcast out-of-band).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReceiptMeta {
    pub executor_id: Identifier,
    pub result_id: Identifier,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub collection_guarantees: Vec<CollectionGuarantee>,
    pub seals: Vec<Seal>,
    pub receipts: Vec<ExecutionReceiptMeta>,
}

impl Payload {
    pub fn hash(&self) -> anyhow::Result<Identifier> {
        Identifier::hash_of("execn.payload.v1", self)
    }
}

/// A block: a header plus a payload referencing collections, seals and
/// receipt summaries. Height is always one more than the parent's.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub header: Header,
    pub payload: Payload,
}

impl Block {
    pub fn id(&self) -> anyhow::Result<Identifier> {
        self.header.id()
    }

    pub fn parent_id(&self) -> Identifier {
        self.header.parent_id
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn is_genesis(&self) -> bool {
        self.header.is_genesis()
    }

    /// A genesis/bootstrap block with no payload, used to seed a chain in
    /// tests and at first startup.
    pub fn genesis(proposer_id: Identifier) -> anyhow::Result<Self> {
        let payload = Payload::default();
        let header = Header {
            parent_id: Identifier::ZERO,
            view: 0,
            height: 0,
            timestamp: chrono::Utc::now(),
            payload_hash: payload.hash()?,
            proposer_id,
            signatures: vec![],
        };
        Ok(Block { header, payload })
    }

    /// Builds a child of `parent` with the given guarantees, leaving seals and
    /// receipts empty (not needed for execution scheduling).
    pub fn child_of(
        parent: &Block,
        proposer_id: Identifier,
        collection_guarantees: Vec<CollectionGuarantee>,
    ) -> anyhow::Result<Self> {
        let payload = Payload {
            collection_guarantees,
            seals: vec![],
            receipts: vec![],
        };
        let header = Header {
            parent_id: parent.id()?,
            view: parent.header.view + 1,
            height: parent.header.height + 1,
            timestamp: chrono::Utc::now(),
            payload_hash: payload.hash()?,
            proposer_id,
            signatures: vec![],
        };
        Ok(Block { header, payload })
    }
}
