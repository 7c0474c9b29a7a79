// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::identifier::Identifier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A block header. `Header::id` is the identifier minted by hashing the header.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub parent_id: Identifier,
    pub view: u64,
    pub height: u64,
    pub timestamp: DateTime<Utc>,
    pub payload_hash: Identifier,
    pub proposer_id: Identifier,
    pub signatures: Vec<u8>,
}

impl Header {
    pub fn id(&self) -> anyhow::Result<Identifier> {
        Identifier::hash_of("execn.header.v1", self)
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0 && self.parent_id == Identifier::ZERO
    }
}
