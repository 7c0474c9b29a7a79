// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque 32-byte commitment to the register store at a point in time.
/// Immutable once produced; never mutated in place.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct StateCommitment(pub [u8; 32]);

impl StateCommitment {
    pub fn dummy() -> Self {
        StateCommitment([0u8; 32])
    }
}

impl fmt::Debug for StateCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// A single register delta produced by executing one chunk's worth of
/// transactions. Opaque beyond size, since the ledger owns its interpretation.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RegisterDelta {
    pub writes: Vec<(Vec<u8>, Vec<u8>)>,
}

/// Register proofs accompanying a chunk data pack, opaque to this crate.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RegisterProofs {
    pub encoded: Vec<u8>,
}
