// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

//! 32-byte opaque content identifiers used throughout the ingestion engine.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::fmt;

/// An opaque 32-byte hash identifying a block, collection, chunk, or result.
///
/// Total-ordered by bytes; equality is byte equality. Immutable once minted.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Identifier(pub [u8; 32]);

impl Identifier {
    pub const ZERO: Identifier = Identifier([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Identifier(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hashes an arbitrary BCS-serializable payload, prefixed with a domain
    /// separation tag so identifiers minted for different purposes never collide.
    pub fn hash_of<T: serde::Serialize>(domain: &str, value: &T) -> anyhow::Result<Self> {
        let mut hasher = Sha3_256::new();
        hasher.update(domain.as_bytes());
        hasher.update(bcs::to_bytes(value)?);
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Ok(Identifier(bytes))
    }

    /// Generates a random identifier. Used by test fixtures and mock collaborators.
    pub fn random() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Identifier(bytes)
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
