// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

//! A small draft/commit/rollback store for gzip-compressed contract code,
//! standing in for the ledger's contract-code column family. Mirrors the
//! scheduler's "accumulate then flush atomically" discipline at a much
//! smaller scale: writes accumulate in an in-memory draft and only become
//! visible to readers once [`ContractStore::commit`] is called.

use crate::error::ContractStoreError;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{Read, Write};

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ContractKey {
    pub address: String,
    pub name: String,
}

enum Draft {
    Update(Vec<u8>),
    Remove,
}

/// Authorizes a mutation against the set of signers that proposed it. The
/// ledger's real authorization rule (is this address among the signers, or
/// does it have a contract-update capability) is out of scope here; callers
/// supply a predicate.
pub trait Authorizer: Send + Sync {
    fn is_authorized(&self, address: &str, signers: &[String]) -> bool;
}

/// Authorizes a mutation only when the contract's own address signed it.
pub struct SelfAuthorizer;

impl Authorizer for SelfAuthorizer {
    fn is_authorized(&self, address: &str, signers: &[String]) -> bool {
        signers.iter().any(|s| s == address)
    }
}

pub struct ContractStore<A: Authorizer = SelfAuthorizer> {
    committed: Mutex<HashMap<ContractKey, Vec<u8>>>,
    draft: Mutex<HashMap<ContractKey, Draft>>,
    authorizer: A,
}

impl<A: Authorizer> ContractStore<A> {
    pub fn new(authorizer: A) -> Self {
        ContractStore {
            committed: Mutex::new(HashMap::new()),
            draft: Mutex::new(HashMap::new()),
            authorizer,
        }
    }

    /// Reads committed (not draft) code, gzip-decoded. Empty code is stored
    /// and returned as empty bytes with no gzip header at all.
    pub fn get(&self, address: &str, name: &str) -> Result<Vec<u8>, ContractStoreError> {
        let key = ContractKey {
            address: address.to_string(),
            name: name.to_string(),
        };
        match self.committed.lock().get(&key) {
            Some(compressed) => decode_gzip(compressed),
            None => Ok(Vec::new()),
        }
    }

    pub fn set(
        &self,
        address: &str,
        name: &str,
        code: &[u8],
        signers: &[String],
    ) -> Result<(), ContractStoreError> {
        if !self.authorizer.is_authorized(address, signers) {
            return Err(ContractStoreError::Unauthorized {
                address: address.to_string(),
                name: name.to_string(),
            });
        }
        let key = ContractKey {
            address: address.to_string(),
            name: name.to_string(),
        };
        let compressed = encode_to_gzip(code)?;
        self.draft.lock().insert(key, Draft::Update(compressed));
        Ok(())
    }

    pub fn remove(
        &self,
        address: &str,
        name: &str,
        signers: &[String],
    ) -> Result<(), ContractStoreError> {
        if !self.authorizer.is_authorized(address, signers) {
            return Err(ContractStoreError::Unauthorized {
                address: address.to_string(),
                name: name.to_string(),
            });
        }
        let key = ContractKey {
            address: address.to_string(),
            name: name.to_string(),
        };
        self.draft.lock().insert(key, Draft::Remove);
        Ok(())
    }

    /// Atomically applies every staged update/removal to the committed
    /// store and clears the draft. Returns the keys touched.
    pub fn commit(&self) -> Vec<ContractKey> {
        let drained: Vec<(ContractKey, Draft)> = self.draft.lock().drain().collect();
        let mut committed = self.committed.lock();
        let mut touched = Vec::with_capacity(drained.len());
        for (key, draft) in drained {
            match draft {
                Draft::Update(bytes) => {
                    committed.insert(key.clone(), bytes);
                }
                Draft::Remove => {
                    committed.remove(&key);
                }
            }
            touched.push(key);
        }
        touched
    }

    pub fn rollback(&self) {
        self.draft.lock().clear();
    }
}

fn encode_to_gzip(bytes: &[u8]) -> Result<Vec<u8>, ContractStoreError> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .map_err(ContractStoreError::CompressionFailed)?;
    encoder.finish().map_err(ContractStoreError::CompressionFailed)
}

fn decode_gzip(bytes: &[u8]) -> Result<Vec<u8>, ContractStoreError> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(ContractStoreError::DecompressionFailed)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn store() -> ContractStore<SelfAuthorizer> {
        ContractStore::new(SelfAuthorizer)
    }

    #[test]
    fn empty_code_round_trips_as_empty() {
        let s = store();
        s.set("0xA", "Foo", &[], &["0xA".to_string()]).unwrap();
        s.commit();
        assert_eq!(s.get("0xA", "Foo").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn draft_is_invisible_until_commit() {
        let s = store();
        s.set("0xA", "Foo", b"code v1", &["0xA".to_string()]).unwrap();
        assert_eq!(s.get("0xA", "Foo").unwrap(), Vec::<u8>::new());
        s.commit();
        assert_eq!(s.get("0xA", "Foo").unwrap(), b"code v1");
    }

    #[test]
    fn rollback_discards_draft() {
        let s = store();
        s.set("0xA", "Foo", b"code v1", &["0xA".to_string()]).unwrap();
        s.rollback();
        s.commit();
        assert_eq!(s.get("0xA", "Foo").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn remove_after_commit_clears_code() {
        let s = store();
        s.set("0xA", "Foo", b"code v1", &["0xA".to_string()]).unwrap();
        s.commit();
        s.remove("0xA", "Foo", &["0xA".to_string()]).unwrap();
        s.commit();
        assert_eq!(s.get("0xA", "Foo").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn unauthorized_mutation_is_rejected() {
        let s = store();
        let err = s
            .set("0xA", "Foo", b"code", &["0xB".to_string()])
            .unwrap_err();
        assert!(matches!(err, ContractStoreError::Unauthorized { .. }));
    }

    proptest! {
        #[test]
        fn gzip_round_trips_for_any_bytes(bytes in proptest::collection::vec(any::<u8>(), 0..4096)) {
            let compressed = encode_to_gzip(&bytes).unwrap();
            let decoded = decode_gzip(&compressed).unwrap();
            prop_assert_eq!(decoded, bytes);
        }
    }
}
