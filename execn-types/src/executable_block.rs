// Copyright (c) Execution Node Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{block::Block, collection::Collection, identifier::Identifier, state::StateCommitment};
use std::collections::HashMap;

/// A [`Block`] plus the execution-time state needed to run it: the parent's
/// post-state (once known) and every referenced collection (once fetched).
///
/// Invariant: a block is executable exactly when `start_state.is_some()` and
/// every collection guarantee in the payload has a matching entry in
/// `complete_collections`.
#[derive(Clone, Debug)]
pub struct ExecutableBlock {
    pub block: Block,
    pub start_state: Option<StateCommitment>,
    pub complete_collections: HashMap<Identifier, Collection>,
}

impl ExecutableBlock {
    pub fn new(block: Block) -> Self {
        ExecutableBlock {
            block,
            start_state: None,
            complete_collections: HashMap::new(),
        }
    }

    pub fn is_executable(&self) -> bool {
        self.start_state.is_some()
            && self
                .block
                .payload
                .collection_guarantees
                .iter()
                .all(|g| self.complete_collections.contains_key(&g.collection_id))
    }

    pub fn missing_collection_ids(&self) -> Vec<Identifier> {
        self.block
            .payload
            .collection_guarantees
            .iter()
            .map(|g| g.collection_id)
            .filter(|id| !self.complete_collections.contains_key(id))
            .collect()
    }
}
